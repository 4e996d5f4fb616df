//! Configuration loading and representation.
//!
//! Everything comes from environment variables, read once at start.
//! Unparseable values fall back to the default with a warning.

use std::net::SocketAddr;

use tracing::warn;

use coursegate_access::AccessSource;
use coursegate_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `ACCESS_SOURCE`: which ownership fact the view check consults.
    pub access_source: AccessSource,
    /// `LOG_FORMAT`
    pub log_format: LogFormat,
    /// `SERVICE_TOKEN`: shared secret trusted callers (store webhooks, the
    /// host's admin screens) send in `x-service-token`. Unset means no caller
    /// is trusted.
    pub service_token: Option<String>,
    /// `DEV_ROUTES`: mount the `/host` seeding routes.
    pub dev_routes: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            access_source: AccessSource::default(),
            log_format: LogFormat::default(),
            service_token: None,
            dev_routes: false,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = parse_or("BIND_ADDR", lookup("BIND_ADDR"), defaults.bind_addr, |s| {
            s.parse::<SocketAddr>().map_err(|e| e.to_string())
        });
        let access_source = parse_or(
            "ACCESS_SOURCE",
            lookup("ACCESS_SOURCE"),
            defaults.access_source,
            |s| s.parse::<AccessSource>().map_err(|e| e.to_string()),
        );
        let log_format = parse_or("LOG_FORMAT", lookup("LOG_FORMAT"), defaults.log_format, |s| {
            s.parse::<LogFormat>()
        });

        let service_token = lookup("SERVICE_TOKEN")
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let dev_routes = parse_or("DEV_ROUTES", lookup("DEV_ROUTES"), defaults.dev_routes, parse_flag);

        Self {
            bind_addr,
            access_source,
            log_format,
            service_token,
            dev_routes,
        }
    }
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got {other:?}")),
    }
}

fn parse_or<T, P>(key: &str, raw: Option<String>, default: T, parse: P) -> T
where
    T: core::fmt::Debug,
    P: Fn(&str) -> Result<T, String>,
{
    match raw {
        None => default,
        Some(raw) if raw.trim().is_empty() => default,
        Some(raw) => match parse(raw.trim()) {
            Ok(v) => v,
            Err(error) => {
                warn!(key, value = %raw, %error, fallback = ?default, "invalid configuration value");
                default
            }
        },
    }
}
