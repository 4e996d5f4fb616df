use std::sync::Arc;

use anyhow::Context;

use coursegate_infra::{AppConfig, EntitlementRuntime};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    coursegate_observability::init_with(config.log_format);

    let runtime = Arc::new(EntitlementRuntime::in_memory(&config));
    runtime.start().context("failed to start grant worker")?;

    let app = coursegate_api::app::build_app(runtime.clone(), &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        access_source = config.access_source.as_str(),
        dev_routes = config.dev_routes,
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    runtime.shutdown();
    Ok(())
}
