//! Infrastructure layer: configuration, process wiring, background workers.

pub mod config;
pub mod runtime;
pub mod workers;


pub use config::AppConfig;
pub use runtime::{CommerceBus, EntitlementBus, EntitlementRuntime};
