//! `coursegate-entitlements`: who may see which module, as recorded data.
//!
//! - [`EntitlementStore`]: module↔product links and per-user granted modules
//! - [`EntitlementGrantor`]: turns completed purchases into grants

pub mod grantor;
pub mod in_memory;
pub mod store;

pub use grantor::EntitlementGrantor;
pub use in_memory::InMemoryEntitlementStore;
pub use store::{EntitlementStore, ModuleProductLink};
