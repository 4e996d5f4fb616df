//! Host-platform view: courses, modules, products and the commerce feed.
//!
//! The course platform and the store own these entities. This crate models
//! only what the entitlement core reads from them, plus the collaborator
//! ports it queries. Nothing here decides access.

pub mod commerce;
pub mod course;
pub mod in_memory;
pub mod ports;
pub mod product;

pub use commerce::{CommerceEvent, LineItem, OrderCompleted, PurchaseRecord, SubscriptionActivated};
pub use course::{Course, Module};
pub use in_memory::InMemoryHost;
pub use ports::{Commerce, CourseAccessOracle, ModuleTree};
pub use product::{PricingMetadata, Product};
