//! Event mechanics and the entitlement domain events.

pub mod bus;
pub mod domain;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use domain::{EntitlementEvent, GrantSource, ModulePurchaseComplete};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
