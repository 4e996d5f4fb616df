//! Process wiring: every component built once, explicitly, at start.

use std::sync::{Arc, Mutex};

use tracing::info;

use coursegate_access::{AccessEvaluator, Platform, PurchaseValidator};
use coursegate_catalog::{CommerceEvent, InMemoryHost};
use coursegate_entitlements::{EntitlementGrantor, InMemoryEntitlementStore};
use coursegate_events::{EntitlementEvent, EventEnvelope, InMemoryEventBus};

use crate::AppConfig;
use crate::workers::{GrantWorker, WorkerHandle};

/// Inbound commerce lifecycle events.
pub type CommerceBus = Arc<InMemoryEventBus<CommerceEvent>>;

/// Outbound `module_purchase_complete` notifications.
pub type EntitlementBus = Arc<InMemoryEventBus<EventEnvelope<EntitlementEvent>>>;

pub type Grantor = EntitlementGrantor<Arc<InMemoryEntitlementStore>, EntitlementBus>;

/// All components of a running process, backed by in-memory adapters.
pub struct EntitlementRuntime {
    pub host: Arc<InMemoryHost>,
    pub store: Arc<InMemoryEntitlementStore>,
    pub evaluator: Arc<AccessEvaluator>,
    pub validator: PurchaseValidator,
    pub grantor: Arc<Grantor>,
    pub commerce_bus: CommerceBus,
    pub entitlement_bus: EntitlementBus,
    worker: Mutex<Option<WorkerHandle>>,
}

impl EntitlementRuntime {
    /// Build every component. Nothing runs until [`Self::start`].
    pub fn in_memory(config: &AppConfig) -> Self {
        let host = Arc::new(InMemoryHost::new());
        let store = Arc::new(InMemoryEntitlementStore::new());

        let platform = Platform {
            store: store.clone(),
            oracle: host.clone(),
            commerce: host.clone(),
            tree: host.clone(),
        };
        let evaluator = Arc::new(AccessEvaluator::new(platform, config.access_source));
        let validator = PurchaseValidator::new(evaluator.clone());

        let commerce_bus: CommerceBus = Arc::new(InMemoryEventBus::new());
        let entitlement_bus: EntitlementBus = Arc::new(InMemoryEventBus::new());
        let grantor = Arc::new(EntitlementGrantor::new(store.clone(), entitlement_bus.clone()));

        Self {
            host,
            store,
            evaluator,
            validator,
            grantor,
            commerce_bus,
            entitlement_bus,
            worker: Mutex::new(None),
        }
    }

    /// Subscribe the grantor to the commerce bus. Idempotent.
    pub fn start(&self) -> std::io::Result<()> {
        let mut slot = self.worker.lock().map_err(|_| std::io::Error::other("worker slot poisoned"))?;
        if slot.is_some() {
            return Ok(());
        }

        let grantor = self.grantor.clone();
        let handle = GrantWorker::spawn("entitlement-grantor", &self.commerce_bus, move |event: &CommerceEvent| {
            grantor.handle(event).map(|_| ())
        })?;
        info!(worker = handle.name(), "grant worker subscribed to commerce events");
        *slot = Some(handle);
        Ok(())
    }

    /// Stop the grant worker, waiting for the in-flight event to finish.
    pub fn shutdown(&self) {
        let handle = self.worker.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            handle.shutdown();
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

impl Drop for EntitlementRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
