//! Grants module access when a purchase completes.

use chrono::Utc;
use tracing::{debug, info};

use coursegate_catalog::{CommerceEvent, OrderCompleted, PurchaseRecord, SubscriptionActivated};
use coursegate_core::{DomainError, DomainResult, ModuleId};
use coursegate_events::{EntitlementEvent, EventBus, EventEnvelope, ModulePurchaseComplete};

use crate::EntitlementStore;

/// Reacts to order-completed and subscription-activated events.
///
/// For every line item whose product is linked to a module, the module is
/// added to the buyer's granted set and a `ModulePurchaseComplete` event is
/// published. The grant is marked announced only after the publish succeeds:
/// replaying an order whose events all went out writes nothing and publishes
/// nothing, while replaying one whose publish failed announces the
/// outstanding grants.
///
/// Missing buyers (guest checkout) and empty orders yield zero grants.
pub struct EntitlementGrantor<S, B> {
    store: S,
    bus: B,
}

impl<S, B> EntitlementGrantor<S, B>
where
    S: EntitlementStore,
    B: EventBus<EventEnvelope<EntitlementEvent>>,
{
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn on_order_completed(&self, order: &OrderCompleted) -> DomainResult<Vec<ModuleId>> {
        self.process(order)
    }

    pub fn on_subscription_activated(&self, subscription: &SubscriptionActivated) -> DomainResult<Vec<ModuleId>> {
        self.process(subscription)
    }

    pub fn handle(&self, event: &CommerceEvent) -> DomainResult<Vec<ModuleId>> {
        self.process(event)
    }

    /// Process one purchase record. Returns the modules announced by this call.
    pub fn process<R>(&self, record: &R) -> DomainResult<Vec<ModuleId>>
    where
        R: PurchaseRecord + ?Sized,
    {
        let source = record.source();
        let Some(user_id) = record.user_id() else {
            debug!(?source, "purchase has no user; nothing to grant");
            return Ok(Vec::new());
        };

        let mut announced = Vec::new();
        for item in record.line_items() {
            let Some(module_id) = self.store.get_product_module(item.product_id)? else {
                continue;
            };

            let added = self.store.add_user_granted_module(user_id, module_id)?;
            if !self.store.grant_needs_announcement(user_id, module_id)? {
                debug!(%user_id, %module_id, ?source, "module already granted");
                continue;
            }

            if added {
                info!(%user_id, %module_id, product_id = %item.product_id, ?source, "module access granted");
            } else {
                info!(%user_id, %module_id, ?source, "announcing earlier grant");
            }

            let event = EntitlementEvent::ModulePurchaseComplete(ModulePurchaseComplete {
                user_id,
                module_id,
                source,
                occurred_at: Utc::now(),
            });
            self.bus
                .publish(EventEnvelope::wrap(event))
                .map_err(|e| DomainError::publish(format!("{e:?}")))?;
            self.store.mark_grant_announced(user_id, module_id)?;

            announced.push(module_id);
        }

        Ok(announced)
    }
}
