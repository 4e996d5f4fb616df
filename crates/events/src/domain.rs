//! Entitlement domain events emitted for other collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursegate_core::{ModuleId, OrderId, SubscriptionId, UserId};

use crate::Event;

/// What caused a module grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum GrantSource {
    Order(OrderId),
    Subscription(SubscriptionId),
}

/// Event: a user newly gained access to a module through a purchase.
///
/// Emitted once per (user, module) pair, on the transition from not granted
/// to granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePurchaseComplete {
    pub user_id: UserId,
    pub module_id: ModuleId,
    pub source: GrantSource,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntitlementEvent {
    ModulePurchaseComplete(ModulePurchaseComplete),
}

impl Event for EntitlementEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EntitlementEvent::ModulePurchaseComplete(_) => "entitlements.module.purchase_complete",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EntitlementEvent::ModulePurchaseComplete(e) => e.occurred_at,
        }
    }
}
