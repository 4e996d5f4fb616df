//! Inbound commerce lifecycle events.
//!
//! The store publishes these when checkout finishes. Both kinds expose the
//! buyer and the purchased products through [`PurchaseRecord`], which is all
//! the grantor needs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursegate_core::{OrderId, ProductId, SubscriptionId, UserId};
use coursegate_events::{Event, GrantSource};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

impl LineItem {
    pub fn new(product_id: ProductId) -> Self {
        Self {
            product_id,
            quantity: 1,
        }
    }
}

/// Event: an order reached the completed status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCompleted {
    pub order_id: OrderId,
    /// Guest checkouts carry no user.
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a subscription became active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionActivated {
    pub subscription_id: SubscriptionId,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommerceEvent {
    OrderCompleted(OrderCompleted),
    SubscriptionActivated(SubscriptionActivated),
}

/// Anything that records a buyer and the products they paid for.
pub trait PurchaseRecord {
    fn user_id(&self) -> Option<UserId>;

    fn line_items(&self) -> &[LineItem];

    fn source(&self) -> GrantSource;
}

impl PurchaseRecord for OrderCompleted {
    fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    fn line_items(&self) -> &[LineItem] {
        &self.items
    }

    fn source(&self) -> GrantSource {
        GrantSource::Order(self.order_id)
    }
}

impl PurchaseRecord for SubscriptionActivated {
    fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    fn line_items(&self) -> &[LineItem] {
        &self.items
    }

    fn source(&self) -> GrantSource {
        GrantSource::Subscription(self.subscription_id)
    }
}

impl PurchaseRecord for CommerceEvent {
    fn user_id(&self) -> Option<UserId> {
        match self {
            CommerceEvent::OrderCompleted(e) => e.user_id(),
            CommerceEvent::SubscriptionActivated(e) => e.user_id(),
        }
    }

    fn line_items(&self) -> &[LineItem] {
        match self {
            CommerceEvent::OrderCompleted(e) => e.line_items(),
            CommerceEvent::SubscriptionActivated(e) => e.line_items(),
        }
    }

    fn source(&self) -> GrantSource {
        match self {
            CommerceEvent::OrderCompleted(e) => e.source(),
            CommerceEvent::SubscriptionActivated(e) => e.source(),
        }
    }
}

impl Event for CommerceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CommerceEvent::OrderCompleted(_) => "commerce.order.completed",
            CommerceEvent::SubscriptionActivated(_) => "commerce.subscription.activated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CommerceEvent::OrderCompleted(e) => e.occurred_at,
            CommerceEvent::SubscriptionActivated(e) => e.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_payload_decodes_with_defaults() {
        let event: CommerceEvent = serde_json::from_value(serde_json::json!({
            "type": "order_completed",
            "order_id": 100,
            "user_id": 5,
            "items": [{ "product_id": 42 }],
            "occurred_at": "2024-05-01T10:00:00Z",
        }))
        .unwrap();

        assert_eq!(event.user_id(), Some(UserId::new(5)));
        assert_eq!(event.line_items(), &[LineItem::new(ProductId::new(42))]);
        assert_eq!(event.source(), GrantSource::Order(OrderId::new(100)));
        assert_eq!(event.event_type(), "commerce.order.completed");
    }

    #[test]
    fn guest_subscription_has_no_user() {
        let event: CommerceEvent = serde_json::from_value(serde_json::json!({
            "type": "subscription_activated",
            "subscription_id": 8,
            "user_id": null,
            "occurred_at": "2024-05-01T10:00:00Z",
        }))
        .unwrap();

        assert_eq!(event.user_id(), None);
        assert!(event.line_items().is_empty());
        assert_eq!(event.source(), GrantSource::Subscription(SubscriptionId::new(8)));
    }
}
