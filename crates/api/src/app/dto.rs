use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use coursegate_access::{AccessExplanation, PurchaseDenial, PurchaseVerdict};
use coursegate_catalog::{LineItem, OrderCompleted, PricingMetadata, SubscriptionActivated};
use coursegate_core::{CourseId, ModuleId, OrderId, ProductId, SubscriptionId, UserId};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub course_id: Option<CourseId>,
    #[serde(default)]
    pub prior: bool,
}

#[derive(Debug, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// `null`, a missing field or `0` all mean "unlink".
#[derive(Debug, Deserialize)]
pub struct SetModuleProductRequest {
    #[serde(default)]
    pub product_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SetProductModuleRequest {
    #[serde(default)]
    pub module_id: Option<u64>,
}

pub fn link_target<T: From<u64>>(raw: Option<u64>) -> Option<T> {
    raw.filter(|v| *v != 0).map(T::from)
}

#[derive(Debug, Deserialize)]
pub struct ValidatePurchaseRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Deserialize)]
pub struct OrderCompletedRequest {
    pub order_id: OrderId,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl OrderCompletedRequest {
    pub fn into_event(self) -> OrderCompleted {
        OrderCompleted {
            order_id: self.order_id,
            user_id: self.user_id,
            items: self.items,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionActivatedRequest {
    pub subscription_id: SubscriptionId,
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl SubscriptionActivatedRequest {
    pub fn into_event(self) -> SubscriptionActivated {
        SubscriptionActivated {
            subscription_id: self.subscription_id,
            user_id: self.user_id,
            items: self.items,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertCourseRequest {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct UpsertModuleRequest {
    pub name: String,
    pub course_id: Option<CourseId>,
}

#[derive(Debug, Deserialize)]
pub struct UpsertProductRequest {
    pub name: String,
    pub permalink: String,
    #[serde(default)]
    pub pricing: PricingMetadata,
}

#[derive(Debug, Deserialize)]
pub struct RecordPurchaseRequest {
    pub user_id: UserId,
    pub product_id: ProductId,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct AccessResponse {
    pub allowed: bool,
    pub explanation: AccessExplanation,
}

#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ModuleProductResponse {
    pub module_id: ModuleId,
    pub product_id: Option<ProductId>,
}

#[derive(Debug, Serialize)]
pub struct ProductModuleResponse {
    pub product_id: ProductId,
    pub module_id: Option<ModuleId>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseVerdictResponse {
    pub product_id: ProductId,
    /// `"admit"` or `"deny"`.
    pub verdict: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<PurchaseDenial>,
}

impl PurchaseVerdictResponse {
    pub fn from_verdict(product_id: ProductId, verdict: PurchaseVerdict) -> Self {
        let reason = verdict.reason();
        match verdict {
            PurchaseVerdict::Admit => Self {
                product_id,
                verdict: "admit",
                reason,
                denial: None,
            },
            PurchaseVerdict::Deny(denial) => Self {
                product_id,
                verdict: "deny",
                reason,
                denial: Some(denial),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserModulesResponse {
    pub user_id: UserId,
    pub modules: Vec<ModuleId>,
}
