use serde::{Deserialize, Serialize};

use coursegate_core::ProductId;

/// Display-only pricing metadata, owned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingMetadata {
    pub base_price: Option<u64>, // Price in smallest currency unit (e.g., cents)
    pub currency: Option<String>, // ISO currency code (e.g., "USD", "EUR")
}

impl PricingMetadata {
    pub fn new(base_price: u64, currency: impl Into<String>) -> Self {
        Self {
            base_price: Some(base_price),
            currency: Some(currency.into()),
        }
    }

    /// Human-readable price, e.g. `19.99 USD`. `None` when no price is set.
    pub fn display(&self) -> Option<String> {
        let cents = self.base_price?;
        let amount = format!("{}.{:02}", cents / 100, cents % 100);
        Some(match &self.currency {
            Some(c) if !c.trim().is_empty() => format!("{amount} {}", c.trim()),
            _ => amount,
        })
    }
}

/// A purchasable catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Public page where the product can be bought.
    pub permalink: String,
    #[serde(default)]
    pub pricing: PricingMetadata,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, permalink: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            permalink: permalink.into(),
            pricing: PricingMetadata::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: PricingMetadata) -> Self {
        self.pricing = pricing;
        self
    }
}
