//! Shared test setup: module 3 sells as product 42 inside course 7.

use std::sync::Arc;

use coursegate_catalog::{Course, InMemoryHost, Module, PricingMetadata, Product};
use coursegate_core::{CourseId, ModuleId, ProductId, UserId};
use coursegate_entitlements::{EntitlementStore, InMemoryEntitlementStore};

use crate::{AccessEvaluator, AccessSource, Platform, PurchaseValidator};

pub const USER: UserId = UserId::new(5);
pub const MODULE: ModuleId = ModuleId::new(3);
pub const COURSE: CourseId = CourseId::new(7);
pub const PRODUCT: ProductId = ProductId::new(42);

pub struct Fixture {
    pub host: Arc<InMemoryHost>,
    pub store: Arc<InMemoryEntitlementStore>,
}

impl Fixture {
    pub fn new() -> Self {
        let host = Arc::new(InMemoryHost::new());
        host.upsert_course(Course::new(COURSE, "Rust Basics")).unwrap();
        host.upsert_module(Module::new(MODULE, "Ownership Deep Dive"), Some(COURSE))
            .unwrap();
        host.upsert_product(
            Product::new(PRODUCT, "Ownership Deep Dive", "https://shop.example/p/42")
                .with_pricing(PricingMetadata::new(1999, "USD")),
        )
        .unwrap();

        let store = Arc::new(InMemoryEntitlementStore::new());
        store.set_module_product(MODULE, Some(PRODUCT)).unwrap();

        Self { host, store }
    }

    pub fn with_state(enrolled: bool, bought: bool, granted: bool) -> Self {
        let fx = Self::new();
        if enrolled {
            fx.host.enroll(COURSE, USER).unwrap();
        }
        if bought {
            fx.host.record_purchase(USER, PRODUCT).unwrap();
        }
        if granted {
            fx.store.add_user_granted_module(USER, MODULE).unwrap();
        }
        fx
    }

    pub fn platform(&self) -> Platform {
        Platform {
            store: self.store.clone(),
            oracle: self.host.clone(),
            commerce: self.host.clone(),
            tree: self.host.clone(),
        }
    }

    pub fn evaluator(&self, source: AccessSource) -> AccessEvaluator {
        AccessEvaluator::new(self.platform(), source)
    }

    pub fn validator(&self) -> PurchaseValidator {
        PurchaseValidator::new(Arc::new(self.evaluator(AccessSource::PurchaseHistory)))
    }
}
