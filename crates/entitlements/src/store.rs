use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use coursegate_core::{DomainResult, ModuleId, ProductId, UserId};

/// One row of the module↔product relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleProductLink {
    pub module_id: ModuleId,
    pub product_id: ProductId,
}

/// Entitlement persistence: pure data access, no decisions.
///
/// The module↔product association is a single relation, unique on both
/// columns, so the module-side and product-side views can never disagree.
/// Each side may replace or clear its own link; taking over a product or
/// module that is linked elsewhere is rejected with `DomainError::Conflict`.
///
/// Granted modules are append-only per user. Implementations must make
/// `add_user_granted_module` an atomic add-to-set per user so that two
/// concurrent completions for the same user cannot drop a grant.
///
/// Every new grant starts unannounced. It stays that way until
/// `mark_grant_announced` records that its completion event went out, so a
/// grant whose event was lost can be announced again on redelivery.
pub trait EntitlementStore: Send + Sync {
    fn get_module_product(&self, module_id: ModuleId) -> DomainResult<Option<ProductId>>;

    /// Reverse lookup: the module a product unlocks.
    fn get_product_module(&self, product_id: ProductId) -> DomainResult<Option<ModuleId>>;

    /// Module-side edit. `None` removes the module's link.
    fn set_module_product(&self, module_id: ModuleId, product_id: Option<ProductId>) -> DomainResult<()>;

    /// Product-side edit. `None` removes the product's link.
    fn set_product_module(&self, product_id: ProductId, module_id: Option<ModuleId>) -> DomainResult<()>;

    /// All links, ordered by module id.
    fn list_links(&self) -> DomainResult<Vec<ModuleProductLink>>;

    fn get_user_granted_modules(&self, user_id: UserId) -> DomainResult<BTreeSet<ModuleId>>;

    /// Add a module to the user's granted set.
    ///
    /// Returns `true` only when the module was not already present.
    fn add_user_granted_module(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<bool>;

    /// `true` while the grant exists and its completion event has not gone out.
    fn grant_needs_announcement(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<bool>;

    fn mark_grant_announced(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<()>;
}

impl<S> EntitlementStore for Arc<S>
where
    S: EntitlementStore + ?Sized,
{
    fn get_module_product(&self, module_id: ModuleId) -> DomainResult<Option<ProductId>> {
        (**self).get_module_product(module_id)
    }

    fn get_product_module(&self, product_id: ProductId) -> DomainResult<Option<ModuleId>> {
        (**self).get_product_module(product_id)
    }

    fn set_module_product(&self, module_id: ModuleId, product_id: Option<ProductId>) -> DomainResult<()> {
        (**self).set_module_product(module_id, product_id)
    }

    fn set_product_module(&self, product_id: ProductId, module_id: Option<ModuleId>) -> DomainResult<()> {
        (**self).set_product_module(product_id, module_id)
    }

    fn list_links(&self) -> DomainResult<Vec<ModuleProductLink>> {
        (**self).list_links()
    }

    fn get_user_granted_modules(&self, user_id: UserId) -> DomainResult<BTreeSet<ModuleId>> {
        (**self).get_user_granted_modules(user_id)
    }

    fn add_user_granted_module(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<bool> {
        (**self).add_user_granted_module(user_id, module_id)
    }

    fn grant_needs_announcement(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<bool> {
        (**self).grant_needs_announcement(user_id, module_id)
    }

    fn mark_grant_announced(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<()> {
        (**self).mark_grant_announced(user_id, module_id)
    }
}
