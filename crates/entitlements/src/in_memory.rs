//! In-memory entitlement store for tests/dev.

use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use coursegate_core::{DomainError, DomainResult, ModuleId, ProductId, UserId};

use crate::store::{EntitlementStore, ModuleProductLink};

/// Both directions of the link relation, always updated under one lock.
#[derive(Debug, Default)]
struct Links {
    by_module: HashMap<ModuleId, ProductId>,
    by_product: HashMap<ProductId, ModuleId>,
}

impl Links {
    fn unlink_module(&mut self, module_id: ModuleId) {
        if let Some(product_id) = self.by_module.remove(&module_id) {
            self.by_product.remove(&product_id);
        }
    }

    fn unlink_product(&mut self, product_id: ProductId) {
        if let Some(module_id) = self.by_product.remove(&product_id) {
            self.by_module.remove(&module_id);
        }
    }

    fn link(&mut self, module_id: ModuleId, product_id: ProductId) {
        self.by_module.insert(module_id, product_id);
        self.by_product.insert(product_id, module_id);
    }
}

#[derive(Debug, Default)]
struct Grants {
    by_user: HashMap<UserId, BTreeSet<ModuleId>>,
    unannounced: BTreeSet<(UserId, ModuleId)>,
}

/// In-memory store.
///
/// Grants sit behind a single write lock, which serializes the
/// read-check-insert of `add_user_granted_module` together with the
/// unannounced marker it sets.
#[derive(Debug, Default)]
pub struct InMemoryEntitlementStore {
    links: RwLock<Links>,
    grants: RwLock<Grants>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> DomainError {
    DomainError::storage("entitlement store lock poisoned")
}

impl EntitlementStore for InMemoryEntitlementStore {
    fn get_module_product(&self, module_id: ModuleId) -> DomainResult<Option<ProductId>> {
        let links = self.links.read().map_err(|_| poisoned())?;
        Ok(links.by_module.get(&module_id).copied())
    }

    fn get_product_module(&self, product_id: ProductId) -> DomainResult<Option<ModuleId>> {
        let links = self.links.read().map_err(|_| poisoned())?;
        Ok(links.by_product.get(&product_id).copied())
    }

    fn set_module_product(&self, module_id: ModuleId, product_id: Option<ProductId>) -> DomainResult<()> {
        let mut links = self.links.write().map_err(|_| poisoned())?;

        let Some(product_id) = product_id else {
            links.unlink_module(module_id);
            return Ok(());
        };

        match links.by_product.get(&product_id) {
            Some(owner) if *owner == module_id => return Ok(()),
            Some(owner) => {
                return Err(DomainError::conflict(format!(
                    "product {product_id} is already linked to module {owner}"
                )));
            }
            None => {}
        }

        links.unlink_module(module_id);
        links.link(module_id, product_id);
        Ok(())
    }

    fn set_product_module(&self, product_id: ProductId, module_id: Option<ModuleId>) -> DomainResult<()> {
        let mut links = self.links.write().map_err(|_| poisoned())?;

        let Some(module_id) = module_id else {
            links.unlink_product(product_id);
            return Ok(());
        };

        match links.by_module.get(&module_id) {
            Some(owner) if *owner == product_id => return Ok(()),
            Some(owner) => {
                return Err(DomainError::conflict(format!(
                    "module {module_id} is already linked to product {owner}"
                )));
            }
            None => {}
        }

        links.unlink_product(product_id);
        links.link(module_id, product_id);
        Ok(())
    }

    fn list_links(&self) -> DomainResult<Vec<ModuleProductLink>> {
        let links = self.links.read().map_err(|_| poisoned())?;
        let mut out: Vec<ModuleProductLink> = links
            .by_module
            .iter()
            .map(|(m, p)| ModuleProductLink {
                module_id: *m,
                product_id: *p,
            })
            .collect();
        out.sort();
        Ok(out)
    }

    fn get_user_granted_modules(&self, user_id: UserId) -> DomainResult<BTreeSet<ModuleId>> {
        let grants = self.grants.read().map_err(|_| poisoned())?;
        Ok(grants.by_user.get(&user_id).cloned().unwrap_or_default())
    }

    fn add_user_granted_module(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<bool> {
        let mut grants = self.grants.write().map_err(|_| poisoned())?;
        let added = grants.by_user.entry(user_id).or_default().insert(module_id);
        if added {
            grants.unannounced.insert((user_id, module_id));
        }
        Ok(added)
    }

    fn grant_needs_announcement(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<bool> {
        let grants = self.grants.read().map_err(|_| poisoned())?;
        Ok(grants.unannounced.contains(&(user_id, module_id)))
    }

    fn mark_grant_announced(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<()> {
        let mut grants = self.grants.write().map_err(|_| poisoned())?;
        grants.unannounced.remove(&(user_id, module_id));
        Ok(())
    }
}
