//! In-memory host platform for tests/dev.
//!
//! Stands in for the course platform (content tree + enrollments) and the
//! store (catalog + purchase history) behind the collaborator ports.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use coursegate_core::{CourseId, DomainError, DomainResult, ModuleId, ProductId, UserId};

use crate::{Commerce, Course, CourseAccessOracle, Module, ModuleTree, Product};

#[derive(Debug, Default)]
struct HostState {
    courses: HashMap<CourseId, Course>,
    modules: HashMap<ModuleId, Module>,
    parents: HashMap<ModuleId, CourseId>,
    products: HashMap<ProductId, Product>,
    enrollments: HashSet<(CourseId, UserId)>,
    purchases: HashSet<(UserId, ProductId)>,
}

#[derive(Debug, Default)]
pub struct InMemoryHost {
    state: RwLock<HostState>,
}

fn poisoned() -> DomainError {
    DomainError::storage("host state lock poisoned")
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_course(&self, course: Course) -> DomainResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.courses.insert(course.id, course);
        Ok(())
    }

    /// Insert or replace a module and (re)attach it to `course_id`.
    pub fn upsert_module(&self, module: Module, course_id: Option<CourseId>) -> DomainResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        match course_id {
            Some(c) => state.parents.insert(module.id, c),
            None => state.parents.remove(&module.id),
        };
        state.modules.insert(module.id, module);
        Ok(())
    }

    pub fn upsert_product(&self, product: Product) -> DomainResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.products.insert(product.id, product);
        Ok(())
    }

    pub fn enroll(&self, course_id: CourseId, user_id: UserId) -> DomainResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.enrollments.insert((course_id, user_id));
        Ok(())
    }

    /// Record a purchase in the store's own order history.
    pub fn record_purchase(&self, user_id: UserId, product_id: ProductId) -> DomainResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.purchases.insert((user_id, product_id));
        Ok(())
    }
}

impl CourseAccessOracle for InMemoryHost {
    fn user_started_course(&self, course_id: CourseId, user_id: UserId) -> DomainResult<bool> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.enrollments.contains(&(course_id, user_id)))
    }
}

impl Commerce for InMemoryHost {
    fn customer_bought_product(&self, user_id: UserId, product_id: ProductId) -> DomainResult<bool> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.purchases.contains(&(user_id, product_id)))
    }

    fn get_product(&self, product_id: ProductId) -> DomainResult<Option<Product>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.products.get(&product_id).cloned())
    }
}

impl ModuleTree for InMemoryHost {
    fn get_module(&self, module_id: ModuleId) -> DomainResult<Option<Module>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.modules.get(&module_id).cloned())
    }

    fn get_parent_course(&self, module_id: ModuleId) -> DomainResult<Option<CourseId>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.parents.get(&module_id).copied())
    }

    fn get_course(&self, course_id: CourseId) -> DomainResult<Option<Course>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.courses.get(&course_id).cloned())
    }
}
