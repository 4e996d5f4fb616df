//! Collaborator ports: questions the entitlement core asks the host.
//!
//! Every method returns `DomainResult` so a failing backend propagates to the
//! request boundary. "Nothing found" is `Ok(None)` / `Ok(false)`.

use std::sync::Arc;

use coursegate_core::{CourseId, DomainResult, ModuleId, ProductId, UserId};

use crate::{Course, Module, Product};

/// "Has this user started (enrolled in) this course?"
///
/// Queried, never mutated, by the core.
pub trait CourseAccessOracle: Send + Sync {
    fn user_started_course(&self, course_id: CourseId, user_id: UserId) -> DomainResult<bool>;
}

/// The store's catalog and purchase history.
pub trait Commerce: Send + Sync {
    /// Whether the store's own order history shows `user_id` bought `product_id`.
    fn customer_bought_product(&self, user_id: UserId, product_id: ProductId) -> DomainResult<bool>;

    /// Product details for price/link display.
    fn get_product(&self, product_id: ProductId) -> DomainResult<Option<Product>>;
}

/// The course platform's content tree.
pub trait ModuleTree: Send + Sync {
    fn get_module(&self, module_id: ModuleId) -> DomainResult<Option<Module>>;

    /// Parent course of a module, `None` when the module is not attached to one.
    fn get_parent_course(&self, module_id: ModuleId) -> DomainResult<Option<CourseId>>;

    fn get_course(&self, course_id: CourseId) -> DomainResult<Option<Course>>;
}

impl<T> CourseAccessOracle for Arc<T>
where
    T: CourseAccessOracle + ?Sized,
{
    fn user_started_course(&self, course_id: CourseId, user_id: UserId) -> DomainResult<bool> {
        (**self).user_started_course(course_id, user_id)
    }
}

impl<T> Commerce for Arc<T>
where
    T: Commerce + ?Sized,
{
    fn customer_bought_product(&self, user_id: UserId, product_id: ProductId) -> DomainResult<bool> {
        (**self).customer_bought_product(user_id, product_id)
    }

    fn get_product(&self, product_id: ProductId) -> DomainResult<Option<Product>> {
        (**self).get_product(product_id)
    }
}

impl<T> ModuleTree for Arc<T>
where
    T: ModuleTree + ?Sized,
{
    fn get_module(&self, module_id: ModuleId) -> DomainResult<Option<Module>> {
        (**self).get_module(module_id)
    }

    fn get_parent_course(&self, module_id: ModuleId) -> DomainResult<Option<CourseId>> {
        (**self).get_parent_course(module_id)
    }

    fn get_course(&self, course_id: CourseId) -> DomainResult<Option<Course>> {
        (**self).get_course(course_id)
    }
}
