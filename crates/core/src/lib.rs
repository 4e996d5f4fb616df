//! `coursegate-core`: shared domain building blocks.
//!
//! Identifiers and the error model used by every other crate. No IO lives
//! here.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{CourseId, ModuleId, OrderId, ProductId, SubscriptionId, UserId};
