//! `coursegate-access`: module access decisions.
//!
//! This crate is decoupled from HTTP and from any particular storage: it
//! reads through the [`Platform`] ports and never writes.
//!
//! - [`AccessEvaluator`]: may this user view this module?
//! - [`PurchaseValidator`]: may this user put this module's product in the cart?
//! - content gating: module body or a notice

pub mod decision;
pub mod evaluator;
pub mod explain;
pub mod gate;
pub mod platform;
pub mod policy;
pub mod validator;

#[cfg(test)]
mod fixtures;

pub use decision::{AccessRequest, Decision, PolicyChain, PolicyOutcome};
pub use evaluator::AccessEvaluator;
pub use explain::AccessExplanation;
pub use gate::Notice;
pub use platform::{AccessSource, Platform};
pub use policy::{AccessPolicy, PriorDecision, PurchasedModule};
pub use validator::{PurchaseDenial, PurchaseValidator, PurchaseVerdict};
