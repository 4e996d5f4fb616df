//! Add-to-cart gate for module products.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use coursegate_core::{CourseId, DomainResult, ModuleId, ProductId, UserId};

use crate::AccessEvaluator;

/// Why a module product may not be purchased.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PurchaseDenial {
    #[error("You must be logged in to purchase this module.")]
    LoginRequired,

    #[error(
        "You must purchase and be enrolled in the course \"{course_title}\" before you can purchase this module."
    )]
    CourseRequired {
        course_id: CourseId,
        course_title: String,
    },

    #[error("You already have access to this module.")]
    AlreadyOwned { module_id: ModuleId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseVerdict {
    Admit,
    Deny(PurchaseDenial),
}

impl PurchaseVerdict {
    pub fn is_admit(&self) -> bool {
        matches!(self, PurchaseVerdict::Admit)
    }

    /// User-facing reason, for denials only.
    pub fn reason(&self) -> Option<String> {
        match self {
            PurchaseVerdict::Admit => None,
            PurchaseVerdict::Deny(denial) => Some(denial.to_string()),
        }
    }
}

/// Read-only pre-condition check run before a product enters the cart.
#[derive(Debug, Clone)]
pub struct PurchaseValidator {
    evaluator: Arc<AccessEvaluator>,
}

impl PurchaseValidator {
    pub fn new(evaluator: Arc<AccessEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Products not linked to a module, and modules outside any course, are
    /// admitted. Otherwise the buyer must be logged in, enrolled in the parent
    /// course, and not already own the module.
    pub fn validate_purchase(
        &self,
        user_id: Option<UserId>,
        product_id: ProductId,
    ) -> DomainResult<PurchaseVerdict> {
        let platform = self.evaluator.platform();

        let Some(module_id) = platform.store.get_product_module(product_id)? else {
            return Ok(PurchaseVerdict::Admit);
        };

        let Some(user_id) = user_id else {
            debug!(%product_id, %module_id, "purchase denied: not logged in");
            return Ok(PurchaseVerdict::Deny(PurchaseDenial::LoginRequired));
        };

        let Some(course_id) = platform.tree.get_parent_course(module_id)? else {
            return Ok(PurchaseVerdict::Admit);
        };

        if !platform.oracle.user_started_course(course_id, user_id)? {
            let course_title = platform
                .tree
                .get_course(course_id)?
                .map(|c| c.title)
                .unwrap_or_else(|| format!("#{course_id}"));
            debug!(%user_id, %product_id, %module_id, %course_id, "purchase denied: course not started");
            return Ok(PurchaseVerdict::Deny(PurchaseDenial::CourseRequired {
                course_id,
                course_title,
            }));
        }

        let already = self.evaluator.user_holds_module(user_id, module_id)?
            || self
                .evaluator
                .can_view_module(module_id, Some(course_id), user_id, false)?;
        if already {
            debug!(%user_id, %product_id, %module_id, "purchase denied: already owned");
            return Ok(PurchaseVerdict::Deny(PurchaseDenial::AlreadyOwned { module_id }));
        }

        Ok(PurchaseVerdict::Admit)
    }
}
