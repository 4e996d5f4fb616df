//! Built-in access policies.

use tracing::debug;

use coursegate_core::DomainResult;

use crate::{AccessRequest, AccessSource, Decision, Platform};

/// A single access rule.
pub trait AccessPolicy: Send + Sync {
    /// Stable name reported in explanations and logs.
    fn name(&self) -> &'static str;

    fn evaluate(&self, request: &AccessRequest) -> DomainResult<Decision>;
}

/// Keeps whatever access another rule already granted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorDecision;

impl AccessPolicy for PriorDecision {
    fn name(&self) -> &'static str {
        "prior_decision"
    }

    fn evaluate(&self, request: &AccessRequest) -> DomainResult<Decision> {
        Ok(if request.prior {
            Decision::grant("access already granted by another rule")
        } else {
            Decision::Abstain
        })
    }
}

/// Paid-module rule.
///
/// Abstains for modules with no linked product. For gated modules, course
/// access is required first; then the module must have been bought.
#[derive(Debug, Clone)]
pub struct PurchasedModule {
    platform: Platform,
    source: AccessSource,
}

impl PurchasedModule {
    pub fn new(platform: Platform, source: AccessSource) -> Self {
        Self { platform, source }
    }
}

impl AccessPolicy for PurchasedModule {
    fn name(&self) -> &'static str {
        "purchased_module"
    }

    fn evaluate(&self, request: &AccessRequest) -> DomainResult<Decision> {
        let Some(product_id) = self.platform.store.get_module_product(request.module_id)? else {
            return Ok(Decision::Abstain);
        };

        if !self
            .platform
            .user_has_course_access(request.course_id, request.user_id)?
        {
            debug!(
                user_id = %request.user_id,
                module_id = %request.module_id,
                course_id = ?request.course_id,
                "module view denied: no course access"
            );
            return Ok(Decision::deny("parent course access required"));
        }

        if self
            .platform
            .user_bought_module(self.source, request.user_id, request.module_id)?
        {
            Ok(Decision::grant(format!(
                "module purchased ({})",
                self.source.as_str()
            )))
        } else {
            debug!(
                user_id = %request.user_id,
                module_id = %request.module_id,
                %product_id,
                "module view denied: not purchased"
            );
            Ok(Decision::deny(format!("product {product_id} not purchased")))
        }
    }
}
