use coursegate_core::{CourseId, DomainResult, ModuleId, ProductId, UserId};

use crate::{
    AccessExplanation, AccessPolicy, AccessRequest, AccessSource, Platform, PolicyChain,
    PriorDecision, PurchasedModule,
};

/// Decides whether a user may view a module.
///
/// Decisions are computed from current state on every call; nothing is
/// cached between requests.
#[derive(Debug)]
pub struct AccessEvaluator {
    platform: Platform,
    chain: PolicyChain,
}

impl AccessEvaluator {
    /// Standard chain: keep prior grants, then the paid-module rule.
    pub fn new(platform: Platform, source: AccessSource) -> Self {
        let mut chain = PolicyChain::new();
        chain.push(PriorDecision);
        chain.push(PurchasedModule::new(platform.clone(), source));
        Self { platform, chain }
    }

    /// Append an extra policy. It can grant more access, never less.
    pub fn with_policy(mut self, policy: impl AccessPolicy + 'static) -> Self {
        self.chain.push(policy);
        self
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// May `user_id` view `module_id`?
    ///
    /// - `prior == true` is returned unchanged
    /// - modules without a product pass `prior` through
    /// - without course access the answer is `false`, purchase or not
    /// - otherwise the module must have been bought
    pub fn can_view_module(
        &self,
        module_id: ModuleId,
        course_id: Option<CourseId>,
        user_id: UserId,
        prior: bool,
    ) -> DomainResult<bool> {
        let request = AccessRequest {
            module_id,
            course_id,
            user_id,
            prior,
        };
        Ok(self.chain.evaluate(&request)?.granted)
    }

    /// Same decision as [`Self::can_view_module`], with the deciding policy and reason.
    pub fn explain_access(
        &self,
        module_id: ModuleId,
        course_id: Option<CourseId>,
        user_id: UserId,
        prior: bool,
    ) -> DomainResult<AccessExplanation> {
        let request = AccessRequest {
            module_id,
            course_id,
            user_id,
            prior,
        };
        let outcome = self.chain.evaluate(&request)?;
        Ok(AccessExplanation::from_outcome(&request, outcome))
    }

    pub fn get_module_product_id(&self, module_id: ModuleId) -> DomainResult<Option<ProductId>> {
        self.platform.store.get_module_product(module_id)
    }

    /// Whether the user already owns the module by any record, ignoring
    /// course access. Blocks repeat purchases.
    pub fn user_holds_module(&self, user_id: UserId, module_id: ModuleId) -> DomainResult<bool> {
        self.platform
            .user_bought_module(AccessSource::Either, user_id, module_id)
    }
}
