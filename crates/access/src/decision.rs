use coursegate_core::{CourseId, DomainResult, ModuleId, UserId};

use crate::AccessPolicy;

/// A single view-access question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessRequest {
    pub module_id: ModuleId,
    /// Parent course, `None` when the module is not attached to one.
    pub course_id: Option<CourseId>,
    pub user_id: UserId,
    /// Decision already reached by rules outside this crate.
    pub prior: bool,
}

/// What one policy says about a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Grant(String),
    Deny(String),
    /// The policy has no opinion on this request.
    Abstain,
}

impl Decision {
    pub fn grant(reason: impl Into<String>) -> Self {
        Self::Grant(reason.into())
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny(reason.into())
    }
}

/// Combined result of a chain evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub granted: bool,
    /// Name of the deciding policy; `None` when every policy abstained.
    pub decided_by: Option<&'static str>,
    pub reason: String,
}

/// Ordered list of policies.
///
/// Combination rule: the first `Grant` wins; otherwise the first `Deny`;
/// otherwise deny by default. Evaluation stops at the first `Grant`.
/// Policies can only add permissions, so a policy that must dominate a later
/// grant has to return `Deny` itself for that case.
#[derive(Default)]
pub struct PolicyChain {
    policies: Vec<Box<dyn AccessPolicy>>,
}

impl PolicyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, policy: impl AccessPolicy + 'static) {
        self.policies.push(Box::new(policy));
    }

    pub fn evaluate(&self, request: &AccessRequest) -> DomainResult<PolicyOutcome> {
        let mut first_deny: Option<(&'static str, String)> = None;

        for policy in &self.policies {
            match policy.evaluate(request)? {
                Decision::Grant(reason) => {
                    return Ok(PolicyOutcome {
                        granted: true,
                        decided_by: Some(policy.name()),
                        reason,
                    });
                }
                Decision::Deny(reason) => {
                    if first_deny.is_none() {
                        first_deny = Some((policy.name(), reason));
                    }
                }
                Decision::Abstain => {}
            }
        }

        Ok(match first_deny {
            Some((name, reason)) => PolicyOutcome {
                granted: false,
                decided_by: Some(name),
                reason,
            },
            None => PolicyOutcome {
                granted: false,
                decided_by: None,
                reason: "no policy granted access".to_string(),
            },
        })
    }
}

impl core::fmt::Debug for PolicyChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.policies.iter().map(|p| p.name()))
            .finish()
    }
}
