use serde::Serialize;

use coursegate_core::{CourseId, ModuleId, UserId};

use crate::{AccessRequest, PolicyOutcome};

/// Why a view decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    pub module_id: ModuleId,
    pub course_id: Option<CourseId>,
    pub user_id: UserId,
    pub prior: bool,
    pub granted: bool,
    /// Policy that decided; `None` when all abstained (default deny).
    pub decided_by: Option<String>,
    pub reason: String,
}

impl AccessExplanation {
    pub(crate) fn from_outcome(request: &AccessRequest, outcome: PolicyOutcome) -> Self {
        Self {
            module_id: request.module_id,
            course_id: request.course_id,
            user_id: request.user_id,
            prior: request.prior,
            granted: outcome.granted,
            decided_by: outcome.decided_by.map(str::to_string),
            reason: outcome.reason,
        }
    }
}
