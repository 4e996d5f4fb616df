use core::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use coursegate_catalog::{Commerce, CourseAccessOracle, ModuleTree};
use coursegate_core::{CourseId, DomainError, DomainResult, ModuleId, UserId};
use coursegate_entitlements::EntitlementStore;

/// Which recorded fact proves a user bought a module.
///
/// The store's purchase history and the grant record written by the grantor
/// normally agree, but they are maintained separately.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessSource {
    /// The store's live order history for the module's product.
    #[default]
    PurchaseHistory,
    /// The grant record kept by the entitlement store.
    GrantRecord,
    /// Either of the above.
    Either,
}

impl AccessSource {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessSource::PurchaseHistory => "purchase_history",
            AccessSource::GrantRecord => "grant_record",
            AccessSource::Either => "either",
        }
    }
}

impl FromStr for AccessSource {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "purchase_history" => Ok(AccessSource::PurchaseHistory),
            "grant_record" => Ok(AccessSource::GrantRecord),
            "either" => Ok(AccessSource::Either),
            other => Err(DomainError::validation(format!(
                "unknown access source '{other}' (expected purchase_history, grant_record or either)"
            ))),
        }
    }
}

/// Every collaborator the access decisions read from.
#[derive(Clone)]
pub struct Platform {
    pub store: Arc<dyn EntitlementStore>,
    pub oracle: Arc<dyn CourseAccessOracle>,
    pub commerce: Arc<dyn Commerce>,
    pub tree: Arc<dyn ModuleTree>,
}

impl Platform {
    /// Course access as a hard prerequisite: no course means no access.
    pub fn user_has_course_access(&self, course_id: Option<CourseId>, user_id: UserId) -> DomainResult<bool> {
        match course_id {
            Some(course_id) => self.oracle.user_started_course(course_id, user_id),
            None => Ok(false),
        }
    }

    /// Whether `source` shows the user owning the module.
    pub fn user_bought_module(
        &self,
        source: AccessSource,
        user_id: UserId,
        module_id: ModuleId,
    ) -> DomainResult<bool> {
        let from_history = || -> DomainResult<bool> {
            match self.store.get_module_product(module_id)? {
                Some(product_id) => self.commerce.customer_bought_product(user_id, product_id),
                None => Ok(false),
            }
        };
        let from_record =
            || -> DomainResult<bool> { Ok(self.store.get_user_granted_modules(user_id)?.contains(&module_id)) };

        match source {
            AccessSource::PurchaseHistory => from_history(),
            AccessSource::GrantRecord => from_record(),
            AccessSource::Either => Ok(from_record()? || from_history()?),
        }
    }
}

impl core::fmt::Debug for Platform {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
