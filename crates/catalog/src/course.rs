use serde::{Deserialize, Serialize};

use coursegate_core::{CourseId, ModuleId};

/// A course as seen by the entitlement core: an id and a display title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub title: String,
}

impl Course {
    pub fn new(id: CourseId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// A module: named content grouping inside at most one course.
///
/// The parent course is resolved through [`crate::ModuleTree`], not stored
/// here, because the host keeps that relation on its side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
}

impl Module {
    pub fn new(id: ModuleId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}
