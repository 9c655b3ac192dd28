//! User identity as seen by the access layer

use super::common::ObjectId;
use serde::{Deserialize, Serialize};

/// The acting user of an authorization decision.
///
/// Snapshotted by the caller before the decision runs; the access layer never
/// mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: ObjectId,
    pub username: String,
    /// Superusers bypass every policy check.
    pub is_superuser: bool,
    /// System auditors get read-only visibility over all objects.
    pub is_system_auditor: bool,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            username: username.into(),
            is_superuser: false,
            is_system_auditor: false,
        }
    }

    pub fn superuser(username: impl Into<String>) -> Self {
        Self {
            is_superuser: true,
            ..Self::new(username)
        }
    }

    pub fn auditor(username: impl Into<String>) -> Self {
        Self {
            is_system_auditor: true,
            ..Self::new(username)
        }
    }
}
