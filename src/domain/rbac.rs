//! RBAC primitives: role names and role identity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a role record in the role store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub Uuid);

impl RoleId {
    pub fn new() -> Self {
        RoleId(Uuid::new_v4())
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Named permission grouping attached to exactly one owning object.
///
/// Which names exist on a given object depends on its type: job templates
/// carry `Admin`/`Execute`/`Read`, organizations carry
/// `Admin`/`Member`/`Auditor`, and so on. Parent roles in the role graph
/// imply their children, so an organization admin reaches a project's
/// `Admin` role without holding it directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    Admin,
    Use,
    Execute,
    Update,
    Read,
    Member,
    Auditor,
}

impl RoleName {
    /// Returns stable storage value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Use => "use",
            Self::Execute => "execute",
            Self::Update => "update",
            Self::Read => "read",
            Self::Member => "member",
            Self::Auditor => "auditor",
        }
    }

    /// Role names sufficient to view the owning object.
    pub fn viewing_roles() -> &'static [RoleName] {
        &[
            RoleName::Admin,
            RoleName::Use,
            RoleName::Execute,
            RoleName::Update,
            RoleName::Read,
            RoleName::Member,
            RoleName::Auditor,
        ]
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleName {
    type Err = crate::error::AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "use" => Ok(Self::Use),
            "execute" => Ok(Self::Execute),
            "update" => Ok(Self::Update),
            "read" => Ok(Self::Read),
            "member" => Ok(Self::Member),
            "auditor" => Ok(Self::Auditor),
            _ => Err(crate::error::AppError::Validation(format!(
                "unknown role name '{value}'"
            ))),
        }
    }
}
