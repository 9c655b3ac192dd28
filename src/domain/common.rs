//! Common types for domain models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of an access-controlled object.
///
/// Wraps a UUID so that transient (not-yet-persisted) instances can carry a
/// usable identity through an authorization dry-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub Uuid);

impl ObjectId {
    pub fn new() -> Self {
        ObjectId(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        ObjectId(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Parse an identifier string
    pub fn parse_str(s: &str) -> Result<Self, uuid::Error> {
        Ok(ObjectId(Uuid::parse_str(s)?))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        ObjectId(uuid)
    }
}

impl From<ObjectId> for Uuid {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(ObjectId(Uuid::parse_str(s)?))
    }
}
