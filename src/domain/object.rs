//! Access-controlled entity types

use super::common::ObjectId;
use serde::{Deserialize, Serialize};

/// Type tag for access-controlled objects. Used as the registry key when
/// dispatching to the matching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    JobTemplate,
    Project,
    Inventory,
    Credential,
    Organization,
}

impl ObjectKind {
    /// Returns stable storage value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JobTemplate => "job_template",
            Self::Project => "project",
            Self::Inventory => "inventory",
            Self::Credential => "credential",
            Self::Organization => "organization",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one access-controlled object: type tag plus identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub kind: ObjectKind,
    pub id: ObjectId,
}

impl ObjectRef {
    pub fn new(kind: ObjectKind, id: ObjectId) -> Self {
        Self { kind, id }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Job template launch type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Run,
    Check,
    Scan,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Run => "run",
            Self::Check => "check",
            Self::Scan => "scan",
        }
    }
}

impl std::str::FromStr for JobType {
    type Err = crate::error::AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "run" => Ok(Self::Run),
            "check" => Ok(Self::Check),
            "scan" => Ok(Self::Scan),
            _ => Err(crate::error::AppError::Validation(format!(
                "unknown job type '{value}'"
            ))),
        }
    }
}

/// Kind of secret a credential carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Ssh,
    Net,
    Scm,
    Aws,
    Gce,
    Azure,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Net => "net",
            Self::Scm => "scm",
            Self::Aws => "aws",
            Self::Gce => "gce",
            Self::Azure => "azure",
        }
    }
}

/// Organization: the tenancy root of the ownership graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: ObjectId,
    pub name: String,
}

impl Organization {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::Organization, self.id)
    }
}

/// Source-control project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ObjectId,
    pub name: String,
    pub organization_id: Option<ObjectId>,
    /// SCM credential used to fetch the project, if any.
    pub credential_id: Option<ObjectId>,
}

impl Project {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::Project, self.id)
    }
}

/// Host inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub id: ObjectId,
    pub name: String,
    pub organization_id: Option<ObjectId>,
}

impl Inventory {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::Inventory, self.id)
    }
}

/// Stored secret usable by jobs (machine, network, or cloud access).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: ObjectId,
    pub name: String,
    pub kind: CredentialKind,
    /// Owning organization; personal credentials have none.
    pub organization_id: Option<ObjectId>,
}

impl Credential {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::Credential, self.id)
    }
}

/// Reusable job definition tying a project to an inventory and credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobTemplate {
    pub id: ObjectId,
    pub name: String,
    pub job_type: JobType,
    pub project_id: Option<ObjectId>,
    pub inventory_id: Option<ObjectId>,
    pub credential_id: Option<ObjectId>,
    pub cloud_credential_id: Option<ObjectId>,
    pub network_credential_id: Option<ObjectId>,
}

impl JobTemplate {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(ObjectKind::JobTemplate, self.id)
    }
}

/// Tagged union over every access-controlled entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ManagedObject {
    JobTemplate(JobTemplate),
    Project(Project),
    Inventory(Inventory),
    Credential(Credential),
    Organization(Organization),
}

impl ManagedObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::JobTemplate(_) => ObjectKind::JobTemplate,
            Self::Project(_) => ObjectKind::Project,
            Self::Inventory(_) => ObjectKind::Inventory,
            Self::Credential(_) => ObjectKind::Credential,
            Self::Organization(_) => ObjectKind::Organization,
        }
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Self::JobTemplate(o) => o.id,
            Self::Project(o) => o.id,
            Self::Inventory(o) => o.id,
            Self::Credential(o) => o.id,
            Self::Organization(o) => o.id,
        }
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.kind(), self.id())
    }

    /// The object's foreign-key reference fields that require fresh
    /// authorization when changed, paired with their current values.
    ///
    /// Field names match the change-request payload keys, not the struct
    /// field names.
    pub fn sensitive_references(&self) -> Vec<(&'static str, Option<ObjectId>)> {
        match self {
            Self::JobTemplate(jt) => vec![
                ("project", jt.project_id),
                ("inventory", jt.inventory_id),
                ("credential", jt.credential_id),
                ("cloud_credential", jt.cloud_credential_id),
                ("network_credential", jt.network_credential_id),
            ],
            Self::Project(p) => vec![
                ("organization", p.organization_id),
                ("credential", p.credential_id),
            ],
            Self::Inventory(inv) => vec![("organization", inv.organization_id)],
            Self::Credential(cred) => vec![("organization", cred.organization_id)],
            Self::Organization(_) => vec![],
        }
    }
}

impl From<JobTemplate> for ManagedObject {
    fn from(value: JobTemplate) -> Self {
        Self::JobTemplate(value)
    }
}

impl From<Project> for ManagedObject {
    fn from(value: Project) -> Self {
        Self::Project(value)
    }
}

impl From<Inventory> for ManagedObject {
    fn from(value: Inventory) -> Self {
        Self::Inventory(value)
    }
}

impl From<Credential> for ManagedObject {
    fn from(value: Credential) -> Self {
        Self::Credential(value)
    }
}

impl From<Organization> for ManagedObject {
    fn from(value: Organization) -> Self {
        Self::Organization(value)
    }
}
