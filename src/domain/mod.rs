//! Domain models for access control

pub mod change;
pub mod common;
pub mod object;
pub mod rbac;
pub mod user;

pub use change::ChangeRequest;
pub use common::ObjectId;
pub use object::{
    Credential, CredentialKind, Inventory, JobTemplate, JobType, ManagedObject, ObjectKind,
    ObjectRef, Organization, Project,
};
pub use rbac::{RoleId, RoleName};
pub use user::User;
