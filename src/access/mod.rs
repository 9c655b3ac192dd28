//! Centralized authorization policy engine.
//!
//! Every permission check enters through [`AccessRegistry`], which resolves
//! the policy variant for the object's type (once-built map, no runtime
//! introspection) and funnels the call through the superuser guard before any
//! policy logic runs.

pub mod credential;
pub mod diff;
pub mod inventory;
pub mod job_template;
pub mod organization;
pub mod project;

pub use credential::CredentialAccess;
pub use inventory::InventoryAccess;
pub use job_template::JobTemplateAccess;
pub use organization::OrganizationAccess;
pub use project::ProjectAccess;

use crate::domain::{
    ChangeRequest, Credential, Inventory, ManagedObject, ObjectId, ObjectKind, ObjectRef,
    Organization, Project, RoleName, User,
};
use crate::error::{AppError, Result};
use crate::store::{LicenseGate, ObjectStore, RoleStore};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

/// Collaborator handles shared by every policy variant.
#[derive(Clone)]
pub struct AccessEnv {
    pub roles: Arc<dyn RoleStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub license: Arc<dyn LicenseGate>,
}

impl AccessEnv {
    pub fn new(
        roles: Arc<dyn RoleStore>,
        objects: Arc<dyn ObjectStore>,
        license: Arc<dyn LicenseGate>,
    ) -> Self {
        Self {
            roles,
            objects,
            license,
        }
    }

    /// Membership test for one named role slot on an object. A missing slot
    /// is non-membership, not an error.
    pub async fn has_role(&self, user: &User, owner: ObjectRef, name: RoleName) -> Result<bool> {
        match self.roles.role_for(&owner, name).await? {
            Some(role) => self.roles.is_member(role, user).await,
            None => Ok(false),
        }
    }

    /// True when the user holds any of the given roles on the object.
    pub async fn has_any_role(
        &self,
        user: &User,
        owner: ObjectRef,
        names: &[RoleName],
    ) -> Result<bool> {
        for name in names {
            if self.has_role(user, owner, *name).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub async fn resolve_organization(&self, id: ObjectId) -> Result<Organization> {
        self.objects
            .find_organization(id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("organization {id} does not exist")))
    }

    pub async fn resolve_project(&self, id: ObjectId) -> Result<Project> {
        self.objects
            .find_project(id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("project {id} does not exist")))
    }

    pub async fn resolve_inventory(&self, id: ObjectId) -> Result<Inventory> {
        self.objects
            .find_inventory(id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("inventory {id} does not exist")))
    }

    pub async fn resolve_credential(&self, id: ObjectId) -> Result<Credential> {
        self.objects
            .find_credential(id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("credential {id} does not exist")))
    }
}

/// Superuser short-circuit: the outermost layer of every check.
///
/// Returns `true` without polling the wrapped check when the acting user is
/// a superuser; otherwise delegates unchanged.
pub async fn superuser_or<F>(user: &User, check: F) -> Result<bool>
where
    F: Future<Output = Result<bool>>,
{
    if user.is_superuser {
        return Ok(true);
    }
    check.await
}

/// Capability set implemented by each object-type policy variant.
#[async_trait::async_trait]
pub trait ObjectPolicy: Send + Sync {
    fn kind(&self) -> ObjectKind;

    /// May the user create an object of this type with the given field
    /// values? Referenced objects must exist and the user must hold the
    /// required role on each of them.
    async fn can_add(&self, user: &User, data: &ChangeRequest) -> Result<bool>;

    /// May the user view the object?
    async fn can_read(&self, user: &User, obj: &ManagedObject) -> Result<bool>;

    /// May the user apply the proposed field changes? Reference fields that
    /// did not actually change are not re-authorized.
    async fn can_change(
        &self,
        user: &User,
        obj: &ManagedObject,
        data: &ChangeRequest,
    ) -> Result<bool>;

    /// May the user delete the object?
    async fn can_delete(&self, user: &User, obj: &ManagedObject) -> Result<bool>;
}

/// Collapse failures caused by caller-supplied input into a denial.
///
/// License failures also deny the specific check. Anything else (role store
/// down, policy bug) propagates; those are broken dependencies, not user
/// error.
fn deny_on_user_error(result: Result<bool>) -> Result<bool> {
    match result {
        Err(AppError::License(reason)) => {
            tracing::debug!(%reason, "license gate denied check");
            Ok(false)
        }
        Err(err) if err.is_user_input() => {
            tracing::debug!(error = %err, "treating input failure as denial");
            Ok(false)
        }
        other => other,
    }
}

/// Policy dispatcher: object-type tag to policy variant, resolved once at
/// construction.
pub struct AccessRegistry {
    policies: HashMap<ObjectKind, Arc<dyn ObjectPolicy>>,
}

impl AccessRegistry {
    pub fn new(env: AccessEnv) -> Self {
        let variants: Vec<Arc<dyn ObjectPolicy>> = vec![
            Arc::new(JobTemplateAccess::new(env.clone())),
            Arc::new(ProjectAccess::new(env.clone())),
            Arc::new(InventoryAccess::new(env.clone())),
            Arc::new(CredentialAccess::new(env.clone())),
            Arc::new(OrganizationAccess::new(env)),
        ];
        let mut policies = HashMap::new();
        for policy in variants {
            policies.insert(policy.kind(), policy);
        }
        Self { policies }
    }

    fn policy(&self, kind: ObjectKind) -> Result<&Arc<dyn ObjectPolicy>> {
        self.policies.get(&kind).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("no access policy registered for {kind}"))
        })
    }

    pub async fn can_add(
        &self,
        user: &User,
        kind: ObjectKind,
        data: &ChangeRequest,
    ) -> Result<bool> {
        let policy = self.policy(kind)?;
        deny_on_user_error(superuser_or(user, policy.can_add(user, data)).await)
    }

    pub async fn can_read(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let policy = self.policy(obj.kind())?;
        superuser_or(user, async {
            // System auditors get read-only visibility over everything.
            if user.is_system_auditor {
                return Ok(true);
            }
            policy.can_read(user, obj).await
        })
        .await
    }

    pub async fn can_change(
        &self,
        user: &User,
        obj: &ManagedObject,
        data: &ChangeRequest,
    ) -> Result<bool> {
        let policy = self.policy(obj.kind())?;
        deny_on_user_error(superuser_or(user, policy.can_change(user, obj, data)).await)
    }

    pub async fn can_delete(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let policy = self.policy(obj.kind())?;
        superuser_or(user, policy.can_delete(user, obj)).await
    }
}
