//! Organization access policy

use super::{AccessEnv, ObjectPolicy};
use crate::domain::{ChangeRequest, ManagedObject, ObjectKind, Organization, RoleName, User};
use crate::error::{AppError, Result};
use crate::store::LicenseFeature;

/// Policy for organizations, the tenancy roots. Creation is reserved to
/// superusers and gated on the multi-organization license feature; renames
/// and deletion require the organization admin role.
pub struct OrganizationAccess {
    env: AccessEnv,
}

impl OrganizationAccess {
    pub fn new(env: AccessEnv) -> Self {
        Self { env }
    }

    fn organization<'a>(&self, obj: &'a ManagedObject) -> Result<&'a Organization> {
        match obj {
            ManagedObject::Organization(org) => Ok(org),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "organization policy dispatched for {}",
                other.kind()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ObjectPolicy for OrganizationAccess {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Organization
    }

    async fn can_add(&self, _user: &User, _data: &ChangeRequest) -> Result<bool> {
        self.env
            .license
            .check_feature(LicenseFeature::MultipleOrganizations)
            .await?;
        // Only superusers create organizations; they never reach this point.
        Ok(false)
    }

    async fn can_read(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let org = self.organization(obj)?;
        self.env
            .has_any_role(
                user,
                org.object_ref(),
                &[RoleName::Admin, RoleName::Member, RoleName::Auditor],
            )
            .await
    }

    async fn can_change(
        &self,
        user: &User,
        obj: &ManagedObject,
        _data: &ChangeRequest,
    ) -> Result<bool> {
        // Organizations declare no sensitive references; read membership must
        // not imply rename rights, so admin is required outright.
        let org = self.organization(obj)?;
        self.env
            .has_role(user, org.object_ref(), RoleName::Admin)
            .await
    }

    async fn can_delete(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let org = self.organization(obj)?;
        self.env
            .has_role(user, org.object_ref(), RoleName::Admin)
            .await
    }
}
