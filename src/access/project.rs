//! Project access policy

use super::{diff, AccessEnv, ObjectPolicy};
use crate::domain::{ChangeRequest, ManagedObject, ObjectKind, Project, RoleName, User};
use crate::error::{AppError, Result};

/// Policy for source-control projects. Creation is an organization-admin
/// action; day-to-day changes require the project admin role.
pub struct ProjectAccess {
    env: AccessEnv,
}

impl ProjectAccess {
    pub fn new(env: AccessEnv) -> Self {
        Self { env }
    }

    fn project<'a>(&self, obj: &'a ManagedObject) -> Result<&'a Project> {
        match obj {
            ManagedObject::Project(p) => Ok(p),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "project policy dispatched for {}",
                other.kind()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ObjectPolicy for ProjectAccess {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Project
    }

    async fn can_add(&self, user: &User, data: &ChangeRequest) -> Result<bool> {
        // An SCM credential reference needs use rights.
        if let Some(id) = data.reference("credential")? {
            let credential = self.env.resolve_credential(id).await?;
            if !self
                .env
                .has_role(user, credential.object_ref(), RoleName::Use)
                .await?
            {
                return Ok(false);
            }
        }
        match data.reference("organization")? {
            Some(id) => {
                let org = self.env.resolve_organization(id).await?;
                self.env
                    .has_role(user, org.object_ref(), RoleName::Admin)
                    .await
            }
            // Organization-less projects are reserved to superusers.
            None => Ok(false),
        }
    }

    async fn can_read(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let project = self.project(obj)?;
        self.env
            .has_any_role(
                user,
                project.object_ref(),
                &[RoleName::Admin, RoleName::Use, RoleName::Update, RoleName::Read],
            )
            .await
    }

    async fn can_change(
        &self,
        user: &User,
        obj: &ManagedObject,
        data: &ChangeRequest,
    ) -> Result<bool> {
        let project = self.project(obj)?;
        if !self
            .env
            .has_role(user, project.object_ref(), RoleName::Admin)
            .await?
        {
            return Ok(false);
        }
        if diff::changes_are_non_sensitive(obj, data) {
            return Ok(true);
        }
        let payload = diff::authorization_payload(obj, data);
        self.can_add(user, &payload).await
    }

    async fn can_delete(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let project = self.project(obj)?;
        self.env
            .has_role(user, project.object_ref(), RoleName::Admin)
            .await
    }
}
