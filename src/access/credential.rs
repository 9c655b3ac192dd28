//! Credential access policy

use super::{diff, AccessEnv, ObjectPolicy};
use crate::domain::{ChangeRequest, Credential, ManagedObject, ObjectKind, RoleName, User};
use crate::error::{AppError, Result};

/// Policy for stored credentials. Organization-owned credentials are managed
/// by organization admins; personal credentials name their owner in the
/// creation payload and may only be created for oneself.
pub struct CredentialAccess {
    env: AccessEnv,
}

impl CredentialAccess {
    pub fn new(env: AccessEnv) -> Self {
        Self { env }
    }

    fn credential<'a>(&self, obj: &'a ManagedObject) -> Result<&'a Credential> {
        match obj {
            ManagedObject::Credential(cred) => Ok(cred),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "credential policy dispatched for {}",
                other.kind()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ObjectPolicy for CredentialAccess {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Credential
    }

    async fn can_add(&self, user: &User, data: &ChangeRequest) -> Result<bool> {
        // A personal credential names its owner; only self-targets pass.
        if let Some(target) = data.reference("user")? {
            return Ok(target == user.id);
        }
        match data.reference("organization")? {
            Some(id) => {
                let org = self.env.resolve_organization(id).await?;
                self.env
                    .has_role(user, org.object_ref(), RoleName::Admin)
                    .await
            }
            None => Ok(false),
        }
    }

    async fn can_read(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let credential = self.credential(obj)?;
        self.env
            .has_any_role(
                user,
                credential.object_ref(),
                &[RoleName::Admin, RoleName::Use, RoleName::Read],
            )
            .await
    }

    async fn can_change(
        &self,
        user: &User,
        obj: &ManagedObject,
        data: &ChangeRequest,
    ) -> Result<bool> {
        let credential = self.credential(obj)?;
        if !self
            .env
            .has_role(user, credential.object_ref(), RoleName::Admin)
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
        let credential = self.credential(obj)?;
        self.env
            .has_role(user, credential.object_ref(), RoleName::Admin)
            .await
    }
}
