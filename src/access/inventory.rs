//! Inventory access policy

use super::{diff, AccessEnv, ObjectPolicy};
use crate::domain::{ChangeRequest, Inventory, ManagedObject, ObjectKind, RoleName, User};
use crate::error::{AppError, Result};

/// Policy for host inventories. Inventories always belong to an
/// organization, and creating one is an organization-admin action.
pub struct InventoryAccess {
    env: AccessEnv,
}

impl InventoryAccess {
    pub fn new(env: AccessEnv) -> Self {
        Self { env }
    }

    fn inventory<'a>(&self, obj: &'a ManagedObject) -> Result<&'a Inventory> {
        match obj {
            ManagedObject::Inventory(inv) => Ok(inv),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "inventory policy dispatched for {}",
                other.kind()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ObjectPolicy for InventoryAccess {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Inventory
    }

    async fn can_add(&self, user: &User, data: &ChangeRequest) -> Result<bool> {
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
        let inventory = self.inventory(obj)?;
        self.env
            .has_any_role(
                user,
                inventory.object_ref(),
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
        let inventory = self.inventory(obj)?;
        if !self
            .env
            .has_role(user, inventory.object_ref(), RoleName::Admin)
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
        let inventory = self.inventory(obj)?;
        self.env
            .has_role(user, inventory.object_ref(), RoleName::Admin)
            .await
    }
}
