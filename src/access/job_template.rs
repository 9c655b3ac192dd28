//! Job template access policy

use super::{diff, AccessEnv, ObjectPolicy};
use crate::domain::{ChangeRequest, JobTemplate, JobType, ManagedObject, ObjectKind, RoleName, User};
use crate::error::{AppError, Result};
use crate::store::LicenseFeature;

const CREDENTIAL_FIELDS: [&str; 3] = ["credential", "cloud_credential", "network_credential"];

/// Policy for job templates.
///
/// Creation requires use rights on every referenced object. Scan templates
/// are license-gated and may omit the machine credential; an organization
/// admin of the inventory's organization may create them without use rights
/// on the project.
pub struct JobTemplateAccess {
    env: AccessEnv,
}

impl JobTemplateAccess {
    pub fn new(env: AccessEnv) -> Self {
        Self { env }
    }

    fn template<'a>(&self, obj: &'a ManagedObject) -> Result<&'a JobTemplate> {
        match obj {
            ManagedObject::JobTemplate(jt) => Ok(jt),
            other => Err(AppError::Internal(anyhow::anyhow!(
                "job template policy dispatched for {}",
                other.kind()
            ))),
        }
    }
}

#[async_trait::async_trait]
impl ObjectPolicy for JobTemplateAccess {
    fn kind(&self) -> ObjectKind {
        ObjectKind::JobTemplate
    }

    async fn can_add(&self, user: &User, data: &ChangeRequest) -> Result<bool> {
        let job_type = match data.string_field("job_type") {
            Some(raw) => Some(raw.parse::<JobType>()?),
            None => None,
        };
        if job_type == Some(JobType::Scan) {
            self.env
                .license
                .check_feature(LicenseFeature::SystemTracking)
                .await?;
        }

        for field in CREDENTIAL_FIELDS {
            if let Some(id) = data.reference(field)? {
                let credential = self.env.resolve_credential(id).await?;
                if !self
                    .env
                    .has_role(user, credential.object_ref(), RoleName::Use)
                    .await?
                {
                    tracing::debug!(user = %user.username, %field, "missing use role on credential");
                    return Ok(false);
                }
            }
        }

        // A machine credential must accompany an explicit non-scan job type.
        // Merged update payloads carry no job_type and impose no presence rule.
        if let Some(jt) = job_type {
            if jt != JobType::Scan && data.reference("credential")?.is_none() {
                return Ok(false);
            }
        }

        let mut inventory = None;
        if let Some(id) = data.reference("inventory")? {
            let inv = self.env.resolve_inventory(id).await?;
            if !self
                .env
                .has_role(user, inv.object_ref(), RoleName::Use)
                .await?
            {
                return Ok(false);
            }
            inventory = Some(inv);
        }

        // Admins of the inventory's organization may create scan templates
        // without use rights on the project.
        if job_type == Some(JobType::Scan) {
            if let Some(org_id) = inventory.as_ref().and_then(|inv| inv.organization_id) {
                let org = self.env.resolve_organization(org_id).await?;
                if self
                    .env
                    .has_role(user, org.object_ref(), RoleName::Admin)
                    .await?
                {
                    return Ok(true);
                }
            }
        }

        match data.reference("project")? {
            Some(id) => {
                let project = self.env.resolve_project(id).await?;
                self.env
                    .has_role(user, project.object_ref(), RoleName::Use)
                    .await
            }
            None => Ok(false),
        }
    }

    async fn can_read(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let jt = self.template(obj)?;
        self.env
            .has_any_role(
                user,
                jt.object_ref(),
                &[RoleName::Admin, RoleName::Execute, RoleName::Read],
            )
            .await
    }

    async fn can_change(
        &self,
        user: &User,
        obj: &ManagedObject,
        data: &ChangeRequest,
    ) -> Result<bool> {
        self.template(obj)?;
        if !self.can_read(user, obj).await? {
            return Ok(false);
        }
        if diff::changes_are_non_sensitive(obj, data) {
            return Ok(true);
        }
        let payload = diff::authorization_payload(obj, data);
        self.can_add(user, &payload).await
    }

    async fn can_delete(&self, user: &User, obj: &ManagedObject) -> Result<bool> {
        let jt = self.template(obj)?;
        self.env
            .has_role(user, jt.object_ref(), RoleName::Admin)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Credential, CredentialKind, Inventory, ObjectId, Project, RoleId};
    use crate::store::{MockLicenseGate, MockObjectStore, MockRoleStore};
    use std::sync::Arc;

    fn template_with_ids() -> JobTemplate {
        JobTemplate {
            id: ObjectId::new(),
            name: "testjt".to_string(),
            job_type: JobType::Run,
            project_id: Some(ObjectId::new()),
            inventory_id: Some(ObjectId::new()),
            credential_id: Some(ObjectId::new()),
            cloud_credential_id: Some(ObjectId::new()),
            network_credential_id: Some(ObjectId::new()),
        }
    }

    fn credential(id: ObjectId, kind: CredentialKind) -> Credential {
        Credential {
            id,
            name: "cred".to_string(),
            kind,
            organization_id: None,
        }
    }

    /// Role store that reports membership of every role it is asked about,
    /// and resolves every slot.
    fn permissive_roles() -> MockRoleStore {
        let mut roles = MockRoleStore::new();
        roles
            .expect_role_for()
            .returning(|_, _| Ok(Some(RoleId::new())));
        roles.expect_is_member().returning(|_, _| Ok(true));
        roles
    }

    /// Changing one reference re-authorizes with the new value for that field
    /// and the current values for every other declared field: each current id
    /// must be looked up, the stale inventory id must not be.
    #[tokio::test]
    async fn test_change_resolves_new_and_current_references() {
        let jt = template_with_ids();
        let new_inventory = ObjectId::new();
        let cur = jt.clone();

        let mut objects = MockObjectStore::new();
        objects
            .expect_find_inventory()
            .withf(move |id| *id == new_inventory)
            .times(1)
            .returning(|id| {
                Ok(Some(Inventory {
                    id,
                    name: "newinv".to_string(),
                    organization_id: None,
                }))
            });
        let project_id = cur.project_id.unwrap();
        objects
            .expect_find_project()
            .withf(move |id| *id == project_id)
            .times(1)
            .returning(|id| {
                Ok(Some(Project {
                    id,
                    name: "testproj".to_string(),
                    organization_id: None,
                    credential_id: None,
                }))
            });
        let current_credentials = [
            cur.credential_id.unwrap(),
            cur.cloud_credential_id.unwrap(),
            cur.network_credential_id.unwrap(),
        ];
        objects
            .expect_find_credential()
            .withf(move |id| current_credentials.contains(id))
            .times(3)
            .returning(|id| Ok(Some(credential(id, CredentialKind::Ssh))));

        let env = AccessEnv::new(
            Arc::new(permissive_roles()),
            Arc::new(objects),
            Arc::new(MockLicenseGate::new()),
        );
        let access = JobTemplateAccess::new(env);

        let mut data = ChangeRequest::new();
        data.insert_reference("inventory", Some(new_inventory));
        let obj = ManagedObject::from(jt);
        let user = User::new("rando");

        assert!(access.can_change(&user, &obj, &data).await.unwrap());
    }

    #[tokio::test]
    async fn test_change_without_reference_edits_skips_resolution() {
        let jt = template_with_ids();
        let mut data = ChangeRequest::new();
        data.insert_reference("inventory", jt.inventory_id);
        data.insert_reference("project", jt.project_id);

        // no object lookups expected at all
        let env = AccessEnv::new(
            Arc::new(permissive_roles()),
            Arc::new(MockObjectStore::new()),
            Arc::new(MockLicenseGate::new()),
        );
        let access = JobTemplateAccess::new(env);
        let obj = ManagedObject::from(jt);
        let user = User::new("rando");

        assert!(access.can_change(&user, &obj, &data).await.unwrap());
    }

    #[tokio::test]
    async fn test_change_denied_when_read_fails() {
        let jt = template_with_ids();
        let mut roles = MockRoleStore::new();
        roles.expect_role_for().returning(|_, _| Ok(None));

        let env = AccessEnv::new(
            Arc::new(roles),
            Arc::new(MockObjectStore::new()),
            Arc::new(MockLicenseGate::new()),
        );
        let access = JobTemplateAccess::new(env);
        let obj = ManagedObject::from(jt);
        let user = User::new("rando");

        assert!(!access
            .can_change(&user, &obj, &ChangeRequest::new())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_add_requires_machine_credential_for_explicit_run_type() {
        let env = AccessEnv::new(
            Arc::new(permissive_roles()),
            Arc::new(MockObjectStore::new()),
            Arc::new(MockLicenseGate::new()),
        );
        let access = JobTemplateAccess::new(env);
        let user = User::new("rando");

        let data =
            ChangeRequest::from_value(serde_json::json!({"job_type": "run"})).unwrap();
        assert!(!access.can_add(&user, &data).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_job_type() {
        let env = AccessEnv::new(
            Arc::new(MockRoleStore::new()),
            Arc::new(MockObjectStore::new()),
            Arc::new(MockLicenseGate::new()),
        );
        let access = JobTemplateAccess::new(env);
        let user = User::new("rando");

        let data =
            ChangeRequest::from_value(serde_json::json!({"job_type": "destroy"})).unwrap();
        let err = access.can_add(&user, &data).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_scan_add_denied_without_license() {
        let mut license = MockLicenseGate::new();
        license
            .expect_check_feature()
            .withf(|f| *f == LicenseFeature::SystemTracking)
            .returning(|_| Err(AppError::License("system tracking unlicensed".into())));

        let env = AccessEnv::new(
            Arc::new(permissive_roles()),
            Arc::new(MockObjectStore::new()),
            Arc::new(license),
        );
        let access = JobTemplateAccess::new(env);
        let user = User::new("rando");

        let data =
            ChangeRequest::from_value(serde_json::json!({"job_type": "scan"})).unwrap();
        let err = access.can_add(&user, &data).await.unwrap_err();
        assert!(matches!(err, AppError::License(_)));
    }
}
