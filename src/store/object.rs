//! Object-resolution collaborator

use crate::domain::{Credential, Inventory, JobTemplate, ObjectId, Organization, Project};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Boundary to persisted object state.
///
/// Lookups return `Ok(None)` for unknown ids; the access layer converts that
/// into a validation failure at its own boundary so that user-supplied ids
/// can never surface as server errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn find_organization(&self, id: ObjectId) -> Result<Option<Organization>>;
    async fn find_project(&self, id: ObjectId) -> Result<Option<Project>>;
    async fn find_inventory(&self, id: ObjectId) -> Result<Option<Inventory>>;
    async fn find_credential(&self, id: ObjectId) -> Result<Option<Credential>>;
    async fn find_job_template(&self, id: ObjectId) -> Result<Option<JobTemplate>>;
}

#[derive(Debug, Default)]
struct CatalogInner {
    organizations: HashMap<ObjectId, Organization>,
    projects: HashMap<ObjectId, Project>,
    inventories: HashMap<ObjectId, Inventory>,
    credentials: HashMap<ObjectId, Credential>,
    job_templates: HashMap<ObjectId, JobTemplate>,
}

/// In-memory `ObjectStore` implementation for tests and dry-runs.
#[derive(Debug, Default)]
pub struct ObjectCatalog {
    inner: RwLock<CatalogInner>,
}

impl ObjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_organization(&self, org: Organization) {
        let mut inner = self.inner.write().expect("object catalog lock poisoned");
        inner.organizations.insert(org.id, org);
    }

    pub fn add_project(&self, project: Project) {
        let mut inner = self.inner.write().expect("object catalog lock poisoned");
        inner.projects.insert(project.id, project);
    }

    pub fn add_inventory(&self, inventory: Inventory) {
        let mut inner = self.inner.write().expect("object catalog lock poisoned");
        inner.inventories.insert(inventory.id, inventory);
    }

    pub fn add_credential(&self, credential: Credential) {
        let mut inner = self.inner.write().expect("object catalog lock poisoned");
        inner.credentials.insert(credential.id, credential);
    }

    pub fn add_job_template(&self, template: JobTemplate) {
        let mut inner = self.inner.write().expect("object catalog lock poisoned");
        inner.job_templates.insert(template.id, template);
    }
}

#[async_trait]
impl ObjectStore for ObjectCatalog {
    async fn find_organization(&self, id: ObjectId) -> Result<Option<Organization>> {
        let inner = self.inner.read().expect("object catalog lock poisoned");
        Ok(inner.organizations.get(&id).cloned())
    }

    async fn find_project(&self, id: ObjectId) -> Result<Option<Project>> {
        let inner = self.inner.read().expect("object catalog lock poisoned");
        Ok(inner.projects.get(&id).cloned())
    }

    async fn find_inventory(&self, id: ObjectId) -> Result<Option<Inventory>> {
        let inner = self.inner.read().expect("object catalog lock poisoned");
        Ok(inner.inventories.get(&id).cloned())
    }

    async fn find_credential(&self, id: ObjectId) -> Result<Option<Credential>> {
        let inner = self.inner.read().expect("object catalog lock poisoned");
        Ok(inner.credentials.get(&id).cloned())
    }

    async fn find_job_template(&self, id: ObjectId) -> Result<Option<JobTemplate>> {
        let inner = self.inner.read().expect("object catalog lock poisoned");
        Ok(inner.job_templates.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CredentialKind;

    #[tokio::test]
    async fn test_catalog_round_trip() {
        let catalog = ObjectCatalog::new();
        let org = Organization {
            id: ObjectId::new(),
            name: "acme".to_string(),
        };
        catalog.add_organization(org.clone());

        let found = catalog.find_organization(org.id).await.unwrap().unwrap();
        assert_eq!(found.name, "acme");
        assert!(catalog
            .find_organization(ObjectId::new())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_catalog_typed_lookup() {
        let catalog = ObjectCatalog::new();
        let cred = Credential {
            id: ObjectId::new(),
            name: "machine key".to_string(),
            kind: CredentialKind::Ssh,
            organization_id: None,
        };
        catalog.add_credential(cred.clone());

        assert!(catalog.find_credential(cred.id).await.unwrap().is_some());
        // same id through a different typed lookup resolves nothing
        assert!(catalog.find_project(cred.id).await.unwrap().is_none());
    }
}
