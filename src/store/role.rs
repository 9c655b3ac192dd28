//! Role-membership collaborator

use crate::domain::{ObjectRef, RoleId, RoleName, User};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::RwLock;

/// Boundary to the role subsystem.
///
/// The access layer only needs two operations: resolve a named role slot on
/// an object, and test membership. Membership must honor inheritance: a
/// user holding a role that implies this one is a member.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// Resolve the named role owned by the given object.
    ///
    /// `Ok(None)` when the object has no such role slot; callers treat that
    /// as non-membership, never as an error.
    async fn role_for(&self, owner: &ObjectRef, name: RoleName) -> Result<Option<RoleId>>;

    /// Membership test for one role, honoring parent-role inheritance.
    async fn is_member(&self, role: RoleId, user: &User) -> Result<bool>;
}

#[derive(Debug, Clone)]
struct RoleEntry {
    owner: ObjectRef,
    name: RoleName,
    /// Roles that imply this one (e.g. an organization admin role implies a
    /// project admin role).
    implied_by: Vec<RoleId>,
    members: HashSet<crate::domain::ObjectId>,
}

#[derive(Debug, Clone)]
struct Grant {
    user_id: crate::domain::ObjectId,
    role_id: RoleId,
    granted_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct GraphInner {
    roles: HashMap<RoleId, RoleEntry>,
    by_owner: HashMap<(ObjectRef, RoleName), RoleId>,
    grants: Vec<Grant>,
}

/// In-memory role graph: the reference `RoleStore` implementation.
///
/// Covers both membership variants behind the trait: direct grants and
/// grants inherited through parent roles. Production deployments back this
/// boundary with the platform's role service instead.
#[derive(Debug, Default)]
pub struct RoleGraph {
    inner: RwLock<GraphInner>,
}

impl RoleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a role slot on an object, returning its id.
    pub fn create_role(&self, owner: ObjectRef, name: RoleName) -> RoleId {
        let mut inner = self.inner.write().expect("role graph lock poisoned");
        if let Some(existing) = inner.by_owner.get(&(owner, name)) {
            return *existing;
        }
        let id = RoleId::new();
        inner.roles.insert(
            id,
            RoleEntry {
                owner,
                name,
                implied_by: Vec::new(),
                members: HashSet::new(),
            },
        );
        inner.by_owner.insert((owner, name), id);
        id
    }

    /// Record that holding `parent` implies holding `child`.
    pub fn add_parent(&self, child: RoleId, parent: RoleId) {
        let mut inner = self.inner.write().expect("role graph lock poisoned");
        if let Some(entry) = inner.roles.get_mut(&child) {
            if !entry.implied_by.contains(&parent) {
                entry.implied_by.push(parent);
            }
        }
    }

    /// Grant a role directly to a user.
    pub fn grant(&self, role_id: RoleId, user: &User) {
        let mut inner = self.inner.write().expect("role graph lock poisoned");
        if let Some(entry) = inner.roles.get_mut(&role_id) {
            entry.members.insert(user.id);
            inner.grants.push(Grant {
                user_id: user.id,
                role_id,
                granted_at: Utc::now(),
            });
        }
    }

    /// Revoke a direct grant.
    pub fn revoke(&self, role_id: RoleId, user: &User) {
        let mut inner = self.inner.write().expect("role graph lock poisoned");
        if let Some(entry) = inner.roles.get_mut(&role_id) {
            entry.members.remove(&user.id);
        }
        inner
            .grants
            .retain(|g| !(g.role_id == role_id && g.user_id == user.id));
    }

    /// When the user was first granted the role directly, if ever.
    pub fn granted_at(&self, role_id: RoleId, user: &User) -> Option<DateTime<Utc>> {
        let inner = self.inner.read().expect("role graph lock poisoned");
        inner
            .grants
            .iter()
            .find(|g| g.role_id == role_id && g.user_id == user.id)
            .map(|g| g.granted_at)
    }

    fn walk_membership(&self, role_id: RoleId, user: &User) -> bool {
        let inner = self.inner.read().expect("role graph lock poisoned");
        let mut queue: VecDeque<RoleId> = VecDeque::from([role_id]);
        let mut visited: HashSet<RoleId> = HashSet::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(entry) = inner.roles.get(&current) else {
                continue;
            };
            if entry.members.contains(&user.id) {
                return true;
            }
            for parent in &entry.implied_by {
                if !visited.contains(parent) {
                    queue.push_back(*parent);
                }
            }
        }
        false
    }
}

#[async_trait]
impl RoleStore for RoleGraph {
    async fn role_for(&self, owner: &ObjectRef, name: RoleName) -> Result<Option<RoleId>> {
        let inner = self.inner.read().expect("role graph lock poisoned");
        Ok(inner.by_owner.get(&(*owner, name)).copied())
    }

    async fn is_member(&self, role: RoleId, user: &User) -> Result<bool> {
        Ok(self.walk_membership(role, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ObjectId, ObjectKind};

    fn obj(kind: ObjectKind) -> ObjectRef {
        ObjectRef::new(kind, ObjectId::new())
    }

    #[tokio::test]
    async fn test_direct_membership() {
        let graph = RoleGraph::new();
        let user = User::new("alice");
        let project = obj(ObjectKind::Project);
        let admin = graph.create_role(project, RoleName::Admin);

        assert!(!graph.is_member(admin, &user).await.unwrap());
        graph.grant(admin, &user);
        assert!(graph.is_member(admin, &user).await.unwrap());
        assert!(graph.granted_at(admin, &user).is_some());
    }

    #[tokio::test]
    async fn test_inherited_membership() {
        let graph = RoleGraph::new();
        let user = User::new("bob");
        let org = obj(ObjectKind::Organization);
        let project = obj(ObjectKind::Project);

        let org_admin = graph.create_role(org, RoleName::Admin);
        let project_admin = graph.create_role(project, RoleName::Admin);
        graph.add_parent(project_admin, org_admin);
        graph.grant(org_admin, &user);

        // org admin reaches the project role without a direct grant
        assert!(graph.is_member(project_admin, &user).await.unwrap());
        assert!(!graph.is_member(org_admin, &User::new("carol")).await.unwrap());
    }

    #[tokio::test]
    async fn test_cyclic_graph_terminates() {
        let graph = RoleGraph::new();
        let user = User::new("dave");
        let a = graph.create_role(obj(ObjectKind::Organization), RoleName::Admin);
        let b = graph.create_role(obj(ObjectKind::Project), RoleName::Admin);
        graph.add_parent(a, b);
        graph.add_parent(b, a);

        assert!(!graph.is_member(a, &user).await.unwrap());
    }

    #[tokio::test]
    async fn test_role_for_missing_slot() {
        let graph = RoleGraph::new();
        let inventory = obj(ObjectKind::Inventory);
        assert_eq!(
            graph.role_for(&inventory, RoleName::Use).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_revoke_removes_membership() {
        let graph = RoleGraph::new();
        let user = User::new("erin");
        let cred = obj(ObjectKind::Credential);
        let use_role = graph.create_role(cred, RoleName::Use);
        graph.grant(use_role, &user);
        graph.revoke(use_role, &user);
        assert!(!graph.is_member(use_role, &user).await.unwrap());
        assert!(graph.granted_at(use_role, &user).is_none());
    }

    #[tokio::test]
    async fn test_create_role_is_idempotent() {
        let graph = RoleGraph::new();
        let project = obj(ObjectKind::Project);
        let first = graph.create_role(project, RoleName::Read);
        let second = graph.create_role(project, RoleName::Read);
        assert_eq!(first, second);
    }
}
