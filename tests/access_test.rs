//! Access policy scenario tests against the in-memory collaborators

use opshub_access::access::{AccessEnv, AccessRegistry};
use opshub_access::domain::{
    ChangeRequest, Credential, CredentialKind, Inventory, JobTemplate, JobType, ManagedObject,
    ObjectId, ObjectKind, Organization, Project, RoleName, User,
};
use opshub_access::store::{
    LicenseFeature, LicenseGate, ObjectCatalog, RoleGraph, RoleStore, StaticLicense,
};
use serde_json::json;
use std::sync::Arc;

/// A small tenant: one organization owning a project, an inventory, and the
/// credentials referenced by one job template. Role slots follow the usual
/// chains (admin implies use implies read, org admin implies object admin).
struct World {
    roles: Arc<RoleGraph>,
    registry: AccessRegistry,
    organization: Organization,
    project: Project,
    inventory: Inventory,
    machine_credential: Credential,
    cloud_credential: Credential,
    network_credential: Credential,
    job_template: JobTemplate,
}

fn setup_world(license: StaticLicense) -> World {
    let roles = Arc::new(RoleGraph::new());
    let catalog = Arc::new(ObjectCatalog::new());

    let organization = Organization {
        id: ObjectId::new(),
        name: "test-org".to_string(),
    };
    let project = Project {
        id: ObjectId::new(),
        name: "testproj".to_string(),
        organization_id: Some(organization.id),
        credential_id: None,
    };
    let inventory = Inventory {
        id: ObjectId::new(),
        name: "testinv".to_string(),
        organization_id: Some(organization.id),
    };
    let machine_credential = Credential {
        id: ObjectId::new(),
        name: "testcred".to_string(),
        kind: CredentialKind::Ssh,
        organization_id: Some(organization.id),
    };
    let cloud_credential = Credential {
        id: ObjectId::new(),
        name: "testcloudcred".to_string(),
        kind: CredentialKind::Aws,
        organization_id: Some(organization.id),
    };
    let network_credential = Credential {
        id: ObjectId::new(),
        name: "testnetcred".to_string(),
        kind: CredentialKind::Net,
        organization_id: Some(organization.id),
    };
    let job_template = JobTemplate {
        id: ObjectId::new(),
        name: "testjt".to_string(),
        job_type: JobType::Run,
        project_id: Some(project.id),
        inventory_id: Some(inventory.id),
        credential_id: Some(machine_credential.id),
        cloud_credential_id: Some(cloud_credential.id),
        network_credential_id: Some(network_credential.id),
    };

    catalog.add_organization(organization.clone());
    catalog.add_project(project.clone());
    catalog.add_inventory(inventory.clone());
    catalog.add_credential(machine_credential.clone());
    catalog.add_credential(cloud_credential.clone());
    catalog.add_credential(network_credential.clone());
    catalog.add_job_template(job_template.clone());

    let org_admin = roles.create_role(organization.object_ref(), RoleName::Admin);
    roles.create_role(organization.object_ref(), RoleName::Member);
    roles.create_role(organization.object_ref(), RoleName::Auditor);

    // admin implies use implies read on each owned object, and the org admin
    // role sits above every object admin role
    for owner in [
        project.object_ref(),
        inventory.object_ref(),
        machine_credential.object_ref(),
        cloud_credential.object_ref(),
        network_credential.object_ref(),
    ] {
        let admin = roles.create_role(owner, RoleName::Admin);
        let use_role = roles.create_role(owner, RoleName::Use);
        let read = roles.create_role(owner, RoleName::Read);
        roles.add_parent(use_role, admin);
        roles.add_parent(read, use_role);
        roles.add_parent(admin, org_admin);
    }
    let jt_admin = roles.create_role(job_template.object_ref(), RoleName::Admin);
    let jt_execute = roles.create_role(job_template.object_ref(), RoleName::Execute);
    let jt_read = roles.create_role(job_template.object_ref(), RoleName::Read);
    roles.add_parent(jt_execute, jt_admin);
    roles.add_parent(jt_read, jt_execute);
    roles.add_parent(jt_admin, org_admin);

    let env = AccessEnv::new(roles.clone(), catalog.clone(), Arc::new(license));
    let registry = AccessRegistry::new(env);

    World {
        roles,
        registry,
        organization,
        project,
        inventory,
        machine_credential,
        cloud_credential,
        network_credential,
        job_template,
    }
}

async fn grant(world: &World, owner: opshub_access::domain::ObjectRef, name: RoleName, user: &User) {
    let role = world
        .roles
        .role_for(&owner, name)
        .await
        .unwrap()
        .expect("role slot exists");
    world.roles.grant(role, user);
}

/// Grant use rights on every object the template references.
async fn grant_template_use(world: &World, user: &User) {
    grant(world, world.project.object_ref(), RoleName::Use, user).await;
    grant(world, world.inventory.object_ref(), RoleName::Use, user).await;
    grant(world, world.machine_credential.object_ref(), RoleName::Use, user).await;
    grant(world, world.cloud_credential.object_ref(), RoleName::Use, user).await;
    grant(world, world.network_credential.object_ref(), RoleName::Use, user).await;
}

fn template_payload(world: &World) -> ChangeRequest {
    let mut data = ChangeRequest::new();
    data.insert_reference("project", Some(world.project.id));
    data.insert_reference("inventory", Some(world.inventory.id));
    data.insert_reference("credential", Some(world.machine_credential.id));
    data
}

#[tokio::test]
async fn test_superuser_passes_every_check() {
    let world = setup_world(StaticLicense::default());
    let root = User::superuser("root");
    let obj = ManagedObject::from(world.job_template.clone());
    let empty = ChangeRequest::new();

    assert!(world
        .registry
        .can_add(&root, ObjectKind::JobTemplate, &empty)
        .await
        .unwrap());
    assert!(world
        .registry
        .can_add(&root, ObjectKind::Organization, &empty)
        .await
        .unwrap());
    assert!(world.registry.can_read(&root, &obj).await.unwrap());
    assert!(world.registry.can_change(&root, &obj, &empty).await.unwrap());
    assert!(world.registry.can_delete(&root, &obj).await.unwrap());

    // garbage input is irrelevant for superusers
    let garbage = ChangeRequest::from_value(json!({"project": 3.5})).unwrap();
    assert!(world
        .registry
        .can_add(&root, ObjectKind::JobTemplate, &garbage)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_roleless_user_fails_every_check() {
    let world = setup_world(StaticLicense::unrestricted());
    let user = User::new("rando");
    let obj = ManagedObject::from(world.job_template.clone());
    let payload = template_payload(&world);

    assert!(!world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &payload)
        .await
        .unwrap());
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &ChangeRequest::new())
        .await
        .unwrap());
    assert!(!world.registry.can_read(&user, &obj).await.unwrap());
    assert!(!world
        .registry
        .can_change(&user, &obj, &payload)
        .await
        .unwrap());
    assert!(!world.registry.can_delete(&user, &obj).await.unwrap());
}

#[tokio::test]
async fn test_system_auditor_reads_everything_changes_nothing() {
    let world = setup_world(StaticLicense::unrestricted());
    let auditor = User::auditor("watcher");
    let obj = ManagedObject::from(world.job_template.clone());

    assert!(world.registry.can_read(&auditor, &obj).await.unwrap());
    let org = ManagedObject::from(world.organization.clone());
    assert!(world.registry.can_read(&auditor, &org).await.unwrap());

    let mut data = ChangeRequest::new();
    data.insert_reference("inventory", Some(ObjectId::new()));
    assert!(!world
        .registry
        .can_change(&auditor, &obj, &data)
        .await
        .unwrap());
    assert!(!world.registry.can_delete(&auditor, &obj).await.unwrap());
}

#[tokio::test]
async fn test_resubmitting_current_values_needs_only_read() {
    let world = setup_world(StaticLicense::unrestricted());
    let user = User::new("reader");
    grant(&world, world.job_template.object_ref(), RoleName::Read, &user).await;

    let obj = ManagedObject::from(world.job_template.clone());
    let mut echoed = ChangeRequest::new();
    echoed.insert("name", json!(world.job_template.name));
    echoed.insert_reference("project", world.job_template.project_id);
    echoed.insert_reference("inventory", world.job_template.inventory_id);
    echoed.insert_reference("credential", world.job_template.credential_id);
    echoed.insert_reference("cloud_credential", world.job_template.cloud_credential_id);
    echoed.insert_reference("network_credential", world.job_template.network_credential_id);

    // form round-trip with no edits is not a sensitive change
    assert!(world.registry.can_change(&user, &obj, &echoed).await.unwrap());
}

#[tokio::test]
async fn test_changing_inventory_to_unknown_id_is_denied() {
    let world = setup_world(StaticLicense::unrestricted());
    let obj = ManagedObject::from(world.job_template.clone());

    // an inventory the object store has never heard of
    let phantom = Inventory {
        id: ObjectId::new(),
        name: "otherinv".to_string(),
        organization_id: Some(world.organization.id),
    };
    let use_role = world.roles.create_role(phantom.object_ref(), RoleName::Use);

    let mut data = ChangeRequest::new();
    data.insert_reference("inventory", Some(phantom.id));

    let editor = User::new("editor");
    grant(&world, world.job_template.object_ref(), RoleName::Read, &editor).await;
    grant_template_use(&world, &editor).await;
    world.roles.grant(use_role, &editor);

    // full use rights, but the reference does not resolve: denial, not error
    assert!(!world.registry.can_change(&editor, &obj, &data).await.unwrap());
}

#[tokio::test]
async fn test_changing_inventory_allowed_with_full_use_rights() {
    let world = setup_world(StaticLicense::unrestricted());
    let obj = ManagedObject::from(world.job_template.clone());

    // a second inventory in the same organization, present in the store
    let new_inventory = Inventory {
        id: ObjectId::new(),
        name: "otherinv".to_string(),
        organization_id: Some(world.organization.id),
    };
    let env = AccessEnv::new(
        world.roles.clone(),
        {
            let catalog = Arc::new(ObjectCatalog::new());
            catalog.add_organization(world.organization.clone());
            catalog.add_project(world.project.clone());
            catalog.add_inventory(world.inventory.clone());
            catalog.add_inventory(new_inventory.clone());
            catalog.add_credential(world.machine_credential.clone());
            catalog.add_credential(world.cloud_credential.clone());
            catalog.add_credential(world.network_credential.clone());
            catalog.add_job_template(world.job_template.clone());
            catalog
        },
        Arc::new(StaticLicense::unrestricted()),
    );
    let registry = AccessRegistry::new(env);

    let new_use = world
        .roles
        .create_role(new_inventory.object_ref(), RoleName::Use);

    let editor = User::new("editor");
    grant(&world, world.job_template.object_ref(), RoleName::Read, &editor).await;
    grant_template_use(&world, &editor).await;
    world.roles.grant(new_use, &editor);

    let mut data = ChangeRequest::new();
    data.insert_reference("inventory", Some(new_inventory.id));
    assert!(registry.can_change(&editor, &obj, &data).await.unwrap());

    // without use on the current machine credential the merged payload fails
    let partial = User::new("partial");
    grant(&world, world.job_template.object_ref(), RoleName::Read, &partial).await;
    grant(&world, world.project.object_ref(), RoleName::Use, &partial).await;
    grant(&world, world.inventory.object_ref(), RoleName::Use, &partial).await;
    world.roles.grant(new_use, &partial);
    assert!(!registry.can_change(&partial, &obj, &data).await.unwrap());
}

#[tokio::test]
async fn test_add_with_unresolvable_reference_is_denied_not_error() {
    let world = setup_world(StaticLicense::unrestricted());
    let user = User::new("rando");
    grant_template_use(&world, &user).await;

    let mut data = template_payload(&world);
    data.insert_reference("project", Some(ObjectId::new()));
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &data)
        .await
        .unwrap());

    // malformed id values are handled the same way
    let garbage = ChangeRequest::from_value(json!({"project": "definitely-not-a-uuid"})).unwrap();
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &garbage)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_add_with_unrecognized_fields_is_denied_without_error() {
    let world = setup_world(StaticLicense::unrestricted());
    let user = User::new("rando");
    let data = ChangeRequest::from_value(json!({"asdf": "asdf"})).unwrap();
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &data)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_scan_template_without_credential() {
    let world = setup_world(StaticLicense::unrestricted());
    let user = User::new("scanner");
    grant(&world, world.project.object_ref(), RoleName::Use, &user).await;
    grant(&world, world.inventory.object_ref(), RoleName::Use, &user).await;

    let mut data = ChangeRequest::new();
    data.insert_reference("project", Some(world.project.id));
    data.insert_reference("inventory", Some(world.inventory.id));
    data.insert("job_type", json!("scan"));

    // scan templates may omit the machine credential
    assert!(world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &data)
        .await
        .unwrap());

    // a run template with the same payload needs a credential
    let mut run_data = data.clone();
    run_data.insert("job_type", json!("run"));
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &run_data)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_scan_template_denied_without_license() {
    let world = setup_world(StaticLicense::default());
    let user = User::new("scanner");
    grant(&world, world.project.object_ref(), RoleName::Use, &user).await;
    grant(&world, world.inventory.object_ref(), RoleName::Use, &user).await;

    let mut data = ChangeRequest::new();
    data.insert_reference("project", Some(world.project.id));
    data.insert_reference("inventory", Some(world.inventory.id));
    data.insert("job_type", json!("scan"));

    assert!(!world
        .registry
        .can_add(&user, ObjectKind::JobTemplate, &data)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_org_admin_may_create_scan_template_without_project_use() {
    let world = setup_world(StaticLicense::unrestricted());
    let admin = User::new("org-admin");
    grant(&world, world.organization.object_ref(), RoleName::Admin, &admin).await;

    // org admin inherits inventory use through the role graph but holds
    // nothing on the project directly; the scan path allows it anyway
    let mut data = ChangeRequest::new();
    data.insert_reference("inventory", Some(world.inventory.id));
    data.insert("job_type", json!("scan"));

    assert!(world
        .registry
        .can_add(&admin, ObjectKind::JobTemplate, &data)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_inherited_roles_reach_owned_objects() {
    let world = setup_world(StaticLicense::unrestricted());
    let admin = User::new("org-admin");
    grant(&world, world.organization.object_ref(), RoleName::Admin, &admin).await;

    // org admin implies project admin implies use implies read
    let project = ManagedObject::from(world.project.clone());
    assert!(world.registry.can_read(&admin, &project).await.unwrap());
    assert!(world.registry.can_delete(&admin, &project).await.unwrap());

    let template = ManagedObject::from(world.job_template.clone());
    assert!(world.registry.can_read(&admin, &template).await.unwrap());
}

#[tokio::test]
async fn test_organization_creation_reserved_to_superusers() {
    let world = setup_world(StaticLicense::unrestricted());
    let admin = User::new("org-admin");
    grant(&world, world.organization.object_ref(), RoleName::Admin, &admin).await;

    let data = ChangeRequest::from_value(json!({"name": "another-org"})).unwrap();
    assert!(!world
        .registry
        .can_add(&admin, ObjectKind::Organization, &data)
        .await
        .unwrap());

    let root = User::superuser("root");
    assert!(world
        .registry
        .can_add(&root, ObjectKind::Organization, &data)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_credential_creation_targets() {
    let world = setup_world(StaticLicense::unrestricted());
    let user = User::new("rando");

    // a personal credential may only be created for oneself
    let mut personal = ChangeRequest::from_value(json!({"name": "my key"})).unwrap();
    personal.insert_reference("user", Some(user.id));
    assert!(world
        .registry
        .can_add(&user, ObjectKind::Credential, &personal)
        .await
        .unwrap());

    let mut someone_elses = ChangeRequest::new();
    someone_elses.insert_reference("user", Some(ObjectId::new()));
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::Credential, &someone_elses)
        .await
        .unwrap());

    // no target at all is a denial
    let untargeted = ChangeRequest::from_value(json!({"name": "my key"})).unwrap();
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::Credential, &untargeted)
        .await
        .unwrap());

    let mut owned = ChangeRequest::new();
    owned.insert_reference("organization", Some(world.organization.id));
    assert!(!world
        .registry
        .can_add(&user, ObjectKind::Credential, &owned)
        .await
        .unwrap());

    let admin = User::new("org-admin");
    grant(&world, world.organization.object_ref(), RoleName::Admin, &admin).await;
    assert!(world
        .registry
        .can_add(&admin, ObjectKind::Credential, &owned)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_license_gate_checked_before_role_state() {
    // organization creation is license-gated even for org admins
    let world = setup_world(StaticLicense::default());
    let admin = User::new("org-admin");
    grant(&world, world.organization.object_ref(), RoleName::Admin, &admin).await;

    let data = ChangeRequest::from_value(json!({"name": "second-org"})).unwrap();
    assert!(!world
        .registry
        .can_add(&admin, ObjectKind::Organization, &data)
        .await
        .unwrap());

    // the gate itself reports a license failure when asked directly
    let license = StaticLicense::default();
    assert!(license
        .check_feature(LicenseFeature::MultipleOrganizations)
        .await
        .is_err());
}
