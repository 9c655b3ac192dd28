//! Collaborator boundaries: role membership, object resolution, licensing

pub mod license;
pub mod object;
pub mod role;

pub use license::{LicenseFeature, LicenseGate, StaticLicense};
pub use object::{ObjectCatalog, ObjectStore};
pub use role::{RoleGraph, RoleStore};

#[cfg(test)]
pub use license::MockLicenseGate;
#[cfg(test)]
pub use object::MockObjectStore;
#[cfg(test)]
pub use role::MockRoleStore;
