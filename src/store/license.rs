//! License/feature-gate collaborator

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Platform features that individual checks may be gated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseFeature {
    SystemTracking,
    MultipleOrganizations,
    Ldap,
    EnterpriseAuth,
    Surveys,
}

impl LicenseFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SystemTracking => "system_tracking",
            Self::MultipleOrganizations => "multiple_organizations",
            Self::Ldap => "ldap",
            Self::EnterpriseAuth => "enterprise_auth",
            Self::Surveys => "surveys",
        }
    }
}

/// Boundary to the licensing subsystem.
///
/// A failed check is fatal to the specific decision being evaluated,
/// independent of role state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LicenseGate: Send + Sync {
    async fn check_feature(&self, feature: LicenseFeature) -> Result<()>;
}

/// Fixed feature set, for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct StaticLicense {
    features: HashSet<LicenseFeature>,
}

impl StaticLicense {
    pub fn with_features(features: impl IntoIterator<Item = LicenseFeature>) -> Self {
        Self {
            features: features.into_iter().collect(),
        }
    }

    /// Every feature enabled.
    pub fn unrestricted() -> Self {
        Self::with_features([
            LicenseFeature::SystemTracking,
            LicenseFeature::MultipleOrganizations,
            LicenseFeature::Ldap,
            LicenseFeature::EnterpriseAuth,
            LicenseFeature::Surveys,
        ])
    }
}

#[async_trait]
impl LicenseGate for StaticLicense {
    async fn check_feature(&self, feature: LicenseFeature) -> Result<()> {
        if self.features.contains(&feature) {
            Ok(())
        } else {
            Err(AppError::License(format!(
                "feature '{}' is not enabled by the active license",
                feature.as_str()
            )))
        }
    }
}
