//! Configuration-field validation for external authentication providers.
//!
//! These types normalize and validate the nested provider configuration
//! submitted through the settings API (LDAP searches, SAML IdP metadata,
//! social-login attribute maps). Validation only: protocol exchange is the
//! job of the authentication services. Anything a validator depends on is
//! passed in explicitly; nothing here reads ambient settings.

pub mod ldap;
pub mod saml;
pub mod social;

use crate::store::LicenseFeature;
use std::collections::{BTreeSet, HashSet};

/// External authentication backends the platform can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthBackend {
    Local,
    Ldap,
    Radius,
    GoogleOauth2,
    GithubOauth2,
    GithubOrgOauth2,
    GithubTeamOauth2,
    AzureAdOauth2,
    Saml,
}

impl AuthBackend {
    pub const ALL: [AuthBackend; 9] = [
        AuthBackend::Local,
        AuthBackend::Ldap,
        AuthBackend::Radius,
        AuthBackend::GoogleOauth2,
        AuthBackend::GithubOauth2,
        AuthBackend::GithubOrgOauth2,
        AuthBackend::GithubTeamOauth2,
        AuthBackend::AzureAdOauth2,
        AuthBackend::Saml,
    ];

    /// Settings that must be defined and non-empty before the backend can be
    /// offered for login.
    pub fn required_settings(&self) -> &'static [&'static str] {
        match self {
            Self::Local => &[],
            Self::Ldap => &["ldap_server_uri"],
            Self::Radius => &["radius_server"],
            Self::GoogleOauth2 => &["social_google_oauth2_key", "social_google_oauth2_secret"],
            Self::GithubOauth2 => &["social_github_key", "social_github_secret"],
            Self::GithubOrgOauth2 => &[
                "social_github_org_key",
                "social_github_org_secret",
                "social_github_org_name",
            ],
            Self::GithubTeamOauth2 => &[
                "social_github_team_key",
                "social_github_team_secret",
                "social_github_team_id",
            ],
            Self::AzureAdOauth2 => &["social_azuread_oauth2_key", "social_azuread_oauth2_secret"],
            Self::Saml => &[
                "saml_sp_entity_id",
                "saml_sp_public_cert",
                "saml_sp_private_key",
                "saml_org_info",
                "saml_technical_contact",
                "saml_support_contact",
                "saml_enabled_idps",
            ],
        }
    }

    /// License feature the backend is gated on, if any.
    pub fn required_feature(&self) -> Option<LicenseFeature> {
        match self {
            Self::Ldap => Some(LicenseFeature::Ldap),
            Self::Radius | Self::Saml => Some(LicenseFeature::EnterpriseAuth),
            _ => None,
        }
    }
}

/// Filter the authentication backends down to those whose required settings
/// are all configured and whose license feature (if any) is enabled.
pub fn enabled_backends(
    configured: &BTreeSet<String>,
    features: &HashSet<LicenseFeature>,
) -> Vec<AuthBackend> {
    AuthBackend::ALL
        .iter()
        .copied()
        .filter(|backend| {
            if let Some(feature) = backend.required_feature() {
                if !features.contains(&feature) {
                    return false;
                }
            }
            backend
                .required_settings()
                .iter()
                .all(|setting| configured.contains(*setting))
        })
        .collect()
}
