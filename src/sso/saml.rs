//! SAML configuration fields

use crate::error::{AppError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;
use validator::Validate;

lazy_static::lazy_static! {
    // Language codes keying the org-info map: "en", "en-us", ...
    static ref LANG_CODE_REGEX: regex::Regex =
        regex::Regex::new(r"(?i)^[a-z]{2}(-[a-z]{2})?$").unwrap();
    static ref PEM_CERT_REGEX: regex::Regex = regex::Regex::new(
        r"-----BEGIN CERTIFICATE-----(?s)(.+?)-----END CERTIFICATE-----"
    ).unwrap();
}

/// Validate a PEM certificate blob: at least one certificate block whose
/// body is well-formed base64.
pub fn validate_certificate(value: &str) -> Result<()> {
    let mut blocks = 0;
    for capture in PEM_CERT_REGEX.captures_iter(value) {
        blocks += 1;
        let body: String = capture[1].split_whitespace().collect();
        base64::engine::general_purpose::STANDARD
            .decode(body.as_bytes())
            .map_err(|err| {
                AppError::Validation(format!("invalid certificate body: {err}"))
            })?;
    }
    if blocks == 0 {
        return Err(AppError::Validation(
            "no PEM certificate block found".to_string(),
        ));
    }
    Ok(())
}

fn validate_url_field(value: &str, what: &str) -> Result<()> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|err| AppError::Validation(format!("invalid {what} URL '{value}': {err}")))
}

/// One language's service-provider organization info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamlOrgInfoEntry {
    pub name: String,
    pub displayname: String,
    pub url: String,
    /// Unknown keys are preserved, not rejected.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Service-provider organization info keyed by language code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamlOrgInfo(pub BTreeMap<String, SamlOrgInfoEntry>);

impl SamlOrgInfo {
    pub fn validate(&self) -> Result<()> {
        for (lang, entry) in &self.0 {
            if !LANG_CODE_REGEX.is_match(lang) {
                return Err(AppError::Validation(format!(
                    "invalid language code '{lang}' for org info"
                )));
            }
            validate_url_field(&entry.url, "org info")?;
        }
        Ok(())
    }
}

/// Technical or support contact advertised in SP metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SamlContact {
    #[serde(rename = "givenName")]
    #[validate(length(min = 1))]
    pub given_name: String,
    #[serde(rename = "emailAddress")]
    #[validate(email)]
    pub email_address: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One identity provider the platform will accept assertions from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamlIdp {
    pub entity_id: String,
    pub url: String,
    pub x509cert: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_user_permanent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_email: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SamlIdp {
    pub fn validate(&self) -> Result<()> {
        if self.entity_id.is_empty() {
            return Err(AppError::Validation("IdP entity_id is required".to_string()));
        }
        validate_url_field(&self.url, "IdP")?;
        validate_certificate(&self.x509cert)
    }
}

/// Enabled identity providers keyed by short name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SamlEnabledIdps(pub BTreeMap<String, SamlIdp>);

impl SamlEnabledIdps {
    pub fn validate(&self) -> Result<()> {
        for idp in self.0.values() {
            idp.validate()?;
        }
        Ok(())
    }
}

/// Signature/encryption knobs forwarded to the SAML library. All optional;
/// unknown keys are preserved for forward compatibility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamlSecurityConfig {
    #[serde(rename = "nameIdEncrypted", default, skip_serializing_if = "Option::is_none")]
    pub name_id_encrypted: Option<bool>,
    #[serde(rename = "authnRequestsSigned", default, skip_serializing_if = "Option::is_none")]
    pub authn_requests_signed: Option<bool>,
    #[serde(rename = "logoutRequestSigned", default, skip_serializing_if = "Option::is_none")]
    pub logout_request_signed: Option<bool>,
    #[serde(rename = "logoutResponseSigned", default, skip_serializing_if = "Option::is_none")]
    pub logout_response_signed: Option<bool>,
    #[serde(rename = "signMetadata", default, skip_serializing_if = "Option::is_none")]
    pub sign_metadata: Option<bool>,
    #[serde(rename = "wantMessagesSigned", default, skip_serializing_if = "Option::is_none")]
    pub want_messages_signed: Option<bool>,
    #[serde(rename = "wantAssertionsSigned", default, skip_serializing_if = "Option::is_none")]
    pub want_assertions_signed: Option<bool>,
    #[serde(rename = "wantAssertionsEncrypted", default, skip_serializing_if = "Option::is_none")]
    pub want_assertions_encrypted: Option<bool>,
    #[serde(rename = "signatureAlgorithm", default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(rename = "digestAlgorithm", default, skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
