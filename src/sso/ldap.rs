//! LDAP configuration fields

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

lazy_static::lazy_static! {
    // One RDN: attribute type (name or OID) = value without unescaped separators.
    static ref RDN_REGEX: regex::Regex =
        regex::Regex::new(r"^([A-Za-z][A-Za-z0-9-]*|[0-9]+(\.[0-9]+)*)=[^,+]+$").unwrap();
    // Simplest filter form: (attr=value)
    static ref SIMPLE_FILTER_REGEX: regex::Regex =
        regex::Regex::new(r"^\([A-Za-z0-9-]+?=[^()]+?\)$").unwrap();
    // Composite filter form: (&(..)(..)), (|(..)), (!(..))
    static ref COMPOSITE_FILTER_REGEX: regex::Regex =
        regex::Regex::new(r"^\([&|!]\(.*\)\)$").unwrap();
}

/// Placeholder substituted with the login name at bind time.
pub const USER_PLACEHOLDER: &str = "%(user)s";

fn substitute_user(value: &str, with_user: bool) -> Result<String> {
    if with_user {
        if !value.contains(USER_PLACEHOLDER) {
            return Err(AppError::Validation(format!(
                "value must contain '{USER_PLACEHOLDER}' placeholder: {value}"
            )));
        }
        Ok(value.replace(USER_PLACEHOLDER, "user"))
    } else {
        Ok(value.to_string())
    }
}

/// Validate a distinguished name, e.g. `cn=admins,ou=groups,dc=example,dc=org`.
pub fn validate_ldap_dn(value: &str) -> Result<()> {
    let invalid = || AppError::Validation(format!("invalid DN: {value}"));
    if value.is_empty() {
        return Err(invalid());
    }
    for rdn in value.split(',') {
        for component in rdn.split('+') {
            if !RDN_REGEX.is_match(component.trim()) {
                return Err(invalid());
            }
        }
    }
    Ok(())
}

/// Validate a DN template containing the user placeholder.
pub fn validate_ldap_dn_with_user(value: &str) -> Result<()> {
    validate_ldap_dn(&substitute_user(value, true)?)
}

fn validate_filter_inner(value: &str) -> Result<()> {
    let value = value.trim();
    if SIMPLE_FILTER_REGEX.is_match(value) {
        return Ok(());
    }
    if COMPOSITE_FILTER_REGEX.is_match(value) {
        for part in value[2..value.len() - 1].split(")(") {
            let part = format!(
                "({})",
                part.trim_start_matches('(').trim_end_matches(')')
            );
            validate_filter_inner(&part)?;
        }
        return Ok(());
    }
    Err(AppError::Validation(format!("invalid LDAP filter: {value}")))
}

/// Validate an LDAP search filter, e.g. `(objectClass=posixAccount)`.
pub fn validate_ldap_filter(value: &str) -> Result<()> {
    validate_filter_inner(&substitute_user(value, false)?)
}

/// Validate a search filter containing the user placeholder.
pub fn validate_ldap_filter_with_user(value: &str) -> Result<()> {
    validate_filter_inner(&substitute_user(value, true)?)
}

/// Validate a server URI list: one or more `ldap://` / `ldaps://` URIs
/// separated by commas or spaces. Plain hostnames are allowed.
pub fn validate_ldap_server_uri(value: &str) -> Result<()> {
    let mut seen = false;
    for uri in value.split([',', ' ']).filter(|part| !part.is_empty()) {
        seen = true;
        let parsed = Url::parse(uri)
            .map_err(|err| AppError::Validation(format!("invalid LDAP URI '{uri}': {err}")))?;
        if !matches!(parsed.scheme(), "ldap" | "ldaps") {
            return Err(AppError::Validation(format!(
                "LDAP URI '{uri}' must use the ldap or ldaps scheme"
            )));
        }
    }
    if !seen {
        return Err(AppError::Validation("no LDAP server URI given".to_string()));
    }
    Ok(())
}

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LdapScope {
    #[serde(rename = "SCOPE_BASE")]
    Base,
    #[serde(rename = "SCOPE_ONELEVEL")]
    OneLevel,
    #[serde(rename = "SCOPE_SUBTREE")]
    Subtree,
}

impl std::str::FromStr for LdapScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "SCOPE_BASE" => Ok(Self::Base),
            "SCOPE_ONELEVEL" => Ok(Self::OneLevel),
            "SCOPE_SUBTREE" => Ok(Self::Subtree),
            _ => Err(AppError::Validation(format!(
                "unknown LDAP scope '{value}'"
            ))),
        }
    }
}

/// One LDAP search: `[base_dn, scope, filter]` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LdapSearch {
    pub base_dn: String,
    pub scope: LdapScope,
    pub filter: String,
}

impl LdapSearch {
    /// Parse the three-element array form. An empty array means "search not
    /// configured". `with_user` requires the user placeholder in the filter.
    pub fn parse(value: &Value, with_user: bool) -> Result<Option<Self>> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(AppError::Validation(format!(
                    "expected a search triple, got {other}"
                )))
            }
        };
        if items.is_empty() {
            return Ok(None);
        }
        if items.len() != 3 {
            return Err(AppError::Validation(format!(
                "expected a list of three items but got {} instead",
                items.len()
            )));
        }
        let as_str = |value: &Value, what: &str| -> Result<String> {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation(format!("search {what} must be a string")))
        };
        let base_dn = as_str(&items[0], "base DN")?;
        validate_ldap_dn(&base_dn)?;
        let scope: LdapScope = as_str(&items[1], "scope")?.parse()?;
        let filter = as_str(&items[2], "filter")?;
        if with_user {
            validate_ldap_filter_with_user(&filter)?;
        } else {
            validate_ldap_filter(&filter)?;
        }
        Ok(Some(Self {
            base_dn,
            scope,
            filter,
        }))
    }
}

/// Several user searches tried in order: either one triple or a list of
/// triples on the wire. Filters must carry the user placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LdapSearchUnion {
    pub searches: Vec<LdapSearch>,
}

impl LdapSearchUnion {
    pub fn parse(value: &Value) -> Result<Option<Self>> {
        let items = match value {
            Value::Array(items) => items,
            other => {
                return Err(AppError::Validation(format!(
                    "expected a search or list of searches, got {other}"
                )))
            }
        };
        if items.is_empty() {
            return Ok(None);
        }
        if items.len() == 3 && items[0].is_string() {
            let search = LdapSearch::parse(value, true)?;
            return Ok(search.map(|s| Self { searches: vec![s] }));
        }
        let mut searches = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            if !item.is_array() {
                return Err(AppError::Validation(format!(
                    "union element no. {} must be a search query array",
                    index + 1
                )));
            }
            let search = LdapSearch::parse(item, true)?.ok_or_else(|| {
                AppError::Validation(format!("union element no. {} is empty", index + 1))
            })?;
            searches.push(search);
        }
        Ok(Some(Self { searches }))
    }
}

/// Mapping of user model fields to LDAP attributes. Only name and email
/// fields may be populated from the directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LdapUserAttrMap(pub BTreeMap<String, String>);

impl LdapUserAttrMap {
    const VALID_ATTRS: [&'static str; 3] = ["first_name", "last_name", "email"];

    pub fn validate(&self) -> Result<()> {
        for key in self.0.keys() {
            if !Self::VALID_ATTRS.contains(&key.as_str()) {
                return Err(AppError::Validation(format!(
                    "invalid user attribute '{key}'"
                )));
            }
        }
        Ok(())
    }
}

/// Mapping of user flags to the DN of the group conferring them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LdapUserFlags(pub BTreeMap<String, String>);

impl LdapUserFlags {
    const VALID_FLAGS: [&'static str; 2] = ["is_superuser", "is_system_auditor"];

    pub fn validate(&self) -> Result<()> {
        for (key, dn) in &self.0 {
            if !Self::VALID_FLAGS.contains(&key.as_str()) {
                return Err(AppError::Validation(format!("invalid user flag '{key}'")));
            }
            validate_ldap_dn(dn)?;
        }
        Ok(())
    }
}

/// Membership selector used in organization/team maps: everyone (or no one),
/// one group DN, or several group DNs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LdapDnMap {
    Everyone(bool),
    Dn(String),
    Dns(Vec<String>),
}

impl LdapDnMap {
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Everyone(_) => Ok(()),
            Self::Dn(dn) => validate_ldap_dn(dn),
            Self::Dns(dns) => {
                for dn in dns {
                    validate_ldap_dn(dn)?;
                }
                Ok(())
            }
        }
    }
}

/// Per-organization membership rules keyed by organization name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LdapOrganizationMap(pub BTreeMap<String, LdapOrganizationMapEntry>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdapOrganizationMapEntry {
    #[serde(default)]
    pub admins: Option<LdapDnMap>,
    #[serde(default)]
    pub users: Option<LdapDnMap>,
    #[serde(default)]
    pub remove_admins: bool,
    #[serde(default)]
    pub remove_users: bool,
}

impl LdapOrganizationMap {
    pub fn validate(&self) -> Result<()> {
        for entry in self.0.values() {
            if let Some(admins) = &entry.admins {
                admins.validate()?;
            }
            if let Some(users) = &entry.users {
                users.validate()?;
            }
        }
        Ok(())
    }
}

/// Per-team membership rules keyed by team name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LdapTeamMap(pub BTreeMap<String, LdapTeamMapEntry>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdapTeamMapEntry {
    /// Name of the organization the team belongs to.
    pub organization: String,
    #[serde(default)]
    pub users: Option<LdapDnMap>,
    #[serde(default)]
    pub remove: bool,
}

impl LdapTeamMap {
    pub fn validate(&self) -> Result<()> {
        for entry in self.0.values() {
            if let Some(users) = &entry.users {
                users.validate()?;
            }
        }
        Ok(())
    }
}

/// Connection options forwarded to the LDAP client, by option name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LdapConnectionOptions(pub BTreeMap<String, Value>);

impl LdapConnectionOptions {
    const VALID_OPTIONS: [&'static str; 6] = [
        "OPT_NETWORK_TIMEOUT",
        "OPT_PROTOCOL_VERSION",
        "OPT_REFERRALS",
        "OPT_TIMEOUT",
        "OPT_X_TLS_NEWCTX",
        "OPT_X_TLS_REQUIRE_CERT",
    ];

    pub fn validate(&self) -> Result<()> {
        for key in self.0.keys() {
            if !Self::VALID_OPTIONS.contains(&key.as_str()) {
                return Err(AppError::Validation(format!(
                    "invalid connection option '{key}'"
                )));
            }
        }
        Ok(())
    }
}

/// Strategy for reading group membership out of the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LdapGroupType {
    MemberDnGroupType,
    NestedMemberDnGroupType,
    GroupOfNamesType,
    NestedGroupOfNamesType,
    ActiveDirectoryGroupType,
    NestedActiveDirectoryGroupType,
    OrganizationalRoleGroupType,
    NestedOrganizationalRoleGroupType,
    PosixGroupType,
    PosixUidGroupType,
}

impl LdapGroupType {
    /// Constructor parameters the selected group type accepts.
    pub fn allowed_params(&self) -> &'static [&'static str] {
        match self {
            Self::MemberDnGroupType
            | Self::NestedMemberDnGroupType
            | Self::ActiveDirectoryGroupType
            | Self::NestedActiveDirectoryGroupType
            | Self::OrganizationalRoleGroupType
            | Self::NestedOrganizationalRoleGroupType => &["member_attr", "name_attr"],
            Self::GroupOfNamesType | Self::NestedGroupOfNamesType | Self::PosixGroupType => {
                &["name_attr"]
            }
            Self::PosixUidGroupType => &["ldap_group_user_attr", "name_attr"],
        }
    }
}

/// Validate group-type parameters against the selected group type.
///
/// The selected type is an explicit argument; the caller resolves it from the
/// submitted payload or the stored setting.
pub fn validate_group_type_params(
    group_type: LdapGroupType,
    params: &BTreeMap<String, Value>,
) -> Result<()> {
    let allowed = group_type.allowed_params();
    for key in params.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(AppError::Validation(format!(
                "invalid group type parameter '{key}'"
            )));
        }
    }
    Ok(())
}
