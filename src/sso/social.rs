//! Social-login mapping fields and RADIUS settings

use crate::error::{AppError, Result};
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

lazy_static::lazy_static! {
    // Regex-literal spelling accepted in map values: /pattern/ with optional
    // i and m flags.
    static ref REGEX_LITERAL: regex::Regex =
        regex::Regex::new(r"^/(?P<pattern>.*)/(?P<flags>[im]+)?$").unwrap();
}

/// Selector deciding which logins a map entry applies to: everyone (or no
/// one), a literal value, a `/regex/` literal, or a list of those.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SocialMapSpec {
    Everyone(bool),
    Text(String),
    List(Vec<SocialMapSpec>),
}

/// Compiled form of a [`SocialMapSpec`], ready to match login identifiers.
#[derive(Debug, Clone)]
pub enum SocialMapMatcher {
    Everyone(bool),
    Exact(String),
    Pattern(regex::Regex),
    Any(Vec<SocialMapMatcher>),
}

impl SocialMapSpec {
    /// Compile the selector, rejecting nested lists and malformed regex
    /// literals.
    pub fn compile(&self) -> Result<SocialMapMatcher> {
        self.compile_inner(false)
    }

    fn compile_inner(&self, nested: bool) -> Result<SocialMapMatcher> {
        match self {
            Self::Everyone(flag) => Ok(SocialMapMatcher::Everyone(*flag)),
            Self::Text(raw) => compile_text(raw),
            Self::List(items) => {
                if nested {
                    return Err(AppError::Validation(
                        "nested lists are not allowed in social maps".to_string(),
                    ));
                }
                let matchers = items
                    .iter()
                    .map(|item| item.compile_inner(true))
                    .collect::<Result<Vec<_>>>()?;
                Ok(SocialMapMatcher::Any(matchers))
            }
        }
    }
}

fn compile_text(raw: &str) -> Result<SocialMapMatcher> {
    let Some(capture) = REGEX_LITERAL.captures(raw) else {
        return Ok(SocialMapMatcher::Exact(raw.to_string()));
    };
    let flags = capture.name("flags").map(|m| m.as_str()).unwrap_or("");
    let pattern = RegexBuilder::new(&capture["pattern"])
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .build()
        .map_err(|err| AppError::Validation(format!("invalid map pattern '{raw}': {err}")))?;
    Ok(SocialMapMatcher::Pattern(pattern))
}

impl SocialMapMatcher {
    /// Does the login identifier (usually an email address) match?
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Everyone(flag) => *flag,
            Self::Exact(expected) => expected == value,
            Self::Pattern(pattern) => pattern.is_match(value),
            Self::Any(matchers) => matchers.iter().any(|m| m.matches(value)),
        }
    }
}

/// Per-organization membership rules for social logins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocialOrganizationMap(pub BTreeMap<String, SocialOrganizationMapEntry>);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocialOrganizationMapEntry {
    #[serde(default)]
    pub admins: Option<SocialMapSpec>,
    #[serde(default)]
    pub users: Option<SocialMapSpec>,
    #[serde(default)]
    pub remove_admins: bool,
    #[serde(default)]
    pub remove_users: bool,
}

impl SocialOrganizationMap {
    pub fn validate(&self) -> Result<()> {
        for entry in self.0.values() {
            if let Some(admins) = &entry.admins {
                admins.compile()?;
            }
            if let Some(users) = &entry.users {
                users.compile()?;
            }
        }
        Ok(())
    }
}

/// Per-team membership rules for social logins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocialTeamMap(pub BTreeMap<String, SocialTeamMapEntry>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SocialTeamMapEntry {
    /// Name of the organization the team belongs to.
    pub organization: String,
    #[serde(default)]
    pub users: Option<SocialMapSpec>,
    #[serde(default)]
    pub remove: bool,
}

impl SocialTeamMap {
    pub fn validate(&self) -> Result<()> {
        for entry in self.0.values() {
            if let Some(users) = &entry.users {
                users.compile()?;
            }
        }
        Ok(())
    }
}

fn default_radius_port() -> u16 {
    1812
}

/// RADIUS server settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct RadiusSettings {
    #[validate(length(min = 1, max = 255))]
    pub server: String,
    #[serde(default = "default_radius_port")]
    pub port: u16,
    #[validate(length(min = 1))]
    pub secret: String,
}
