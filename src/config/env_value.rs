// ABOUTME: Config values that are either literal or read from an environment variable.
// ABOUTME: Lets config.yml reference the API token without storing it in plain text.

use crate::error::{Error, Result};
use serde::Deserialize;

#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    /// The value, or `None` when the variable is unset, empty, and has no default.
    pub fn lookup(&self) -> Option<String> {
        match self {
            EnvValue::Literal(s) => Some(s.clone()).filter(|s| !s.is_empty()),
            EnvValue::FromEnv { var, default } => std::env::var(var)
                .ok()
                .filter(|v| !v.is_empty())
                .or_else(|| default.clone()),
        }
    }

    /// Like [`EnvValue::lookup`] but a missing value is an error.
    pub fn resolve(&self) -> Result<String> {
        self.lookup().ok_or_else(|| match self {
            EnvValue::FromEnv { var, .. } => Error::MissingEnvVar(var.clone()),
            EnvValue::Literal(_) => Error::InvalidConfig("empty value".to_string()),
        })
    }
}

// Literal values are usually secrets.
impl std::fmt::Debug for EnvValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvValue::Literal(_) => f.write_str("Literal(<redacted>)"),
            EnvValue::FromEnv { var, .. } => f.debug_struct("FromEnv").field("var", var).finish(),
        }
    }
}
