// ABOUTME: Application-wide error type for edgeship.
// ABOUTME: Wraps each module's error and exposes its remediation hint.

use std::path::PathBuf;
use thiserror::Error;

use crate::api::ApiError;
use crate::build::BuildError;
use crate::deploy::DeployError;
use crate::manifest::ManifestError;
use crate::package::PackageError;
use crate::prompt::PromptError;
use crate::toolchain::ToolchainError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// A hint for the user on how to fix the problem, if one is known.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            Error::Build(e) => e.remediation(),
            Error::Deploy(e) => e.remediation(),
            Error::Package(e) => e.remediation(),
            Error::Manifest(e) => e.remediation(),
            Error::Toolchain(e) => e.remediation(),
            Error::Api(e) if e.is_unauthorized() => Some(crate::deploy::AUTH_REMEDIATION),
            Error::ConfigNotFound(_) => {
                Some("Check the EDGESHIP_CONFIG path, or unset it to use the default location.")
            }
            Error::Yaml(_) | Error::InvalidConfig(_) => {
                Some("Fix the syntax of config.yml and try again.")
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
