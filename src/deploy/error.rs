// ABOUTME: Errors raised while deploying a package to a service.
// ABOUTME: Remote failures carry the service id and version they happened on.

use std::path::PathBuf;

use crate::api::{ApiError, ServiceId};
use crate::manifest::ManifestError;
use crate::package::PackageError;
use crate::prompt::PromptError;

pub const AUTH_REMEDIATION: &str = "Provide an API token with --token, the EDGESHIP_API_TOKEN environment variable, or `api.token` in config.yml.";

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("no API token found")]
    NoToken,

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("package name is missing")]
    MissingPackageName,

    #[error("failed to connect to the API: {0}")]
    Connect(#[source] ApiError),

    #[error("invalid --version value '{0}', expected a number, 'latest', or 'active'")]
    InvalidVersion(String),

    #[error("error searching for service '{name}': {source}")]
    SearchService {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("no service found with name '{0}'")]
    ServiceNameNotFound(String),

    #[error("service {service_id} has no {selector} version")]
    VersionNotFound { service_id: ServiceId, selector: String },

    #[error("invalid service type: {service_type} (service {service_id})")]
    InvalidServiceType {
        service_id: ServiceId,
        service_type: String,
    },

    #[error("error creating service '{name}': {source}")]
    CreateService {
        name: String,
        #[source]
        source: ApiError,
    },

    #[error("error {step} (service {service_id}, version {version}): {source}")]
    Remote {
        step: &'static str,
        service_id: ServiceId,
        version: u32,
        #[source]
        source: ApiError,
    },

    #[error("error recording service id {service_id} in fastly.toml: {source}")]
    RecordServiceId {
        service_id: ServiceId,
        #[source]
        source: ManifestError,
    },

    #[error("invalid domain name '{0}'")]
    InvalidDomain(String),

    #[error("secret store entry '{store}.{entry}' value cannot be blank")]
    BlankSecret { store: String, entry: String },

    #[error("kv store item '{store}.{key}' must set exactly one of 'value' or 'file'")]
    KvItemSource { store: String, key: String },

    #[error("failed to read kv store item file {path}: {source}")]
    KvItemFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            DeployError::NoToken => Some(AUTH_REMEDIATION),
            DeployError::Manifest(e) => e.remediation(),
            DeployError::Package(e) => e.remediation(),
            DeployError::MissingPackageName => {
                Some("Add a `name` field to fastly.toml or pass --package.")
            }
            DeployError::InvalidServiceType { .. } => Some(
                "Ensure the service id refers to a Wasm service, not a VCL service.",
            ),
            DeployError::Remote { source, .. } | DeployError::CreateService { source, .. }
                if source.is_unauthorized() =>
            {
                Some(AUTH_REMEDIATION)
            }
            DeployError::KvItemSource { .. } => Some(
                "Edit the [setup.kv_stores] item to use either 'value' or 'file', not both.",
            ),
            _ => None,
        }
    }

    /// The service and version the error happened on, when known.
    pub fn service_context(&self) -> Option<(&ServiceId, u32)> {
        match self {
            DeployError::Remote {
                service_id,
                version,
                ..
            } => Some((service_id, *version)),
            _ => None,
        }
    }
}
