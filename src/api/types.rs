// ABOUTME: Request and response shapes for the control-plane API.
// ABOUTME: Only the fields the deploy flow reads are modelled.

use serde::{Deserialize, Serialize};

use super::{ConfigStoreId, KvStoreId, SecretStoreId, ServiceId};

/// The service type required for Wasm packages.
pub const WASM_SERVICE_TYPE: &str = "wasm";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub service_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceDetails {
    pub id: ServiceId,
    pub name: String,
    #[serde(rename = "type", default)]
    pub service_type: String,
    #[serde(default)]
    pub versions: Vec<Version>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Version {
    pub number: u32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

impl Version {
    pub fn new(number: u32) -> Self {
        Self {
            number,
            active: false,
            locked: false,
            comment: None,
        }
    }

    /// Active and locked versions must be cloned before anything is attached.
    pub fn is_editable(&self) -> bool {
        !self.active && !self.locked
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Domain {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBackend {
    pub name: String,
    pub address: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_cert_hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl_sni_hostname: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigStore {
    pub id: ConfigStoreId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecretStore {
    pub id: SecretStoreId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KvStore {
    pub id: KvStoreId,
    pub name: String,
}

/// Metadata of the package attached to a version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageMetadata {
    /// Digest over the archive's file contents, see `package::files_hash`.
    #[serde(default)]
    pub files_hash: Option<String>,
    /// Digest over the whole archive file.
    #[serde(default)]
    pub hashsum: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}
