// ABOUTME: The [setup] section of the project manifest.
// ABOUTME: Declares backends, stores, and log endpoints a new service needs.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Setup {
    #[serde(default)]
    pub backends: BTreeMap<String, SetupBackend>,

    #[serde(default)]
    pub config_stores: BTreeMap<String, SetupConfigStore>,

    #[serde(default)]
    pub secret_stores: BTreeMap<String, SetupSecretStore>,

    #[serde(default)]
    pub kv_stores: BTreeMap<String, SetupKvStore>,

    #[serde(default)]
    pub log_endpoints: BTreeMap<String, SetupLogEndpoint>,
}

impl Setup {
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
            && self.config_stores.is_empty()
            && self.secret_stores.is_empty()
            && self.kv_stores.is_empty()
            && self.log_endpoints.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupBackend {
    pub address: Option<String>,
    pub port: Option<u16>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupConfigStore {
    pub description: Option<String>,
    #[serde(default)]
    pub items: BTreeMap<String, SetupConfigItem>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupConfigItem {
    pub value: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupSecretStore {
    pub description: Option<String>,
    #[serde(default)]
    pub entries: BTreeMap<String, SetupSecretEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupSecretEntry {
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupKvStore {
    pub description: Option<String>,
    #[serde(default)]
    pub items: BTreeMap<String, SetupKvItem>,
}

/// A kv store item takes its value inline or from a file relative to the project root.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupKvItem {
    pub value: Option<String>,
    pub file: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct SetupLogEndpoint {
    pub provider: Option<String>,
}
