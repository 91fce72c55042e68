// ABOUTME: The control-plane API seen by the deploy orchestrator.
// ABOUTME: Defines the ServiceApi trait, its data types, and the API token.

mod error;
pub mod http;
mod id;
mod types;

pub use error::ApiError;
pub use http::HttpServiceApi;
pub use id::{ConfigStoreId, Id, KvStoreId, ResourceId, SecretStoreId, ServiceId};
pub use types::{
    ConfigStore, Domain, KvStore, NewBackend, PackageMetadata, SecretStore, Service,
    ServiceDetails, Version, WASM_SERVICE_TYPE,
};

use async_trait::async_trait;
use std::path::Path;

/// API credential. Debug output never shows the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiToken([REDACTED])")
    }
}

/// Control-plane operations used by build and deploy.
///
/// Each call is independent; callers retry where they need to.
#[async_trait]
pub trait ServiceApi: Send + Sync {
    async fn create_service(&self, name: &str) -> Result<Service, ApiError>;

    /// Look up a service by exact name.
    async fn search_service(&self, name: &str) -> Result<Option<Service>, ApiError>;

    async fn delete_service(&self, service_id: &ServiceId) -> Result<(), ApiError>;

    /// Service metadata including every version.
    async fn get_service_details(&self, service_id: &ServiceId)
    -> Result<ServiceDetails, ApiError>;

    async fn list_versions(&self, service_id: &ServiceId) -> Result<Vec<Version>, ApiError>;

    /// Copy `version` into a new editable version.
    async fn clone_version(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Version, ApiError>;

    async fn list_domains(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Vec<Domain>, ApiError>;

    async fn create_domain(
        &self,
        service_id: &ServiceId,
        version: u32,
        name: &str,
    ) -> Result<Domain, ApiError>;

    async fn create_backend(
        &self,
        service_id: &ServiceId,
        version: u32,
        backend: &NewBackend,
    ) -> Result<(), ApiError>;

    async fn create_config_store(&self, name: &str) -> Result<ConfigStore, ApiError>;

    async fn create_config_store_item(
        &self,
        store_id: &ConfigStoreId,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError>;

    async fn create_secret_store(&self, name: &str) -> Result<SecretStore, ApiError>;

    async fn create_secret(
        &self,
        store_id: &SecretStoreId,
        name: &str,
        secret: &str,
    ) -> Result<(), ApiError>;

    async fn create_kv_store(&self, name: &str) -> Result<KvStore, ApiError>;

    async fn insert_kv_key(
        &self,
        store_id: &KvStoreId,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ApiError>;

    /// Attach a store to a service version under `name`.
    async fn create_resource_link(
        &self,
        service_id: &ServiceId,
        version: u32,
        resource_id: &ResourceId,
        name: &str,
    ) -> Result<(), ApiError>;

    /// Package metadata for a version, or `None` when nothing was uploaded yet.
    async fn get_package(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Option<PackageMetadata>, ApiError>;

    async fn update_package(
        &self,
        service_id: &ServiceId,
        version: u32,
        package: &Path,
    ) -> Result<PackageMetadata, ApiError>;

    /// Set the version comment.
    async fn update_version(
        &self,
        service_id: &ServiceId,
        version: u32,
        comment: &str,
    ) -> Result<(), ApiError>;

    async fn activate_version(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Version, ApiError>;
}
