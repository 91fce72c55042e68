// ABOUTME: Test support utilities.
// ABOUTME: Provides tracing setup, a recording ServiceApi mock, and project fixtures.

use async_trait::async_trait;
use edgeship::api::{
    ApiError, ConfigStore, ConfigStoreId, Domain, KvStore, KvStoreId, NewBackend,
    PackageMetadata, ResourceId, SecretStore, SecretStoreId, Service, ServiceApi, ServiceDetails,
    ServiceId, Version, WASM_SERVICE_TYPE,
};
use edgeship::package::files_hash;
use nonempty::NonEmpty;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter =
            EnvFilter::from_default_env().add_directive("edgeship=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Minimal valid Wasm module header.
#[allow(dead_code)]
pub const WASM_HEADER: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

/// Write a project with the given manifest and a prebuilt `bin/main.wasm`.
#[allow(dead_code)]
pub fn project(manifest: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("fastly.toml"), manifest).unwrap();
    std::fs::create_dir_all(dir.path().join("bin")).unwrap();
    std::fs::write(dir.path().join("bin/main.wasm"), WASM_HEADER).unwrap();
    dir
}

/// Package the project's manifest and binary into `pkg/<name>.tar.gz`.
#[allow(dead_code)]
pub fn package(root: &Path, name: &str) -> PathBuf {
    let mut files = NonEmpty::new(PathBuf::from("fastly.toml"));
    files.push(PathBuf::from("bin/main.wasm"));
    let destination = root.join("pkg").join(format!("{name}.tar.gz"));
    edgeship::package::create_archive(root, &files, &destination).unwrap();
    destination
}

/// Failures the mock can be told to return.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fail {
    CreateBackend,
    ActivateVersion,
    DomainTakenOnce,
}

#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct State {
    pub calls: Vec<String>,
    pub versions: Vec<Version>,
    pub domains: Vec<String>,
    pub backends: Vec<NewBackend>,
    pub links: Vec<(String, String)>,
    pub kv_keys: Vec<(String, Vec<u8>)>,
    pub config_items: Vec<(String, String)>,
    pub secrets: Vec<(String, String)>,
    pub uploaded: Vec<u32>,
    pub remote_files_hash: Option<String>,
    pub service_type: String,
    pub deleted: Vec<String>,
    pub failures: Vec<Fail>,
    next_store: u32,
}

/// A `ServiceApi` that records every call and serves canned data.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct MockApi {
    pub state: Arc<Mutex<State>>,
}

#[allow(dead_code)]
impl MockApi {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                service_type: WASM_SERVICE_TYPE.to_string(),
                ..State::default()
            })),
        }
    }

    /// A mock for an existing service holding `versions`.
    pub fn with_versions(versions: Vec<Version>) -> Self {
        let api = Self::new();
        api.state.lock().versions = versions;
        api
    }

    pub fn fail(&self, failure: Fail) -> &Self {
        self.state.lock().failures.push(failure);
        self
    }

    /// Pretend the remote version already holds the package at `path`.
    pub fn remote_package(&self, path: &Path) -> &Self {
        self.state.lock().remote_files_hash = Some(files_hash(path).unwrap());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.state.lock().calls.iter().filter(|c| *c == call).count()
    }

    fn record(&self, call: &str) {
        self.state.lock().calls.push(call.to_string());
    }

    fn failing(&self, failure: Fail) -> bool {
        let mut state = self.state.lock();
        if let Some(pos) = state.failures.iter().position(|f| *f == failure) {
            if failure == Fail::DomainTakenOnce {
                state.failures.remove(pos);
            }
            return true;
        }
        false
    }

    fn next_store_id(&self, prefix: &str) -> String {
        let mut state = self.state.lock();
        state.next_store += 1;
        format!("{prefix}-{}", state.next_store)
    }
}

#[allow(dead_code)]
fn status(operation: &'static str, status: u16, message: &str) -> ApiError {
    ApiError::Status {
        operation,
        status,
        message: message.to_string(),
    }
}

#[async_trait]
impl ServiceApi for MockApi {
    async fn create_service(&self, name: &str) -> Result<Service, ApiError> {
        self.record("create_service");
        self.state.lock().versions = vec![Version::new(1)];
        Ok(Service {
            id: ServiceId::new("new-service"),
            name: name.to_string(),
            service_type: WASM_SERVICE_TYPE.to_string(),
        })
    }

    async fn search_service(&self, name: &str) -> Result<Option<Service>, ApiError> {
        self.record("search_service");
        Ok((name == "known").then(|| Service {
            id: ServiceId::new("svc-by-name"),
            name: name.to_string(),
            service_type: WASM_SERVICE_TYPE.to_string(),
        }))
    }

    async fn delete_service(&self, service_id: &ServiceId) -> Result<(), ApiError> {
        self.record("delete_service");
        self.state.lock().deleted.push(service_id.to_string());
        Ok(())
    }

    async fn get_service_details(
        &self,
        service_id: &ServiceId,
    ) -> Result<ServiceDetails, ApiError> {
        self.record("get_service_details");
        let state = self.state.lock();
        Ok(ServiceDetails {
            id: service_id.clone(),
            name: "service".to_string(),
            service_type: state.service_type.clone(),
            versions: state.versions.clone(),
        })
    }

    async fn list_versions(&self, _service_id: &ServiceId) -> Result<Vec<Version>, ApiError> {
        self.record("list_versions");
        Ok(self.state.lock().versions.clone())
    }

    async fn clone_version(
        &self,
        _service_id: &ServiceId,
        _version: u32,
    ) -> Result<Version, ApiError> {
        self.record("clone_version");
        let mut state = self.state.lock();
        let next = state.versions.iter().map(|v| v.number).max().unwrap_or(0) + 1;
        let version = Version::new(next);
        state.versions.push(version.clone());
        Ok(version)
    }

    async fn list_domains(
        &self,
        _service_id: &ServiceId,
        _version: u32,
    ) -> Result<Vec<Domain>, ApiError> {
        self.record("list_domains");
        Ok(self
            .state
            .lock()
            .domains
            .iter()
            .map(|name| Domain { name: name.clone() })
            .collect())
    }

    async fn create_domain(
        &self,
        _service_id: &ServiceId,
        _version: u32,
        name: &str,
    ) -> Result<Domain, ApiError> {
        self.record("create_domain");
        if self.failing(Fail::DomainTakenOnce) {
            return Err(status(
                "create domain",
                400,
                "the domain is already taken by another customer",
            ));
        }
        self.state.lock().domains.push(name.to_string());
        Ok(Domain {
            name: name.to_string(),
        })
    }

    async fn create_backend(
        &self,
        _service_id: &ServiceId,
        _version: u32,
        backend: &NewBackend,
    ) -> Result<(), ApiError> {
        self.record("create_backend");
        if self.failing(Fail::CreateBackend) {
            return Err(status("create backend", 500, "backend rejected"));
        }
        self.state.lock().backends.push(backend.clone());
        Ok(())
    }

    async fn create_config_store(&self, name: &str) -> Result<ConfigStore, ApiError> {
        self.record("create_config_store");
        Ok(ConfigStore {
            id: ConfigStoreId::new(self.next_store_id("config")),
            name: name.to_string(),
        })
    }

    async fn create_config_store_item(
        &self,
        _store_id: &ConfigStoreId,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        self.record("create_config_store_item");
        self.state
            .lock()
            .config_items
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn create_secret_store(&self, name: &str) -> Result<SecretStore, ApiError> {
        self.record("create_secret_store");
        Ok(SecretStore {
            id: SecretStoreId::new(self.next_store_id("secret")),
            name: name.to_string(),
        })
    }

    async fn create_secret(
        &self,
        _store_id: &SecretStoreId,
        name: &str,
        secret: &str,
    ) -> Result<(), ApiError> {
        self.record("create_secret");
        self.state
            .lock()
            .secrets
            .push((name.to_string(), secret.to_string()));
        Ok(())
    }

    async fn create_kv_store(&self, name: &str) -> Result<KvStore, ApiError> {
        self.record("create_kv_store");
        Ok(KvStore {
            id: KvStoreId::new(self.next_store_id("kv")),
            name: name.to_string(),
        })
    }

    async fn insert_kv_key(
        &self,
        _store_id: &KvStoreId,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ApiError> {
        self.record("insert_kv_key");
        self.state.lock().kv_keys.push((key.to_string(), value));
        Ok(())
    }

    async fn create_resource_link(
        &self,
        _service_id: &ServiceId,
        _version: u32,
        resource_id: &ResourceId,
        name: &str,
    ) -> Result<(), ApiError> {
        self.record("create_resource_link");
        self.state
            .lock()
            .links
            .push((resource_id.to_string(), name.to_string()));
        Ok(())
    }

    async fn get_package(
        &self,
        _service_id: &ServiceId,
        _version: u32,
    ) -> Result<Option<PackageMetadata>, ApiError> {
        self.record("get_package");
        Ok(self
            .state
            .lock()
            .remote_files_hash
            .clone()
            .map(|hash| PackageMetadata {
                files_hash: Some(hash),
                ..PackageMetadata::default()
            }))
    }

    async fn update_package(
        &self,
        _service_id: &ServiceId,
        version: u32,
        package: &Path,
    ) -> Result<PackageMetadata, ApiError> {
        self.record("update_package");
        let hash = files_hash(package).ok();
        let mut state = self.state.lock();
        state.uploaded.push(version);
        state.remote_files_hash = hash.clone();
        Ok(PackageMetadata {
            files_hash: hash,
            ..PackageMetadata::default()
        })
    }

    async fn update_version(
        &self,
        _service_id: &ServiceId,
        _version: u32,
        _comment: &str,
    ) -> Result<(), ApiError> {
        self.record("update_version");
        Ok(())
    }

    async fn activate_version(
        &self,
        _service_id: &ServiceId,
        version: u32,
    ) -> Result<Version, ApiError> {
        self.record("activate_version");
        if self.failing(Fail::ActivateVersion) {
            return Err(status("activate version", 500, "activation failed"));
        }
        Ok(Version {
            active: true,
            ..Version::new(version)
        })
    }
}
