// ABOUTME: reqwest transport for the ServiceApi trait.
// ABOUTME: Authenticates with the Fastly-Key header and maps non-2xx replies to ApiError.

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

use super::{
    ApiError, ApiToken, ConfigStore, ConfigStoreId, Domain, KvStore, KvStoreId, NewBackend,
    PackageMetadata, ResourceId, SecretStore, SecretStoreId, Service, ServiceApi, ServiceDetails,
    ServiceId, Version, WASM_SERVICE_TYPE,
};

const AUTH_HEADER: &str = "Fastly-Key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Error body returned by the API.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PackageResponse {
    #[serde(default)]
    metadata: PackageMetadata,
}

pub struct HttpServiceApi {
    client: Client,
    endpoint: String,
    token: ApiToken,
}

impl HttpServiceApi {
    pub fn new(endpoint: &str, token: ApiToken) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("edgeship/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Transport {
                operation: "build HTTP client",
                source,
            })?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, ApiError> {
        let response = request
            .header(AUTH_HEADER, self.token.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| ApiError::Transport { operation, source })?;

        let status = response.status();
        tracing::debug!(operation, status = status.as_u16(), "API response");
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let message = match (body.msg, body.detail) {
            (Some(msg), Some(detail)) => format!("{msg}: {detail}"),
            (Some(msg), None) => msg,
            (None, Some(detail)) => detail,
            (None, None) => text.trim().to_string(),
        };
        Err(ApiError::Status {
            operation,
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        self.send(operation, request)
            .await?
            .json()
            .await
            .map_err(|e| ApiError::Decode {
                operation,
                message: e.to_string(),
            })
    }
}

fn version_path(service_id: &ServiceId, version: u32) -> String {
    format!("/service/{service_id}/version/{version}")
}

#[async_trait]
impl ServiceApi for HttpServiceApi {
    async fn create_service(&self, name: &str) -> Result<Service, ApiError> {
        tracing::debug!(name, "creating service");
        let request = self
            .post("/service")
            .form(&[("name", name), ("type", WASM_SERVICE_TYPE)]);
        self.json("create service", request).await
    }

    async fn search_service(&self, name: &str) -> Result<Option<Service>, ApiError> {
        tracing::debug!(name, "searching for service");
        let request = self.get("/service/search").query(&[("name", name)]);
        match self.json("search service", request).await {
            Ok(service) => Ok(Some(service)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn delete_service(&self, service_id: &ServiceId) -> Result<(), ApiError> {
        tracing::debug!(%service_id, "deleting service");
        let request = self.client.delete(self.url(&format!("/service/{service_id}")));
        self.send("delete service", request).await?;
        Ok(())
    }

    async fn get_service_details(
        &self,
        service_id: &ServiceId,
    ) -> Result<ServiceDetails, ApiError> {
        tracing::debug!(%service_id, "fetching service details");
        let request = self.get(&format!("/service/{service_id}/details"));
        self.json("get service details", request).await
    }

    async fn list_versions(&self, service_id: &ServiceId) -> Result<Vec<Version>, ApiError> {
        tracing::debug!(%service_id, "listing versions");
        let request = self.get(&format!("/service/{service_id}/version"));
        self.json("list versions", request).await
    }

    async fn clone_version(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Version, ApiError> {
        tracing::debug!(%service_id, version, "cloning version");
        let request = self.put(&format!("{}/clone", version_path(service_id, version)));
        self.json("clone version", request).await
    }

    async fn list_domains(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Vec<Domain>, ApiError> {
        tracing::debug!(%service_id, version, "listing domains");
        let request = self.get(&format!("{}/domain", version_path(service_id, version)));
        self.json("list domains", request).await
    }

    async fn create_domain(
        &self,
        service_id: &ServiceId,
        version: u32,
        name: &str,
    ) -> Result<Domain, ApiError> {
        tracing::debug!(%service_id, version, name, "creating domain");
        let request = self
            .post(&format!("{}/domain", version_path(service_id, version)))
            .form(&[("name", name)]);
        self.json("create domain", request).await
    }

    async fn create_backend(
        &self,
        service_id: &ServiceId,
        version: u32,
        backend: &NewBackend,
    ) -> Result<(), ApiError> {
        tracing::debug!(%service_id, version, name = %backend.name, "creating backend");
        let request = self
            .post(&format!("{}/backend", version_path(service_id, version)))
            .form(backend);
        self.send("create backend", request).await?;
        Ok(())
    }

    async fn create_config_store(&self, name: &str) -> Result<ConfigStore, ApiError> {
        tracing::debug!(name, "creating config store");
        let request = self.post("/resources/stores/config").form(&[("name", name)]);
        self.json("create config store", request).await
    }

    async fn create_config_store_item(
        &self,
        store_id: &ConfigStoreId,
        key: &str,
        value: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .post(&format!("/resources/stores/config/{store_id}/item"))
            .form(&[("item_key", key), ("item_value", value)]);
        self.send("create config store item", request).await?;
        Ok(())
    }

    async fn create_secret_store(&self, name: &str) -> Result<SecretStore, ApiError> {
        tracing::debug!(name, "creating secret store");
        let request = self
            .post("/resources/stores/secret")
            .json(&serde_json::json!({ "name": name }));
        self.json("create secret store", request).await
    }

    async fn create_secret(
        &self,
        store_id: &SecretStoreId,
        name: &str,
        secret: &str,
    ) -> Result<(), ApiError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(secret);
        let request = self
            .post(&format!("/resources/stores/secret/{store_id}/secrets"))
            .json(&serde_json::json!({ "name": name, "secret": encoded }));
        self.send("create secret", request).await?;
        Ok(())
    }

    async fn create_kv_store(&self, name: &str) -> Result<KvStore, ApiError> {
        tracing::debug!(name, "creating kv store");
        let request = self
            .post("/resources/stores/kv")
            .json(&serde_json::json!({ "name": name }));
        self.json("create kv store", request).await
    }

    async fn insert_kv_key(
        &self,
        store_id: &KvStoreId,
        key: &str,
        value: Vec<u8>,
    ) -> Result<(), ApiError> {
        let request = self
            .put(&format!(
                "/resources/stores/kv/{store_id}/keys/{}",
                urlencoding::encode(key)
            ))
            .body(value);
        self.send("insert kv key", request).await?;
        Ok(())
    }

    async fn create_resource_link(
        &self,
        service_id: &ServiceId,
        version: u32,
        resource_id: &ResourceId,
        name: &str,
    ) -> Result<(), ApiError> {
        tracing::debug!(%service_id, version, %resource_id, name, "linking resource");
        let request = self
            .post(&format!("{}/resource", version_path(service_id, version)))
            .form(&[("resource_id", resource_id.as_str()), ("name", name)]);
        self.send("create resource link", request).await?;
        Ok(())
    }

    async fn get_package(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Option<PackageMetadata>, ApiError> {
        tracing::debug!(%service_id, version, "fetching package metadata");
        let request = self.get(&format!("{}/package", version_path(service_id, version)));
        match self.json::<PackageResponse>("get package", request).await {
            Ok(response) => Ok(Some(response.metadata)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn update_package(
        &self,
        service_id: &ServiceId,
        version: u32,
        package: &Path,
    ) -> Result<PackageMetadata, ApiError> {
        tracing::debug!(%service_id, version, package = %package.display(), "uploading package");
        let bytes = tokio::fs::read(package)
            .await
            .map_err(|source| ApiError::ReadPackage {
                path: package.to_path_buf(),
                source,
            })?;
        let file_name = package
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "package.tar.gz".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/gzip")
            .map_err(|source| ApiError::Transport {
                operation: "update package",
                source,
            })?;
        let request = self
            .put(&format!("{}/package", version_path(service_id, version)))
            .multipart(Form::new().part("package", part));
        let response: PackageResponse = self.json("update package", request).await?;
        Ok(response.metadata)
    }

    async fn update_version(
        &self,
        service_id: &ServiceId,
        version: u32,
        comment: &str,
    ) -> Result<(), ApiError> {
        tracing::debug!(%service_id, version, "updating version comment");
        let request = self
            .put(&version_path(service_id, version))
            .form(&[("comment", comment)]);
        self.send("update version", request).await?;
        Ok(())
    }

    async fn activate_version(
        &self,
        service_id: &ServiceId,
        version: u32,
    ) -> Result<Version, ApiError> {
        tracing::debug!(%service_id, version, "activating version");
        let request = self.put(&format!("{}/activate", version_path(service_id, version)));
        self.json("activate version", request).await
    }
}
