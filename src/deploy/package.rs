// ABOUTME: Locates and checks the package to deploy, then uploads it when it changed.
// ABOUTME: All local validation happens before the first API call.

use std::path::{Path, PathBuf};

use super::{DeployError, ServiceTarget};
use crate::api::ServiceApi;
use crate::build::sanitize_package_name;
use crate::manifest::{Manifest, manifest_path};
use crate::output::Output;
use crate::package::{Artifact, default_package_path, files_hash, manifest_from_package, validate_package};

/// A validated local package and the manifest that describes it.
#[derive(Debug, Clone)]
pub struct LocalPackage {
    pub artifact: Artifact,
    pub manifest: Manifest,
    /// Manifest file that receives a newly created service id, if any.
    pub manifest_path: Option<PathBuf>,
    pub files_hash: String,
}

/// Resolve the package from `--package` or the project's default package path.
///
/// `env` selects `fastly.<env>.toml` as the project manifest. Without a readable
/// project manifest, the manifest inside `--package` is used.
pub fn resolve_package(
    root: &Path,
    env: Option<&str>,
    package_flag: Option<&Path>,
    out: &Output,
) -> Result<LocalPackage, DeployError> {
    let (manifest, local_manifest) = match (Manifest::discover(root, env), package_flag) {
        (Ok(manifest), _) => (manifest, true),
        (Err(_), Some(package)) => {
            out.info(&format!(
                "Using fastly.toml within --package archive: {}",
                package.display()
            ));
            (manifest_from_package(package)?, false)
        }
        (Err(e), None) => return Err(e.into()),
    };

    let path = match package_flag {
        Some(package) => package.to_path_buf(),
        None => {
            let name = manifest
                .name()
                .map(sanitize_package_name)
                .filter(|n| !n.is_empty())
                .ok_or(DeployError::MissingPackageName)?;
            root.join(default_package_path(&name))
        }
    };

    let artifact = validate_package(&path)?;
    let files_hash = files_hash(&path)?;
    tracing::debug!(package = %path.display(), %files_hash, "resolved package");

    let manifest_path = local_manifest.then(|| manifest_path(root, env));

    Ok(LocalPackage {
        artifact,
        manifest,
        manifest_path,
        files_hash,
    })
}

/// Upload the package unless the target version already holds identical contents.
///
/// Returns `false` when the upload was skipped.
pub async fn upload_if_changed(
    api: &dyn ServiceApi,
    target: &ServiceTarget,
    package: &LocalPackage,
    out: &Output,
) -> Result<bool, DeployError> {
    match api.get_package(&target.service_id, target.number()).await {
        Ok(Some(remote)) if remote.files_hash.as_deref() == Some(package.files_hash.as_str()) => {
            out.info(&format!(
                "Skipping package deployment, local and service version are identical. (service {}, version {})",
                target.service_id,
                target.number()
            ));
            return Ok(false);
        }
        Ok(_) => {}
        Err(e) => {
            tracing::debug!(service_id = %target.service_id, version = target.number(), "package lookup failed, uploading: {e}");
        }
    }

    out.progress("Uploading package...");
    api.update_package(&target.service_id, target.number(), package.artifact.path())
        .await
        .map_err(target.remote("uploading package"))?;
    Ok(true)
}
