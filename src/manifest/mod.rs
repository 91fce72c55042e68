// ABOUTME: Project manifest (fastly.toml) parsing and service id write-back.
// ABOUTME: Supplies name, language, scripts, and setup declarations to build and deploy.

mod error;
mod setup;

pub use error::ManifestError;
pub use setup::{
    Setup, SetupBackend, SetupConfigItem, SetupConfigStore, SetupKvItem, SetupKvStore,
    SetupLogEndpoint, SetupSecretEntry, SetupSecretStore,
};

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILENAME: &str = "fastly.toml";
const MULTILINE_DELIMITERS: [&str; 2] = ["\"\"\"", "'''"];

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default)]
    pub manifest_version: Option<u32>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub service_id: Option<String>,

    #[serde(default)]
    pub scripts: Scripts,

    #[serde(default)]
    pub setup: Setup,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Scripts {
    pub build: Option<String>,
    pub post_build: Option<String>,

    /// `KEY=VALUE` pairs overlaid on the build environment.
    #[serde(default)]
    pub env_vars: Vec<String>,

    /// Overrides the toolchain's default source directory.
    pub source_directory: Option<String>,

    #[serde(default)]
    pub package_manager: PackageManager,
}

/// JavaScript package manager used to run build tools.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl Manifest {
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        toml::from_str(content).map_err(ManifestError::from)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::Missing(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_toml(&content)
    }

    /// Load the project's manifest, or the named environment's manifest.
    pub fn discover(root: &Path, env: Option<&str>) -> Result<Self, ManifestError> {
        Self::load(&manifest_path(root, env))
    }

    pub fn name(&self) -> Option<&str> {
        non_empty(&self.name)
    }

    pub fn language(&self) -> Option<&str> {
        non_empty(&self.language)
    }

    pub fn service_id(&self) -> Option<&str> {
        non_empty(&self.service_id)
    }

    pub fn build_script(&self) -> Option<&str> {
        non_empty(&self.scripts.build)
    }

    pub fn post_build_script(&self) -> Option<&str> {
        non_empty(&self.scripts.post_build)
    }

    pub fn source_directory(&self) -> Option<&str> {
        non_empty(&self.scripts.source_directory)
    }

    /// Parsed `env_vars`; entries without `=` are skipped with a warning.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        self.scripts
            .env_vars
            .iter()
            .filter_map(|pair| match pair.split_once('=') {
                Some((k, v)) if !k.trim().is_empty() => {
                    Some((k.trim().to_string(), v.to_string()))
                }
                _ => {
                    tracing::warn!("ignoring malformed env_vars entry '{pair}'");
                    None
                }
            })
            .collect()
    }
}

/// `fastly.toml`, or `fastly.<env>.toml` when an environment is named.
pub fn manifest_filename(env: Option<&str>) -> String {
    match env.map(str::trim).filter(|e| !e.is_empty()) {
        Some(env) => format!("fastly.{env}.toml"),
        None => MANIFEST_FILENAME.to_string(),
    }
}

pub fn manifest_path(root: &Path, env: Option<&str>) -> PathBuf {
    root.join(manifest_filename(env))
}

/// Write `service_id` into the manifest at `path`, or clear it with `None`.
///
/// Only the top-level `service_id` line is touched so comments and layout survive.
pub fn set_service_id(path: &Path, service_id: Option<&str>) -> Result<(), ManifestError> {
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let updated = rewrite_service_id(&content, service_id.unwrap_or_default());
    std::fs::write(path, updated).map_err(|source| ManifestError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(manifest = %path.display(), ?service_id, "updated service_id");
    Ok(())
}

fn rewrite_service_id(content: &str, service_id: &str) -> String {
    let replacement = format!(
        "service_id = {}",
        toml::Value::String(service_id.to_string())
    );
    let mut lines: Vec<&str> = Vec::new();
    let mut written = false;
    let mut in_root_table = true;
    let mut open_string: Option<&str> = None;

    for line in content.lines() {
        if let Some(delimiter) = open_string {
            if line.matches(delimiter).count() % 2 == 1 {
                open_string = None;
            }
            lines.push(line);
            continue;
        }

        let trimmed = line.trim_start();
        if trimmed.starts_with('[') {
            if in_root_table && !written {
                lines.push(&replacement);
                written = true;
            }
            in_root_table = false;
        }
        if in_root_table && is_key_line(trimmed, "service_id") {
            if !written {
                lines.push(&replacement);
                written = true;
            }
            continue;
        }
        open_string = MULTILINE_DELIMITERS
            .into_iter()
            .find(|delimiter| line.matches(*delimiter).count() % 2 == 1);
        lines.push(line);
    }
    if !written {
        lines.push(&replacement);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn is_key_line(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.trim_start().starts_with('='))
}
