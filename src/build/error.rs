// ABOUTME: Errors raised while turning a project into a package archive.
// ABOUTME: Every configuration failure carries a remediation hint.

use std::path::PathBuf;

use crate::manifest::ManifestError;
use crate::package::PackageError;
use crate::toolchain::ToolchainError;

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to resolve project directory {path}: {source}")]
    ProjectDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("package name is missing")]
    MissingPackageName,

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("failed to create {path}: {source}")]
    BinDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error creating package archive: {0}")]
    Package(#[from] PackageError),
}

impl BuildError {
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            BuildError::ProjectDir { .. } => {
                Some("Check that the --dir path exists and is a directory.")
            }
            BuildError::Manifest(e) => e.remediation(),
            BuildError::MissingPackageName => Some(
                "Add a `name` field to fastly.toml or pass --package-name.",
            ),
            BuildError::Toolchain(e) => e.remediation(),
            BuildError::BinDir { .. } => None,
            BuildError::Package(e) => e.remediation(),
        }
    }
}
