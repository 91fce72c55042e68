// ABOUTME: Error types for package archive creation, hashing, and validation.
// ABOUTME: All of these are raised before any network call is attempted.

use std::path::PathBuf;

use crate::manifest::ManifestError;

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("failed to create staging directory: {0}")]
    Staging(#[source] std::io::Error),

    #[error("failed to copy {path} into the package: {source}")]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file is outside the project directory: {0}")]
    OutsideProject(PathBuf),

    #[error("failed to write package {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read package {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package not found: {0}")]
    NotFound(PathBuf),

    #[error("package size {size} bytes exceeds the limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    #[error("package is missing required file: {0}")]
    MissingEntry(&'static str),

    #[error("invalid manifest inside package: {0}")]
    Manifest(#[from] ManifestError),

    #[error("failed to read ignore file {path}: {source}")]
    IgnoreFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ignore pattern '{pattern}': {source}")]
    IgnorePattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl PackageError {
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            PackageError::NotFound(_) => Some(
                "Run the build command first, or pass --package with the path to an existing package archive.",
            ),
            PackageError::TooLarge { .. } => Some(
                "Reduce the size of the package, for example by excluding source files or adding patterns to .fastlyignore.",
            ),
            PackageError::MissingEntry(_) => Some(
                "Packages must contain a fastly.toml manifest and a bin/main.wasm binary. Rebuild the package with the build command.",
            ),
            PackageError::IgnorePattern { .. } => {
                Some("Fix or remove the offending line in .fastlyignore.")
            }
            _ => None,
        }
    }
}
