// ABOUTME: Error types for reading and updating the project manifest.
// ABOUTME: A missing manifest is the canonical configuration error.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("error reading manifest: no manifest found at {0}")]
    Missing(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to update {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            ManifestError::Missing(_) => Some(
                "Run this command from a project directory containing a fastly.toml manifest, or pass --dir.",
            ),
            ManifestError::Parse(_) => Some("Fix the syntax error in fastly.toml and try again."),
            _ => None,
        }
    }
}
