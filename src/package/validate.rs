// ABOUTME: Package validation ahead of any deploy action.
// ABOUTME: Checks size, archive readability, and presence of the required entries.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::{Artifact, BINARY_ENTRY, MANIFEST_ENTRY, PackageError};
use crate::manifest::Manifest;

/// Largest package the platform accepts, in bytes.
pub const PACKAGE_SIZE_LIMIT: u64 = 50_000_000;

/// Validate the archive at `path` and return it as an [`Artifact`].
pub fn validate_package(path: &Path) -> Result<Artifact, PackageError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(PackageError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(PackageError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let size = metadata.len();
    if size > PACKAGE_SIZE_LIMIT {
        return Err(PackageError::TooLarge {
            size,
            limit: PACKAGE_SIZE_LIMIT,
        });
    }

    let entries = file_entries(path)?;
    let has = |name: &str| entries.iter().any(|e| e.file_name().is_some_and(|f| f == name));
    if !has(MANIFEST_ENTRY) {
        return Err(PackageError::MissingEntry(MANIFEST_ENTRY));
    }
    if !has(BINARY_ENTRY) {
        return Err(PackageError::MissingEntry(BINARY_ENTRY));
    }

    tracing::debug!(package = %path.display(), size, entries = entries.len(), "package validated");
    Ok(Artifact {
        path: path.to_path_buf(),
        size,
        entries,
    })
}

/// Parse the manifest stored inside the package at `path`.
///
/// Used when deploying a package whose project directory is not available.
pub fn manifest_from_package(path: &Path) -> Result<Manifest, PackageError> {
    let read_err = |source: std::io::Error| PackageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    for entry in archive.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        let is_manifest = entry.header().entry_type().is_file()
            && entry
                .path()
                .map_err(read_err)?
                .file_name()
                .is_some_and(|f| f == MANIFEST_ENTRY);
        if is_manifest {
            let mut content = String::new();
            entry.read_to_string(&mut content).map_err(read_err)?;
            return Ok(Manifest::from_toml(&content)?);
        }
    }

    Err(PackageError::MissingEntry(MANIFEST_ENTRY))
}

fn file_entries(path: &Path) -> Result<Vec<PathBuf>, PackageError> {
    let read_err = |source: std::io::Error| PackageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut entries = Vec::new();
    for entry in archive.entries().map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.header().entry_type().is_file() {
            entries.push(entry.path().map_err(read_err)?.into_owned());
        }
    }
    Ok(entries)
}
