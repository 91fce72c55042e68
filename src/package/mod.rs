// ABOUTME: Package archive construction, content hashing, and validation.
// ABOUTME: Exports the Artifact type consumed by the deploy orchestrator.

mod archive;
mod error;
mod hash;
mod ignore;
mod validate;

pub use archive::{create_archive, create_archive_as, staging_root_name};
pub use error::PackageError;
pub use hash::{files_hash, package_hash};
pub use ignore::{IGNORE_FILENAME, IgnoreList, collect_files};
pub use validate::{PACKAGE_SIZE_LIMIT, manifest_from_package, validate_package};

use std::path::{Path, PathBuf};

/// Entry name of the project manifest inside a package.
pub const MANIFEST_ENTRY: &str = "fastly.toml";

/// Entry name of the compiled binary inside a package.
pub const BINARY_ENTRY: &str = "main.wasm";

/// Directory that toolchains write `main.wasm` into.
pub const BIN_DIR: &str = "bin";

/// Directory that package archives are written into.
pub const PKG_DIR: &str = "pkg";

/// Default location of the package for `name`, relative to the project root.
pub fn default_package_path(name: &str) -> PathBuf {
    Path::new(PKG_DIR).join(format!("{name}.tar.gz"))
}

/// A validated package archive on disk.
///
/// Only [`validate_package`] constructs one, so holding an `Artifact` means the
/// archive was readable and contained both required entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    path: PathBuf,
    size: u64,
    entries: Vec<PathBuf>,
}

impl Artifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the archive in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// File entries in archive order.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Entries other than the manifest and the binary.
    pub fn source_files(&self) -> impl Iterator<Item = &Path> {
        self.entries
            .iter()
            .map(PathBuf::as_path)
            .filter(|p| !is_required_entry(p))
    }
}

/// True for `<root>/fastly.toml` and `<root>/bin/main.wasm`.
fn is_required_entry(entry: &Path) -> bool {
    let relative: PathBuf = entry.components().skip(1).collect();
    relative == Path::new(MANIFEST_ENTRY) || relative == Path::new(BIN_DIR).join(BINARY_ENTRY)
}
