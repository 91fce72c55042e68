// ABOUTME: SHA-512 digests of package archives for change detection.
// ABOUTME: files_hash ignores archive order and metadata; package_hash covers raw bytes.

use flate2::read::GzDecoder;
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::PackageError;

/// Digest of every file entry's contents, fed in lexical order of entry name.
///
/// The whole archive is read before hashing so the result does not depend on
/// the order entries were written in.
pub fn files_hash(path: &Path) -> Result<String, PackageError> {
    let read_err = |source: std::io::Error| PackageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));
    let mut contents: BTreeMap<String, Vec<u8>> = BTreeMap::new();

    for entry in archive.entries().map_err(read_err)? {
        let mut entry = entry.map_err(read_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path().map_err(read_err)?.to_string_lossy().into_owned();
        // header sizes are untrusted; let the buffer grow with the bytes actually read
        let declared = entry.size();
        let mut data = Vec::new();
        entry.read_to_end(&mut data).map_err(read_err)?;
        if data.len() as u64 != declared {
            return Err(read_err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "entry {name} is truncated: expected {declared} bytes, found {}",
                    data.len()
                ),
            )));
        }
        contents.insert(name, data);
    }

    let mut hasher = Sha512::new();
    for data in contents.values() {
        hasher.update(data);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest of the archive file exactly as stored on disk.
pub fn package_hash(path: &Path) -> Result<String, PackageError> {
    let read_err = |source: std::io::Error| PackageError::Read {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_err)?;
    let mut hasher = Sha512::new();
    std::io::copy(&mut file, &mut hasher).map_err(read_err)?;
    Ok(hex::encode(hasher.finalize()))
}
