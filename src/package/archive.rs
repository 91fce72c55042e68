// ABOUTME: Builds gzip-compressed tar packages from an explicit file list.
// ABOUTME: Files are staged in a temporary directory so nothing outside the list leaks in.

use flate2::Compression;
use flate2::write::GzEncoder;
use nonempty::NonEmpty;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use super::PackageError;

/// Name of the single top-level directory inside the archive at `destination`.
///
/// This is the file name up to its first dot, so `pkg/my-app.tar.gz` yields `my-app`.
pub fn staging_root_name(destination: &Path) -> String {
    destination
        .file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "package".to_string())
}

/// Create a `.tar.gz` at `destination` containing exactly `files`.
///
/// Paths in `files` are relative to `root` (absolute paths must live under it).
/// Entries are nested under [`staging_root_name`] and written in sorted order
/// with zeroed timestamps and ownership, so identical inputs give identical entries.
pub fn create_archive(
    root: &Path,
    files: &NonEmpty<PathBuf>,
    destination: &Path,
) -> Result<(), PackageError> {
    let entries = files.clone().map(|file| (file.clone(), file));
    create_archive_as(root, &entries, destination)
}

/// Like [`create_archive`], but each `(source, entry)` pair stores the file at
/// `source` under the archive path `entry`.
pub fn create_archive_as(
    root: &Path,
    entries: &NonEmpty<(PathBuf, PathBuf)>,
    destination: &Path,
) -> Result<(), PackageError> {
    let staging = tempfile::Builder::new()
        .prefix("edgeship-build-")
        .tempdir()
        .map_err(PackageError::Staging)?;
    let top = staging_root_name(destination);
    let staged_root = staging.path().join(&top);

    for (file, entry) in entries {
        let source = root.join(relative_to(root, file)?);
        let target = staged_root.join(relative_to(root, entry)?);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PackageError::Copy {
                path: file.clone(),
                source,
            })?;
        }
        std::fs::copy(&source, &target).map_err(|source| PackageError::Copy {
            path: file.clone(),
            source,
        })?;
    }

    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| PackageError::Write {
            path: destination.to_path_buf(),
            source,
        })?;
    }

    write_tar_gz(staging.path(), destination).map_err(|source| PackageError::Write {
        path: destination.to_path_buf(),
        source,
    })?;

    tracing::debug!(
        destination = %destination.display(),
        files = entries.len(),
        "created package archive"
    );
    Ok(())
}

fn write_tar_gz(staging: &Path, destination: &Path) -> std::io::Result<()> {
    let file = File::create(destination)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    builder.follow_symlinks(false);

    for entry in WalkDir::new(staging).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::other)?;
        let name = entry
            .path()
            .strip_prefix(staging)
            .map_err(std::io::Error::other)?;

        let mut header = tar::Header::new_gnu();
        header.set_mtime(0);
        header.set_uid(0);
        header.set_gid(0);

        if entry.file_type().is_dir() {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_mode(0o755);
            header.set_size(0);
            builder.append_data(&mut header, name, std::io::empty())?;
        } else {
            let metadata = entry.metadata().map_err(std::io::Error::other)?;
            header.set_entry_type(tar::EntryType::Regular);
            header.set_mode(file_mode(&metadata));
            header.set_size(metadata.len());
            builder.append_data(&mut header, name, File::open(entry.path())?)?;
        }
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

fn file_mode(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    if metadata.permissions().mode() & 0o111 != 0 {
        0o755
    } else {
        0o644
    }
}

/// Normalize `file` to a path relative to `root`, rejecting escapes.
fn relative_to(root: &Path, file: &Path) -> Result<PathBuf, PackageError> {
    let relative = if file.is_absolute() {
        file.strip_prefix(root)
            .map_err(|_| PackageError::OutsideProject(file.to_path_buf()))?
            .to_path_buf()
    } else {
        file.to_path_buf()
    };

    let mut normalized = PathBuf::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return Err(PackageError::OutsideProject(file.to_path_buf())),
        }
    }
    if normalized.as_os_str().is_empty() {
        return Err(PackageError::OutsideProject(file.to_path_buf()));
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_name_stops_at_first_dot() {
        assert_eq!(staging_root_name(Path::new("pkg/my-app.tar.gz")), "my-app");
        assert_eq!(staging_root_name(Path::new("out/app")), "app");
    }

    #[test]
    fn root_name_falls_back_when_empty() {
        assert_eq!(staging_root_name(Path::new("pkg/.tar.gz")), "package");
    }

    #[test]
    fn relative_paths_are_normalized() {
        let root = Path::new("/project");
        assert_eq!(
            relative_to(root, Path::new("./bin/main.wasm")).unwrap(),
            PathBuf::from("bin/main.wasm")
        );
        assert_eq!(
            relative_to(root, Path::new("/project/fastly.toml")).unwrap(),
            PathBuf::from("fastly.toml")
        );
    }

    #[test]
    fn escaping_paths_are_rejected() {
        let root = Path::new("/project");
        assert!(matches!(
            relative_to(root, Path::new("../secret")),
            Err(PackageError::OutsideProject(_))
        ));
        assert!(matches!(
            relative_to(root, Path::new("/etc/passwd")),
            Err(PackageError::OutsideProject(_))
        ));
    }
}
