// ABOUTME: Ignore-file handling for source inclusion in packages.
// ABOUTME: Collects non-ignored files under selected project directories.

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::PackageError;

/// Name of the ignore file in the project root.
pub const IGNORE_FILENAME: &str = ".fastlyignore";

/// Glob patterns, one per line, matched against project-relative paths.
#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    patterns: Vec<Pattern>,
}

impl IgnoreList {
    /// Load the ignore file from `root`. A missing file means nothing is ignored.
    pub fn load(root: &Path) -> Result<Self, PackageError> {
        let path = root.join(IGNORE_FILENAME);
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(PackageError::IgnoreFile { path, source }),
        }
    }

    pub fn parse(content: &str) -> Result<Self, PackageError> {
        let patterns = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let line = line.strip_prefix("./").unwrap_or(line);
                let line = line.strip_suffix('/').unwrap_or(line);
                Pattern::new(line).map_err(|source| PackageError::IgnorePattern {
                    pattern: line.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True when `relative` or any of its parent directories matches a pattern.
    pub fn is_ignored(&self, relative: &Path) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        relative.ancestors().filter(|p| !p.as_os_str().is_empty()).any(|candidate| {
            self.patterns
                .iter()
                .any(|pattern| pattern.matches_path_with(candidate, options))
        })
    }
}

/// Every non-ignored file under `dirs`, relative to `root`, sorted and deduplicated.
///
/// Directories that do not exist are skipped.
pub fn collect_files(
    root: &Path,
    dirs: &[&Path],
    ignore: &IgnoreList,
) -> Result<Vec<PathBuf>, PackageError> {
    let mut files = Vec::new();

    for dir in dirs {
        let base = root.join(dir);
        if !base.is_dir() {
            continue;
        }
        for entry in WalkDir::new(&base).sort_by_file_name() {
            let entry = entry.map_err(|source| PackageError::Walk {
                path: base.clone(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            if ignore.is_ignored(relative) {
                tracing::debug!(file = %relative.display(), "ignored by {IGNORE_FILENAME}");
                continue;
            }
            files.push(relative.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}
