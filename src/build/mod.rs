// ABOUTME: Build orchestration: manifest, toolchain, then package archive.
// ABOUTME: Runs strictly in order and stops at the first failure.

mod error;

pub use error::BuildError;

use nonempty::NonEmpty;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::LanguageConfig;
use crate::diagnostics::Diagnostics;
use crate::exec::ProcessRunner;
use crate::manifest::{MANIFEST_FILENAME, Manifest, manifest_filename};
use crate::output::Output;
use crate::package::{
    Artifact, BIN_DIR, BINARY_ENTRY, IgnoreList, PKG_DIR, collect_files, create_archive_as,
    default_package_path, validate_package,
};
use crate::prompt::Interaction;
use crate::toolchain::{self, BuildContext, Language, ToolchainError};

/// Options for one build, mostly from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Project root. Defaults to the current directory.
    pub dir: Option<PathBuf>,
    /// Package the source directory and `bin/` alongside the required files.
    pub include_source: bool,
    /// Overrides the manifest's `language`.
    pub language: Option<String>,
    /// Overrides the manifest's `name`.
    pub package_name: Option<String>,
    /// Build script timeout. Zero means none.
    pub timeout: Option<Duration>,
    /// Manifest environment: `stage` reads `fastly.stage.toml`.
    pub env: Option<String>,
}

/// Build the project and package it as `pkg/<name>.tar.gz`.
pub async fn build_package(
    opts: &BuildOptions,
    languages: &LanguageConfig,
    runner: &ProcessRunner,
    interaction: &Interaction,
    out: &Output,
    diag: &mut Diagnostics,
) -> Result<Artifact, BuildError> {
    let root = resolve_root(opts.dir.as_deref())?;
    out.verbose(&format!("Project directory: {}", root.display()));

    let env = opts.env.as_deref();
    let manifest_file = manifest_filename(env);
    if manifest_file != MANIFEST_FILENAME {
        out.verbose(&format!(
            "Using the '{manifest_file}' configuration in place of {MANIFEST_FILENAME}"
        ));
    }
    out.progress(&format!("Verifying {manifest_file}..."));
    let manifest = Manifest::discover(&root, env)?;

    let name = resolve_package_name(opts.package_name.as_deref(), &manifest)?;
    let language = resolve_language(opts.language.as_deref(), &manifest)?;
    tracing::debug!(%language, package = %name, "resolved build inputs");

    let ctx = BuildContext::new(&root, runner.clone(), interaction.clone())
        .with_manifest(&manifest)
        .with_timeout(opts.timeout);
    let toolchain = toolchain::select(language, ctx, languages);

    let bin = root.join(BIN_DIR);
    std::fs::create_dir_all(&bin).map_err(|source| BuildError::BinDir { path: bin, source })?;

    toolchain.verify(out, diag).await;
    toolchain.build(out).await?;

    let mut files = NonEmpty::new(PathBuf::from(MANIFEST_FILENAME));
    files.push(Path::new(BIN_DIR).join(BINARY_ENTRY));
    if opts.include_source {
        let ignore = IgnoreList::load(&root)?;
        let source_dir = toolchain.source_directory();
        let sources: Vec<PathBuf> =
            collect_files(&root, &[source_dir, Path::new(BIN_DIR)], &ignore)?
                .into_iter()
                .filter(|f| !f.starts_with(PKG_DIR) && !files.contains(f))
                .collect();
        files.extend(sources);
        out.verbose(&format!("Including {} files in package", files.len()));
    }

    out.progress("Creating package archive...");
    // the selected environment manifest is always packaged as fastly.toml
    let entries = files.map(|file| {
        let source = if file == Path::new(MANIFEST_FILENAME) {
            PathBuf::from(&manifest_file)
        } else {
            file.clone()
        };
        (source, file)
    });
    let destination = root.join(default_package_path(&name));
    create_archive_as(&root, &entries, &destination)?;
    let artifact = validate_package(&destination)?;

    out.success(&format!(
        "Built package ({})",
        default_package_path(&name).display()
    ));
    Ok(artifact)
}

fn resolve_root(dir: Option<&Path>) -> Result<PathBuf, BuildError> {
    let path = match dir {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from("."),
    };
    let root = std::fs::canonicalize(&path)
        .map_err(|source| BuildError::ProjectDir { path, source })?;
    if !root.is_dir() {
        return Err(BuildError::ProjectDir {
            path: root,
            source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        });
    }
    Ok(root)
}

/// Flag, then manifest name, made safe for use as a file name.
pub fn resolve_package_name(flag: Option<&str>, manifest: &Manifest) -> Result<String, BuildError> {
    let raw = flag
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| manifest.name())
        .ok_or(BuildError::MissingPackageName)?;
    let name = sanitize_package_name(raw);
    if name.is_empty() {
        return Err(BuildError::MissingPackageName);
    }
    Ok(name)
}

/// Flag, then manifest language.
pub fn resolve_language(flag: Option<&str>, manifest: &Manifest) -> Result<Language, BuildError> {
    let id = flag
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| manifest.language())
        .ok_or(ToolchainError::MissingLanguage)?;
    Ok(id.parse()?)
}

/// Replace separators with `-` and drop anything that is not alphanumeric, `-` or `.`.
pub fn sanitize_package_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    for c in name.chars() {
        let mapped = match c {
            ' ' | '&' | '_' | '=' | '+' | ':' | '/' | '\\' => '-',
            c if c.is_alphanumeric() || c == '-' || c == '.' => c,
            _ => continue,
        };
        if mapped == '-' && sanitized.ends_with('-') {
            continue;
        }
        sanitized.push(mapped);
    }
    sanitized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitizes_separators_and_symbols() {
        assert_eq!(sanitize_package_name("my app/v2"), "my-app-v2");
        assert_eq!(sanitize_package_name("edge__svc!"), "edge-svc");
        assert_eq!(sanitize_package_name("hello.world"), "hello.world");
    }

    #[test]
    fn flag_overrides_manifest_name() {
        let manifest = Manifest::from_toml("name = \"from-manifest\"").unwrap();
        assert_eq!(
            resolve_package_name(Some("from-flag"), &manifest).unwrap(),
            "from-flag"
        );
        assert_eq!(
            resolve_package_name(None, &manifest).unwrap(),
            "from-manifest"
        );
    }

    #[test]
    fn missing_name_is_an_error() {
        let manifest = Manifest::default();
        let err = resolve_package_name(None, &manifest).unwrap_err();
        assert_eq!(err.to_string(), "package name is missing");
        assert!(err.remediation().is_some());
    }

    #[test]
    fn missing_language_is_an_error() {
        let manifest = Manifest::from_toml("name = \"app\"").unwrap();
        let err = resolve_language(None, &manifest).unwrap_err();
        assert_eq!(
            err.to_string(),
            "language cannot be empty, please provide a language"
        );
    }

    #[test]
    fn language_flag_wins() {
        let manifest = Manifest::from_toml("language = \"rust\"").unwrap();
        assert_eq!(
            resolve_language(Some("go"), &manifest).unwrap(),
            Language::Go
        );
    }
}
