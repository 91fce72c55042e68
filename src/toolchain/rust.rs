// ABOUTME: Rust toolchain: cargo build for a WASI target, then copy the binary into bin/.
// ABOUTME: The binary name comes from Cargo.toml rather than a fixed default.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{BuildContext, Language, Toolchain, ToolchainError, VersionCheck, sealed};
use crate::config::RustConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::output::Output;

const DEFAULT_PACKAGE_NAME: &str = "fastly-compute-project";

pub struct Rust {
    ctx: BuildContext,
    config: RustConfig,
    source_directory: PathBuf,
}

#[derive(Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
}

#[derive(Deserialize)]
struct CargoPackage {
    name: String,
}

#[derive(Deserialize)]
struct CargoMetadata {
    target_directory: PathBuf,
}

impl Rust {
    pub fn new(ctx: BuildContext, config: RustConfig) -> Self {
        let source_directory = ctx
            .source_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("src"));
        Self {
            ctx,
            config,
            source_directory,
        }
    }

    /// `[package].name` from Cargo.toml, or a fixed fallback.
    pub fn package_name(&self) -> String {
        std::fs::read_to_string(self.ctx.root.join("Cargo.toml"))
            .ok()
            .and_then(|content| toml::from_str::<CargoManifest>(&content).ok())
            .and_then(|manifest| manifest.package)
            .map(|package| package.name)
            .unwrap_or_else(|| DEFAULT_PACKAGE_NAME.to_string())
    }

    async fn target_directory(&self) -> PathBuf {
        self.ctx
            .capture("cargo", &["metadata", "--format-version", "1", "--no-deps", "--quiet"])
            .await
            .and_then(|output| serde_json::from_str::<CargoMetadata>(&output).ok())
            .map(|metadata| metadata.target_directory)
            .unwrap_or_else(|| self.ctx.root.join("target"))
    }

    fn compiled_binary(&self, target_directory: &Path) -> PathBuf {
        target_directory
            .join(&self.config.wasm_target)
            .join("release")
            .join(format!("{}.wasm", self.package_name()))
    }
}

impl sealed::Sealed for Rust {}

#[async_trait]
impl Toolchain for Rust {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    fn default_build_script(&self) -> Option<String> {
        Some(format!(
            "cargo build --bin {} --release --target {} --color always",
            self.package_name(),
            self.config.wasm_target
        ))
    }

    async fn verify(&self, _out: &Output, diag: &mut Diagnostics) {
        VersionCheck {
            tool: "rustc",
            version_args: &["--version"],
            constraint: &self.config.toolchain_constraint,
        }
        .run(&self.ctx, diag)
        .await;
        if which::which("cargo").is_err() {
            diag.warn(Warning::missing_tool("`cargo` not found in $PATH"));
        }
    }

    async fn build(&self, out: &Output) -> Result<(), ToolchainError> {
        let Some((script, is_default)) = self.ctx.resolve_script(self.default_build_script())
        else {
            return Err(ToolchainError::NoBuildScript);
        };
        if is_default {
            out.verbose(&format!("No [scripts.build] found, using default: {script}"));
        }

        let compiled = self.compiled_binary(&self.target_directory().await);
        let destination = self.ctx.binary_path();
        self.ctx
            .build_with(&script, out, move || {
                // custom scripts may write bin/main.wasm themselves
                if !is_default && !compiled.is_file() {
                    return Ok(());
                }
                if let Some(parent) = destination.parent() {
                    std::fs::create_dir_all(parent).map_err(|source| {
                        ToolchainError::CopyBinary {
                            from: compiled.clone(),
                            to: destination.clone(),
                            source,
                        }
                    })?;
                }
                std::fs::copy(&compiled, &destination).map_err(|source| {
                    ToolchainError::CopyBinary {
                        from: compiled.clone(),
                        to: destination.clone(),
                        source,
                    }
                })?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ProcessRunner;
    use crate::prompt::Interaction;

    fn toolchain(root: &Path) -> Rust {
        Rust::new(
            BuildContext::new(root, ProcessRunner::new(), Interaction::non_interactive()),
            RustConfig::default(),
        )
    }

    #[test]
    fn default_script_uses_cargo_package_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Cargo.toml"),
            "[package]\nname = \"edge-app\"\nversion = \"0.1.0\"\n",
        )
        .unwrap();

        let script = toolchain(dir.path()).default_build_script().unwrap();
        assert_eq!(
            script,
            "cargo build --bin edge-app --release --target wasm32-wasip1 --color always"
        );
    }

    #[test]
    fn missing_cargo_manifest_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(toolchain(dir.path()).package_name(), DEFAULT_PACKAGE_NAME);
    }

    #[test]
    fn compiled_binary_lives_under_target_release() {
        let dir = tempfile::tempdir().unwrap();
        let rust = toolchain(dir.path());
        assert_eq!(
            rust.compiled_binary(Path::new("/t")),
            PathBuf::from("/t/wasm32-wasip1/release/fastly-compute-project.wasm")
        );
    }
}
