// ABOUTME: Build script execution shared by every toolchain.
// ABOUTME: Runs the build, checks bin/main.wasm, then runs the confirmed post-build step.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::ToolchainError;
use crate::exec::{CommandSpec, ProcessRunner};
use crate::manifest::{Manifest, PackageManager};
use crate::output::{Output, OutputMode};
use crate::package::{BIN_DIR, BINARY_ENTRY};
use crate::prompt::Interaction;

const WASM_MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

/// Everything a toolchain needs for one build, resolved once up front.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub root: PathBuf,
    pub build_script: Option<String>,
    pub post_build_script: Option<String>,
    pub env_vars: Vec<(String, String)>,
    pub timeout: Option<Duration>,
    pub source_directory: Option<PathBuf>,
    pub package_manager: PackageManager,
    pub runner: ProcessRunner,
    pub interaction: Interaction,
}

impl BuildContext {
    pub fn new(root: impl Into<PathBuf>, runner: ProcessRunner, interaction: Interaction) -> Self {
        Self {
            root: root.into(),
            build_script: None,
            post_build_script: None,
            env_vars: Vec::new(),
            timeout: None,
            source_directory: None,
            package_manager: PackageManager::default(),
            runner,
            interaction,
        }
    }

    /// Take scripts, environment, and overrides from the project manifest.
    pub fn with_manifest(mut self, manifest: &Manifest) -> Self {
        self.build_script = manifest.build_script().map(str::to_string);
        self.post_build_script = manifest.post_build_script().map(str::to_string);
        self.env_vars = manifest.env_vars();
        self.source_directory = manifest.source_directory().map(PathBuf::from);
        self.package_manager = manifest.scripts.package_manager;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn binary_path(&self) -> PathBuf {
        self.root.join(BIN_DIR).join(BINARY_ENTRY)
    }

    /// The declared build script, else `default`. The flag is true for the default.
    pub(crate) fn resolve_script(&self, default: Option<String>) -> Option<(String, bool)> {
        match &self.build_script {
            Some(script) => Some((script.clone(), false)),
            None => default.map(|d| (d, true)),
        }
    }

    /// Run a one-off command in the project root and return its output.
    pub(crate) async fn capture(&self, program: &str, args: &[&str]) -> Option<String> {
        let spec = CommandSpec::new(program)
            .args(args.iter().copied())
            .current_dir(&self.root);
        match self.runner.run(&spec, &mut std::io::sink()).await {
            Ok(output) => Some(output.output),
            Err(e) => {
                tracing::debug!("`{}` failed: {e}", spec.display());
                None
            }
        }
    }

    async fn run_stage(
        &self,
        stage: &'static str,
        script: &str,
        out: &Output,
    ) -> Result<(), ToolchainError> {
        let spec = CommandSpec::shell(script)
            .envs(self.env_vars.iter().cloned())
            .current_dir(&self.root)
            .timeout(self.timeout)
            .verbose(out.is_verbose());

        out.progress(&format!("Running {stage}..."));
        let mut sink = sink_for(out);
        self.runner
            .run(&spec, &mut *sink)
            .await
            .map_err(|source| ToolchainError::Script { stage, source })?;
        Ok(())
    }

    /// Run `script`, then `after_script`, then verify the binary and run post-build.
    pub(crate) async fn build_with<F>(
        &self,
        script: &str,
        out: &Output,
        after_script: F,
    ) -> Result<(), ToolchainError>
    where
        F: FnOnce() -> Result<(), ToolchainError> + Send,
    {
        out.verbose(&format!("Build script to execute: sh -c {script:?}"));
        if !self.env_vars.is_empty() {
            let rendered: Vec<String> =
                self.env_vars.iter().map(|(k, v)| format!("{k}={v}")).collect();
            out.verbose(&format!("Build environment variables set: {}", rendered.join(" ")));
        }

        self.run_stage("[scripts.build]", script, out).await?;
        after_script()?;

        let binary = self.binary_path();
        if !binary.is_file() {
            return Err(ToolchainError::MissingBinary(binary));
        }
        let version = validate_wasm(&binary)?;
        out.verbose(&format!("Wasm module 'version': {version}"));

        if let Some(post_build) = &self.post_build_script {
            if !self.interaction.skips_confirmations() {
                out.progress(&format!(
                    "This project has a custom post_build script defined in the fastly.toml manifest:\n\n{post_build}\n"
                ));
                if !self
                    .interaction
                    .confirm("Do you want to run this now?", false)?
                {
                    return Err(ToolchainError::PostBuildStopped);
                }
            }
            self.run_stage("[scripts.post_build]", post_build, out).await?;
        }

        Ok(())
    }
}

fn sink_for(out: &Output) -> Box<dyn Write + Send> {
    match out.mode() {
        OutputMode::Normal => Box::new(std::io::stdout()),
        OutputMode::Quiet | OutputMode::Json => Box::new(std::io::stderr()),
    }
}

/// Check the Wasm magic number and return the module version.
pub fn validate_wasm(path: &Path) -> Result<u32, ToolchainError> {
    let invalid = |reason: String| ToolchainError::InvalidBinary {
        path: path.to_path_buf(),
        reason,
    };

    let mut header = [0u8; 8];
    let mut file = std::fs::File::open(path).map_err(|e| invalid(e.to_string()))?;
    file.read_exact(&mut header)
        .map_err(|_| invalid("file is too short".to_string()))?;

    if header[..4] != WASM_MAGIC {
        return Err(invalid(format!("unexpected magic: {:02x?}", &header[..4])));
    }
    Ok(u32::from_le_bytes([header[4], header[5], header[6], header[7]]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_module_header_returns_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.wasm");
        std::fs::write(&path, [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00]).unwrap();
        assert_eq!(validate_wasm(&path).unwrap(), 1);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.wasm");
        std::fs::write(&path, b"not wasm at all").unwrap();
        let err = validate_wasm(&path).unwrap_err();
        assert!(err.to_string().contains("unexpected magic"));
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.wasm");
        std::fs::write(&path, [0x00, 0x61]).unwrap();
        assert!(validate_wasm(&path).is_err());
    }

    #[test]
    fn declared_script_wins_over_default() {
        let mut ctx = BuildContext::new("/p", ProcessRunner::new(), Interaction::non_interactive());
        assert_eq!(
            ctx.resolve_script(Some("make".to_string())),
            Some(("make".to_string(), true))
        );
        ctx.build_script = Some("just build".to_string());
        assert_eq!(
            ctx.resolve_script(Some("make".to_string())),
            Some(("just build".to_string(), false))
        );
        ctx.build_script = None;
        assert_eq!(ctx.resolve_script(None), None);
    }
}
