// ABOUTME: Go toolchain compiling through TinyGo's WASI target.
// ABOUTME: Checks both go and tinygo versions before building.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{BuildContext, Language, Toolchain, ToolchainError, VersionCheck, sealed};
use crate::config::GoConfig;
use crate::diagnostics::Diagnostics;
use crate::output::Output;

const DEFAULT_BUILD: &str = "tinygo build -target=wasi -gc=conservative -o ./bin/main.wasm ./";

pub struct Go {
    ctx: BuildContext,
    config: GoConfig,
    source_directory: PathBuf,
}

impl Go {
    pub fn new(ctx: BuildContext, config: GoConfig) -> Self {
        let source_directory = ctx
            .source_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            ctx,
            config,
            source_directory,
        }
    }
}

impl sealed::Sealed for Go {}

#[async_trait]
impl Toolchain for Go {
    fn language(&self) -> Language {
        Language::Go
    }

    fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    fn default_build_script(&self) -> Option<String> {
        Some(DEFAULT_BUILD.to_string())
    }

    async fn verify(&self, _out: &Output, diag: &mut Diagnostics) {
        VersionCheck {
            tool: "go",
            version_args: &["version"],
            constraint: &self.config.toolchain_constraint,
        }
        .run(&self.ctx, diag)
        .await;

        // only the default build needs tinygo
        if self.ctx.build_script.is_none() {
            VersionCheck {
                tool: "tinygo",
                version_args: &["version"],
                constraint: &self.config.tinygo_constraint,
            }
            .run(&self.ctx, diag)
            .await;
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
        self.ctx.build_with(&script, out, || Ok(())).await
    }
}
