// ABOUTME: JavaScript toolchain built around js-compute-runtime.
// ABOUTME: The package manager is chosen per project and baked into the default command.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{BuildContext, Language, Toolchain, ToolchainError, js, sealed};
use crate::diagnostics::Diagnostics;
use crate::output::Output;

const RUNTIME_PACKAGE: &str = "@fastly/js-compute";

pub struct JavaScript {
    ctx: BuildContext,
    source_directory: PathBuf,
}

impl JavaScript {
    pub fn new(ctx: BuildContext) -> Self {
        let source_directory = ctx
            .source_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("src"));
        Self {
            ctx,
            source_directory,
        }
    }
}

impl sealed::Sealed for JavaScript {}

#[async_trait]
impl Toolchain for JavaScript {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    fn default_build_script(&self) -> Option<String> {
        let pm = self.ctx.package_manager.as_str();
        if js::declares_dependency(&self.ctx.root, "webpack") {
            Some(format!(
                "{pm} exec webpack && {pm} exec js-compute-runtime ./bin/index.js ./bin/main.wasm"
            ))
        } else {
            Some(format!(
                "{pm} exec js-compute-runtime ./src/index.js ./bin/main.wasm"
            ))
        }
    }

    async fn verify(&self, _out: &Output, diag: &mut Diagnostics) {
        js::verify_project(
            &self.ctx.root,
            self.ctx.package_manager.as_str(),
            RUNTIME_PACKAGE,
            diag,
        );
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
