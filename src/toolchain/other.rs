// ABOUTME: Toolchain for languages without built-in support.
// ABOUTME: Runs the manifest's build script and nothing else.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{BuildContext, Language, Toolchain, ToolchainError, sealed};
use crate::diagnostics::Diagnostics;
use crate::output::Output;

pub struct Other {
    ctx: BuildContext,
    source_directory: PathBuf,
}

impl Other {
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

impl sealed::Sealed for Other {}

#[async_trait]
impl Toolchain for Other {
    fn language(&self) -> Language {
        Language::Other
    }

    fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    fn default_build_script(&self) -> Option<String> {
        None
    }

    async fn verify(&self, _out: &Output, _diag: &mut Diagnostics) {}

    async fn build(&self, out: &Output) -> Result<(), ToolchainError> {
        let Some((script, _)) = self.ctx.resolve_script(None) else {
            return Err(ToolchainError::NoBuildScript);
        };
        self.ctx.build_with(&script, out, || Ok(())).await
    }
}
