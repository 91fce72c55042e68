// ABOUTME: AssemblyScript toolchain compiling assembly/index.ts with asc.
// ABOUTME: Shares package.json handling with the JavaScript toolchain.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{BuildContext, Language, Toolchain, ToolchainError, js, sealed};
use crate::diagnostics::Diagnostics;
use crate::output::Output;

pub struct AssemblyScript {
    ctx: BuildContext,
    source_directory: PathBuf,
}

impl AssemblyScript {
    pub fn new(ctx: BuildContext) -> Self {
        let source_directory = ctx
            .source_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("assembly"));
        Self {
            ctx,
            source_directory,
        }
    }
}

impl sealed::Sealed for AssemblyScript {}

#[async_trait]
impl Toolchain for AssemblyScript {
    fn language(&self) -> Language {
        Language::AssemblyScript
    }

    fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    fn default_build_script(&self) -> Option<String> {
        let pm = self.ctx.package_manager.as_str();
        let compile = format!(
            "{pm} exec -- asc assembly/index.ts --outFile bin/main.wasm --optimize --noAssert"
        );
        if js::declares_dependency(&self.ctx.root, "webpack") {
            Some(format!("{pm} exec webpack && {compile}"))
        } else {
            Some(compile)
        }
    }

    async fn verify(&self, _out: &Output, diag: &mut Diagnostics) {
        js::verify_project(
            &self.ctx.root,
            self.ctx.package_manager.as_str(),
            "assemblyscript",
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ProcessRunner;
    use crate::prompt::Interaction;

    #[test]
    fn default_script_compiles_assembly_entrypoint() {
        let dir = tempfile::tempdir().unwrap();
        let toolchain = AssemblyScript::new(BuildContext::new(
            dir.path(),
            ProcessRunner::new(),
            Interaction::non_interactive(),
        ));
        assert_eq!(
            toolchain.default_build_script().unwrap(),
            "npm exec -- asc assembly/index.ts --outFile bin/main.wasm --optimize --noAssert"
        );
        assert_eq!(toolchain.source_directory(), Path::new("assembly"));
    }
}
