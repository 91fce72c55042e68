// ABOUTME: Error types for language toolchains.
// ABOUTME: Build failures carry a shared remediation checklist.

use std::path::PathBuf;

use crate::exec::ProcessError;
use crate::prompt::PromptError;

pub const BUILD_REMEDIATION: &str = "Here are some steps you can follow to debug the issue:

- Re-run the command with the --verbose flag to see more information.
- Is the required language toolchain (node/npm, rust/cargo etc) installed correctly?
- Is the required version (if any) of the language toolchain installed/activated?
- Were the required dependencies (package.json, Cargo.toml etc) installed?
- Did the build script (see fastly.toml [scripts.build]) produce a ./bin/main.wasm binary file?
- Was there a configured [scripts.post_build] step that needs to be double-checked?";

#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("unsupported language {0}")]
    UnsupportedLanguage(String),

    #[error("language cannot be empty, please provide a language")]
    MissingLanguage,

    #[error("no [scripts.build] defined in fastly.toml for language 'other'")]
    NoBuildScript,

    #[error("error running {stage}: {source}")]
    Script {
        stage: &'static str,
        #[source]
        source: ProcessError,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    CopyBinary {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build did not produce {0}")]
    MissingBinary(PathBuf),

    #[error("{path} is not a valid Wasm module: {reason}")]
    InvalidBinary { path: PathBuf, reason: String },

    #[error("post-build script stopped by user")]
    PostBuildStopped,

    #[error(transparent)]
    Prompt(#[from] PromptError),
}

impl ToolchainError {
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            ToolchainError::UnsupportedLanguage(_) => Some(
                "Set `language` in fastly.toml (or pass --language) to one of: rust, go, javascript, assemblyscript, other.",
            ),
            ToolchainError::MissingLanguage => {
                Some("Add a `language` field to fastly.toml or pass --language.")
            }
            ToolchainError::NoBuildScript => Some(
                "Add a [scripts] build command to fastly.toml that writes ./bin/main.wasm.",
            ),
            ToolchainError::Script { source, .. } if source.is_interrupt() => None,
            ToolchainError::Script { .. }
            | ToolchainError::CopyBinary { .. }
            | ToolchainError::MissingBinary(_)
            | ToolchainError::InvalidBinary { .. } => Some(BUILD_REMEDIATION),
            ToolchainError::PostBuildStopped | ToolchainError::Prompt(_) => None,
        }
    }
}
