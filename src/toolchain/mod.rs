// ABOUTME: Language toolchains that turn a project into bin/main.wasm.
// ABOUTME: Exports the Toolchain trait, the Language id, and the variant constructors.

mod assemblyscript;
mod error;
mod go;
mod javascript;
mod js;
mod other;
mod rust;
mod script;
mod version;

pub use assemblyscript::AssemblyScript;
pub use error::{BUILD_REMEDIATION, ToolchainError};
pub use go::Go;
pub use javascript::JavaScript;
pub use other::Other;
pub use rust::Rust;
pub use script::{BuildContext, validate_wasm};
pub use version::{VersionCheck, parse_version};

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::LanguageConfig;
use crate::diagnostics::Diagnostics;
use crate::output::Output;

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Go,
    JavaScript,
    AssemblyScript,
    Other,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::AssemblyScript => "assemblyscript",
            Language::Other => "other",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ToolchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = s.trim().to_lowercase();
        match id.as_str() {
            "" => Err(ToolchainError::MissingLanguage),
            "rust" => Ok(Language::Rust),
            "go" | "tinygo" => Ok(Language::Go),
            "javascript" => Ok(Language::JavaScript),
            "assemblyscript" => Ok(Language::AssemblyScript),
            "other" => Ok(Language::Other),
            _ => Err(ToolchainError::UnsupportedLanguage(id)),
        }
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// A language-specific build driver.
///
/// Implementations are closed to this crate; use [`select`] to get one.
#[async_trait]
pub trait Toolchain: sealed::Sealed + Send + Sync {
    fn language(&self) -> Language;

    /// Project-relative directory holding sources, for source inclusion.
    fn source_directory(&self) -> &Path;

    /// The command that runs when the manifest declares no build script.
    fn default_build_script(&self) -> Option<String>;

    /// Best-effort environment check. Problems are recorded as warnings.
    async fn verify(&self, out: &Output, diag: &mut Diagnostics);

    /// Run the build so that `bin/main.wasm` exists and is a Wasm module.
    async fn build(&self, out: &Output) -> Result<(), ToolchainError>;
}

/// Construct the toolchain for `language`.
pub fn select(
    language: Language,
    ctx: BuildContext,
    config: &LanguageConfig,
) -> Box<dyn Toolchain> {
    match language {
        Language::Rust => Box::new(Rust::new(ctx, config.rust.clone())),
        Language::Go => Box::new(Go::new(ctx, config.go.clone())),
        Language::JavaScript => Box::new(JavaScript::new(ctx)),
        Language::AssemblyScript => Box::new(AssemblyScript::new(ctx)),
        Language::Other => Box::new(Other::new(ctx)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_ids_are_case_insensitive() {
        assert_eq!(" Rust ".parse::<Language>().unwrap(), Language::Rust);
        assert_eq!("TinyGo".parse::<Language>().unwrap(), Language::Go);
        assert_eq!(
            "assemblyscript".parse::<Language>().unwrap(),
            Language::AssemblyScript
        );
    }

    #[test]
    fn unknown_language_is_rejected() {
        let err = "cobol".parse::<Language>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported language cobol");
    }

    #[test]
    fn empty_language_is_missing() {
        assert!(matches!(
            "  ".parse::<Language>(),
            Err(ToolchainError::MissingLanguage)
        ));
    }
}
