// ABOUTME: Per-language toolchain settings for the build command.
// ABOUTME: Version constraints are advisory and only produce warnings.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageConfig {
    #[serde(default)]
    pub rust: RustConfig,

    #[serde(default)]
    pub go: GoConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RustConfig {
    #[serde(default = "default_rust_constraint")]
    pub toolchain_constraint: String,

    #[serde(default = "default_wasm_target")]
    pub wasm_target: String,
}

fn default_rust_constraint() -> String {
    ">=1.78.0".to_string()
}

fn default_wasm_target() -> String {
    "wasm32-wasip1".to_string()
}

impl Default for RustConfig {
    fn default() -> Self {
        RustConfig {
            toolchain_constraint: default_rust_constraint(),
            wasm_target: default_wasm_target(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoConfig {
    #[serde(default = "default_go_constraint")]
    pub toolchain_constraint: String,

    #[serde(default = "default_tinygo_constraint")]
    pub tinygo_constraint: String,
}

fn default_go_constraint() -> String {
    ">=1.21".to_string()
}

fn default_tinygo_constraint() -> String {
    ">=0.28.1".to_string()
}

impl Default for GoConfig {
    fn default() -> Self {
        GoConfig {
            toolchain_constraint: default_go_constraint(),
            tinygo_constraint: default_tinygo_constraint(),
        }
    }
}
