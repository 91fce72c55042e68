// ABOUTME: Library root for edgeship - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod build;
pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod exec;
pub mod manifest;
pub mod output;
pub mod package;
pub mod prompt;
pub mod toolchain;
pub mod undo;
