// ABOUTME: package.json helpers shared by the JavaScript and AssemblyScript toolchains.
// ABOUTME: Detects declared dependencies and checks the install state.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::diagnostics::{Diagnostics, Warning};

#[derive(Debug, Default, Deserialize)]
struct PackageJson {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,

    #[serde(default, rename = "devDependencies")]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

fn read_package_json(root: &Path) -> Option<PackageJson> {
    let content = std::fs::read_to_string(root.join("package.json")).ok()?;
    match serde_json::from_str(&content) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!("failed to parse package.json: {e}");
            None
        }
    }
}

/// True when package.json declares `name` as a dependency or dev dependency.
pub(crate) fn declares_dependency(root: &Path, name: &str) -> bool {
    read_package_json(root).is_some_and(|pkg| {
        pkg.dependencies.contains_key(name) || pkg.dev_dependencies.contains_key(name)
    })
}

/// Warn about a missing package manager, package.json, dependency, or install.
pub(crate) fn verify_project(
    root: &Path,
    package_manager: &str,
    required: &str,
    diag: &mut Diagnostics,
) {
    if which::which(package_manager).is_err() {
        diag.warn(Warning::missing_tool(format!(
            "`{package_manager}` not found in $PATH"
        )));
    }

    let Some(pkg) = read_package_json(root) else {
        diag.warn(Warning::missing_tool(
            "package.json not found or unreadable in the project root",
        ));
        return;
    };

    if !pkg.dependencies.contains_key(required) && !pkg.dev_dependencies.contains_key(required) {
        diag.warn(Warning::missing_tool(format!(
            "`{required}` is not declared in package.json"
        )));
    }

    if !root.join("node_modules").is_dir() {
        diag.warn(Warning::missing_tool(format!(
            "node_modules not found; run `{package_manager} install`"
        )));
    }
}
