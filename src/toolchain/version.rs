// ABOUTME: Advisory toolchain presence and version constraint checks.
// ABOUTME: Mismatches become warnings; the declared build script may still succeed.

use semver::{Version, VersionReq};

use super::BuildContext;
use crate::diagnostics::{Diagnostics, Warning};

/// Checks that `tool` is on PATH and that its reported version satisfies `constraint`.
#[derive(Debug, Clone, Copy)]
pub struct VersionCheck<'a> {
    pub tool: &'a str,
    pub version_args: &'a [&'a str],
    pub constraint: &'a str,
}

impl VersionCheck<'_> {
    /// Compare the version found in `output` against the constraint.
    ///
    /// Returns a warning message when the constraint is not met or cannot be evaluated.
    pub fn evaluate(&self, output: &str) -> Option<String> {
        let req = match VersionReq::parse(self.constraint) {
            Ok(req) => req,
            Err(e) => {
                return Some(format!(
                    "invalid {} version constraint '{}': {e}",
                    self.tool, self.constraint
                ));
            }
        };
        let Some(version) = parse_version(output) else {
            return Some(format!(
                "unable to determine {} version from output: {}",
                self.tool,
                output.trim()
            ));
        };
        if req.matches(&version) {
            tracing::debug!(tool = self.tool, %version, constraint = self.constraint, "toolchain version ok");
            None
        } else {
            Some(format!(
                "{} version {version} does not satisfy the constraint '{}'; the build may fail",
                self.tool, self.constraint
            ))
        }
    }

    pub(crate) async fn run(&self, ctx: &BuildContext, diag: &mut Diagnostics) {
        if which::which(self.tool).is_err() {
            diag.warn(Warning::missing_tool(format!(
                "`{}` not found in $PATH",
                self.tool
            )));
            return;
        }
        let Some(output) = ctx.capture(self.tool, self.version_args).await else {
            diag.warn(Warning::toolchain_constraint(format!(
                "failed to query {} version",
                self.tool
            )));
            return;
        };
        if let Some(message) = self.evaluate(&output) {
            diag.warn(Warning::toolchain_constraint(message));
        }
    }
}

/// Extract the first `major.minor[.patch]` version in tool output.
///
/// Handles `go1.21.3`-style prefixes and drops pre-release suffixes so nightly
/// builds compare by their release numbers.
pub fn parse_version(output: &str) -> Option<Version> {
    output.split_whitespace().find_map(|token| {
        let token = token
            .strip_prefix("go")
            .or_else(|| token.strip_prefix('v'))
            .unwrap_or(token);
        let numeric: String = token
            .chars()
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        let parts: Vec<u64> = numeric
            .split('.')
            .filter(|p| !p.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [major, minor] => Some(Version::new(*major, *minor, 0)),
            [major, minor, patch, ..] => Some(Version::new(*major, *minor, *patch)),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_tool_output() {
        assert_eq!(
            parse_version("rustc 1.79.0 (129f3b996 2024-06-10)"),
            Some(Version::new(1, 79, 0))
        );
        assert_eq!(
            parse_version("go version go1.21.3 linux/amd64"),
            Some(Version::new(1, 21, 3))
        );
        assert_eq!(
            parse_version("tinygo version 0.30.0 linux/amd64 (using go version go1.21.3)"),
            Some(Version::new(0, 30, 0))
        );
        assert_eq!(
            parse_version("rustc 1.81.0-nightly (abc 2024-06-01)"),
            Some(Version::new(1, 81, 0))
        );
        assert_eq!(parse_version("no version here"), None);
    }

    #[test]
    fn mismatch_produces_message() {
        let check = VersionCheck {
            tool: "rustc",
            version_args: &["--version"],
            constraint: ">=1.78.0",
        };
        assert!(check.evaluate("rustc 1.80.1").is_none());
        let message = check.evaluate("rustc 1.70.0").unwrap();
        assert!(message.contains("does not satisfy"));
    }

    #[test]
    fn partial_constraint_is_accepted() {
        let check = VersionCheck {
            tool: "go",
            version_args: &["version"],
            constraint: ">=1.21",
        };
        assert!(check.evaluate("go version go1.22.0 darwin/arm64").is_none());
    }
}
