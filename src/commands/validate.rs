// ABOUTME: Validate command implementation.
// ABOUTME: Checks that a package archive is deployable.

use edgeship::error::Result;
use edgeship::package::validate_package;
use std::path::Path;

use super::Context;

pub fn validate(package: &Path, ctx: &Context) -> Result<()> {
    let artifact = validate_package(package)?;
    tracing::debug!(entries = artifact.entries().len(), size = artifact.size(), "package valid");
    ctx.output
        .success(&format!("Validated package {}", package.display()));
    Ok(())
}
