// ABOUTME: hash-files and hashsum command implementations.
// ABOUTME: Both build the package first unless --package or --skip-build is given.

use edgeship::build::resolve_package_name;
use edgeship::diagnostics::Diagnostics;
use edgeship::error::Result;
use edgeship::manifest::Manifest;
use edgeship::package::{default_package_path, files_hash, package_hash};
use std::path::PathBuf;

use super::Context;
use super::build::build_with_signals;
use crate::cli::HashArgs;

pub async fn hash_files(args: &HashArgs, ctx: &Context) -> Result<()> {
    let package = package_path(args, ctx).await?;
    let hash = files_hash(&package)?;
    ctx.output.success(&hash);
    Ok(())
}

pub async fn hashsum(args: &HashArgs, ctx: &Context) -> Result<()> {
    ctx.output
        .warning("hashsum is deprecated and will be removed; use hash-files instead");
    let package = package_path(args, ctx).await?;
    let hash = package_hash(&package)?;
    ctx.output.success(&hash);
    Ok(())
}

async fn package_path(args: &HashArgs, ctx: &Context) -> Result<PathBuf> {
    if let Some(package) = &args.package {
        return Ok(package.clone());
    }
    if args.skip_build {
        let root = match &args.build.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        let manifest = Manifest::discover(&root, args.build.env.as_deref())?;
        let name = resolve_package_name(args.build.package_name.as_deref(), &manifest)?;
        return Ok(root.join(default_package_path(&name)));
    }

    let mut diag = Diagnostics::default();
    let result = build_with_signals(&args.build, ctx, &mut diag).await;
    ctx.output.warnings(&diag);
    Ok(result?.path().to_path_buf())
}
