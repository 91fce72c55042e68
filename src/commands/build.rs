// ABOUTME: Build command implementation.
// ABOUTME: Forwards signals to the build script while the package is built.

use edgeship::build::{BuildOptions, build_package};
use edgeship::diagnostics::Diagnostics;
use edgeship::error::Result;
use edgeship::exec::{ProcessRunner, forward_signals};
use edgeship::package::Artifact;
use std::time::Duration;

use super::Context;
use crate::cli::BuildArgs;

pub async fn build(args: &BuildArgs, ctx: &Context) -> Result<()> {
    let mut diag = Diagnostics::default();
    let result = build_with_signals(args, ctx, &mut diag).await;
    ctx.output.warnings(&diag);
    result.map(|_| ())
}

/// Build the package, forwarding SIGINT/SIGTERM to the running script.
pub(super) async fn build_with_signals(
    args: &BuildArgs,
    ctx: &Context,
    diag: &mut Diagnostics,
) -> Result<Artifact> {
    let opts = BuildOptions {
        dir: args.dir.clone(),
        include_source: args.include_source,
        language: args.language.clone(),
        package_name: args.package_name.clone(),
        timeout: args
            .timeout
            .map(Duration::from_secs)
            .or(ctx.config.build.timeout),
        env: args.env.clone(),
    };

    let runner = ProcessRunner::new();
    let signals = forward_signals(runner.clone())?;
    let result = build_package(
        &opts,
        &ctx.config.language,
        &runner,
        &ctx.interaction,
        &ctx.output,
        diag,
    )
    .await;
    signals.abort();

    Ok(result?)
}
