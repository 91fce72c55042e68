// ABOUTME: Publish command implementation.
// ABOUTME: Builds the package, then deploys exactly the archive that was built.

use edgeship::diagnostics::Diagnostics;
use edgeship::error::Result;

use super::Context;
use super::build::build_with_signals;
use super::deploy::{options, run};
use crate::cli::PublishArgs;

pub async fn publish(args: &PublishArgs, ctx: &Context) -> Result<()> {
    let mut diag = Diagnostics::default();
    let built = build_with_signals(&args.build, ctx, &mut diag).await;
    ctx.output.warnings(&diag);
    let artifact = built?;

    let root = match &args.build.dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let mut opts = options(&args.deploy, root, ctx)?;
    opts.env = args.build.env.clone();
    if opts.package.is_none() {
        opts.package = Some(artifact.path().to_path_buf());
    }

    ctx.output.info("Deploying the built package");
    run(&opts, ctx).await
}
