// ABOUTME: Deploy command implementation.
// ABOUTME: Turns flags and config into deploy options and reports the outcome.

use edgeship::api::{ServiceApi, http::HttpServiceApi};
use edgeship::deploy::{AvailabilityCheck, DeployOptions, DeployOutcome, VersionSelector};
use edgeship::diagnostics::Diagnostics;
use edgeship::error::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::Context;
use crate::cli::DeployArgs;

pub async fn deploy(args: &DeployArgs, env: Option<&str>, ctx: &Context) -> Result<()> {
    let root = std::env::current_dir()?;
    let opts = DeployOptions {
        env: env.map(str::to_string),
        ..options(args, root, ctx)?
    };
    run(&opts, ctx).await
}

/// Deploy with resolved options and report the outcome.
pub(super) async fn run(opts: &DeployOptions, ctx: &Context) -> Result<()> {
    let token = ctx.config.resolve_token(ctx.token.as_deref());
    let endpoint = ctx.config.api.endpoint.clone();
    tracing::debug!(%endpoint, root = %opts.root.display(), "starting deploy");

    let mut diag = Diagnostics::default();
    let result = edgeship::deploy::deploy(
        opts,
        token,
        |token| {
            let api = HttpServiceApi::new(&endpoint, token.clone())?;
            Ok(Arc::new(api) as Arc<dyn ServiceApi>)
        },
        &ctx.interaction,
        &ctx.output,
        &mut diag,
    )
    .await;
    ctx.output.warnings(&diag);

    match result? {
        DeployOutcome::Deployed {
            service_id,
            version,
            ..
        } => ctx.output.success(&format!(
            "Deployed package (service {service_id}, version {version})"
        )),
        DeployOutcome::Skipped {
            service_id,
            version,
        } => ctx.output.success(&format!(
            "Package unchanged (service {service_id}, version {version})"
        )),
        DeployOutcome::Declined => ctx.output.info("No service created; nothing deployed"),
    }
    Ok(())
}

pub(super) fn options(args: &DeployArgs, root: PathBuf, ctx: &Context) -> Result<DeployOptions> {
    let version: VersionSelector = args.version.parse()?;

    let status_check = (!args.status_check_off).then(|| {
        let defaults = &ctx.config.status_check;
        AvailabilityCheck {
            expected_status: args.status_check_code,
            path: args
                .status_check_path
                .clone()
                .unwrap_or_else(|| defaults.path.clone()),
            timeout: args
                .status_check_timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..AvailabilityCheck::default()
        }
    });

    Ok(DeployOptions {
        root,
        service_id: args.service_id.clone(),
        service_name: args.service_name.clone(),
        version,
        package: args.package.clone(),
        comment: args.comment.clone(),
        domain: args.domain.clone(),
        status_check,
        env: None,
    })
}
