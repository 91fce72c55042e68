// ABOUTME: Deploy orchestration: resolve the target, set up resources, upload, activate.
// ABOUTME: A service created by this deploy is deleted again if a later step fails.

mod availability;
mod error;
mod package;
mod setup;
mod target;

pub use availability::{
    Availability, AvailabilityCheck, DEFAULT_STATUS_PATH, DEFAULT_STATUS_TIMEOUT,
};
pub use error::{AUTH_REMEDIATION, DeployError};
pub use package::{LocalPackage, resolve_package, upload_if_changed};
pub use setup::{
    DEFAULT_TOP_LEVEL_DOMAIN, PlanInputs, PlannedConfigStore, PlannedKvStore, PlannedSecretStore,
    SetupPlan, backend_for, domains_missing, generate_domain_name, is_valid_domain,
};
pub use target::{ServiceTarget, VersionSelector, resolve_existing};

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{ApiError, ApiToken, ServiceApi, ServiceId};
use crate::diagnostics::{Diagnostics, Warning};
use crate::manifest::set_service_id;
use crate::output::Output;
use crate::prompt::Interaction;
use crate::undo::{UndoError, UndoStack};

const MANAGE_SERVICE_URL: &str = "https://manage.fastly.com/configure/services/";

/// Options for one deploy, mostly from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Project root holding fastly.toml and pkg/.
    pub root: PathBuf,
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub version: VersionSelector,
    /// Explicit package archive instead of `pkg/<name>.tar.gz`.
    pub package: Option<PathBuf>,
    pub comment: Option<String>,
    pub domain: Option<String>,
    /// `None` disables the availability check.
    pub status_check: Option<AvailabilityCheck>,
    /// Manifest environment: `stage` reads and updates `fastly.stage.toml`.
    pub env: Option<String>,
}

/// How a deploy finished without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    Deployed {
        service_id: ServiceId,
        version: u32,
        domain: Option<String>,
    },
    /// The version already holds this package.
    Skipped { service_id: ServiceId, version: u32 },
    /// The user chose not to create a service.
    Declined,
}

type SharedApi = Arc<dyn ServiceApi>;

/// Deploy the project's package.
///
/// `connect` builds the API client once a token is known, so a missing token
/// fails before any client exists.
pub async fn deploy<F>(
    opts: &DeployOptions,
    token: Option<ApiToken>,
    connect: F,
    interaction: &Interaction,
    out: &Output,
    diag: &mut Diagnostics,
) -> Result<DeployOutcome, DeployError>
where
    F: FnOnce(&ApiToken) -> Result<SharedApi, ApiError>,
{
    let token = token.ok_or(DeployError::NoToken)?;
    let package = resolve_package(
        &opts.root,
        opts.env.as_deref(),
        opts.package.as_deref(),
        out,
    )?;
    let api = connect(&token).map_err(DeployError::Connect)?;

    let service_id = resolve_service_id(api.as_ref(), opts, &package, out).await?;

    let mut undo = UndoStack::new();
    let result = run(
        &api,
        opts,
        &package,
        service_id,
        interaction,
        out,
        diag,
        &mut undo,
    )
    .await;

    if let Err(e) = &result {
        if let Some((service_id, version)) = e.service_context() {
            tracing::debug!(%service_id, version, "deploy failed: {e}");
        }
    }
    let report = undo.run_if_error(result.as_ref().err(), diag).await;
    if report.ran > 0 {
        out.info("Cleanup complete");
    }
    result
}

async fn resolve_service_id(
    api: &dyn ServiceApi,
    opts: &DeployOptions,
    package: &LocalPackage,
    out: &Output,
) -> Result<Option<ServiceId>, DeployError> {
    if let Some(id) = opts.service_id.as_deref().filter(|s| !s.trim().is_empty()) {
        out.verbose(&format!("Service ID (via --service-id): {id}"));
        return Ok(Some(ServiceId::new(id.trim())));
    }
    if let Some(name) = opts.service_name.as_deref().filter(|s| !s.trim().is_empty()) {
        let service = api
            .search_service(name)
            .await
            .map_err(|source| DeployError::SearchService {
                name: name.to_string(),
                source,
            })?
            .ok_or_else(|| DeployError::ServiceNameNotFound(name.to_string()))?;
        out.verbose(&format!("Service ID (via --service-name): {}", service.id));
        return Ok(Some(service.id));
    }
    if let Some(id) = package.manifest.service_id() {
        out.verbose(&format!("Service ID (via fastly.toml): {id}"));
        return Ok(Some(ServiceId::new(id)));
    }
    Ok(None)
}

#[allow(clippy::too_many_arguments)]
async fn run(
    api: &SharedApi,
    opts: &DeployOptions,
    package: &LocalPackage,
    service_id: Option<ServiceId>,
    interaction: &Interaction,
    out: &Output,
    diag: &mut Diagnostics,
    undo: &mut UndoStack<'static>,
) -> Result<DeployOutcome, DeployError> {
    let target = match service_id {
        Some(id) => resolve_existing(api.as_ref(), id, opts.version, out).await?,
        None => match create_service(api, package, interaction, out, undo).await? {
            Some(target) => target,
            None => return Ok(DeployOutcome::Declined),
        },
    };

    let missing = domains_missing(api.as_ref(), &target).await?;
    let plan = SetupPlan::configure(
        &PlanInputs {
            setup: &package.manifest.setup,
            new_service: target.new_service,
            domains_missing: missing,
            domain_flag: opts.domain.as_deref(),
            root: &opts.root,
        },
        interaction,
        out,
        diag,
    )?;

    if target.new_service {
        out.info("Processing of the fastly.toml [setup] configuration happens only when there is no existing service. Once a service is created, any further changes to the service or its resources must be made manually.");
    }
    let created_domains = plan.create(api.as_ref(), &target, interaction, out).await?;

    if !upload_if_changed(api.as_ref(), &target, package, out).await? {
        return Ok(DeployOutcome::Skipped {
            version: target.number(),
            service_id: target.service_id,
        });
    }

    if let Some(comment) = opts.comment.as_deref() {
        api.update_version(&target.service_id, target.number(), comment)
            .await
            .map_err(target.remote("setting version comment"))?;
    }

    out.progress("Activating version...");
    api.activate_version(&target.service_id, target.number())
        .await
        .map_err(target.remote("activating version"))?;

    out.info(&format!(
        "Manage this service at {MANAGE_SERVICE_URL}{}",
        target.service_id
    ));

    let domain = match created_domains.into_iter().next() {
        Some(domain) => Some(domain),
        None => api
            .list_domains(&target.service_id, target.number())
            .await
            .ok()
            .and_then(|domains| domains.into_iter().next())
            .map(|d| d.name),
    };
    if let Some(domain) = &domain {
        let display = domain.strip_prefix("*.").unwrap_or(domain);
        out.info(&format!("View this service at https://{display}"));
    }

    if target.new_service
        && let (Some(check), Some(domain)) = (&opts.status_check, &domain)
    {
        check_availability(check, domain, out, diag).await;
    }

    Ok(DeployOutcome::Deployed {
        version: target.number(),
        service_id: target.service_id,
        domain,
    })
}

/// Create a service for a project that has none. `None` means the user declined.
async fn create_service(
    api: &SharedApi,
    package: &LocalPackage,
    interaction: &Interaction,
    out: &Output,
    undo: &mut UndoStack<'static>,
) -> Result<Option<ServiceTarget>, DeployError> {
    if !interaction.skips_confirmations() {
        out.info("There is no service associated with this package. To connect to an existing service add the Service ID to the fastly.toml file, otherwise follow the prompts to create a service now.");
        out.info("Press ^C at any time to quit.");
        if !interaction.confirm("Create new service", false)? {
            return Ok(None);
        }
    }

    let default_name = package.manifest.name().unwrap_or_default();
    let name = interaction.input("Service name", default_name)?;

    out.progress("Creating service...");
    let service = api
        .create_service(&name)
        .await
        .map_err(|source| DeployError::CreateService {
            name: name.clone(),
            source,
        })?;
    tracing::info!(service_id = %service.id, name = %name, "created service");

    let cleanup_api = api.clone();
    let cleanup_id = service.id.clone();
    let cleanup_manifest = package.manifest_path.clone();
    undo.push(format!("delete service {}", service.id), move || async move {
        tracing::info!(service_id = %cleanup_id, "cleaning up service");
        cleanup_api.delete_service(&cleanup_id).await?;
        if let Some(path) = cleanup_manifest {
            set_service_id(&path, None)?;
        }
        Ok::<(), UndoError>(())
    });

    if let Some(path) = &package.manifest_path {
        set_service_id(path, Some(service.id.as_str())).map_err(|source| {
            DeployError::RecordServiceId {
                service_id: service.id.clone(),
                source,
            }
        })?;
    }

    Ok(Some(ServiceTarget::fresh(service.id)))
}

async fn check_availability(
    check: &AvailabilityCheck,
    domain: &str,
    out: &Output,
    diag: &mut Diagnostics,
) {
    let url = check.url(domain);
    out.progress(&format!("Checking service availability at {url}..."));
    match check.poll(domain).await {
        Availability::Ready { status } => {
            out.verbose(&format!("Service responded with status {status}"));
        }
        Availability::TimedOut { last_status } => {
            let last = last_status
                .map(|s| format!(" (last status {s})"))
                .unwrap_or_default();
            diag.warn(Warning::availability(format!(
                "timed out after {}s waiting for {url} to become available{last}; the version is active, but DNS changes can take a few minutes to propagate",
                check.timeout.as_secs()
            )));
        }
        Availability::Unreachable(reason) => {
            diag.warn(Warning::availability(format!(
                "failed to reach {url}: {reason}; the version is active, but DNS changes can take a few minutes to propagate"
            )));
        }
    }
}
