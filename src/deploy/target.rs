// ABOUTME: Resolves which service and version a deploy operates on.
// ABOUTME: Active or locked versions are cloned before anything is attached.

use std::fmt;
use std::str::FromStr;

use super::DeployError;
use crate::api::{ApiError, ServiceApi, ServiceId, Version, WASM_SERVICE_TYPE};
use crate::output::Output;

/// Which version of an existing service to deploy to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionSelector {
    #[default]
    Latest,
    Active,
    Number(u32),
}

impl FromStr for VersionSelector {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "latest" => Ok(VersionSelector::Latest),
            "active" => Ok(VersionSelector::Active),
            other => other
                .parse()
                .map(VersionSelector::Number)
                .map_err(|_| DeployError::InvalidVersion(s.to_string())),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => f.write_str("latest"),
            VersionSelector::Active => f.write_str("active"),
            VersionSelector::Number(n) => write!(f, "{n}"),
        }
    }
}

impl VersionSelector {
    pub fn select<'v>(&self, versions: &'v [Version]) -> Option<&'v Version> {
        match self {
            VersionSelector::Latest => versions.iter().max_by_key(|v| v.number),
            VersionSelector::Active => versions.iter().find(|v| v.active),
            VersionSelector::Number(n) => versions.iter().find(|v| v.number == *n),
        }
    }
}

/// The remote service and the editable version being deployed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub service_id: ServiceId,
    pub version: Version,
    /// The service was created by this deploy.
    pub new_service: bool,
    /// The version was cloned from an active or locked one.
    pub cloned_from: Option<u32>,
}

impl ServiceTarget {
    pub fn fresh(service_id: ServiceId) -> Self {
        Self {
            service_id,
            version: Version::new(1),
            new_service: true,
            cloned_from: None,
        }
    }

    pub fn number(&self) -> u32 {
        self.version.number
    }

    /// Tag an API failure with this target.
    pub fn remote(
        &self,
        step: &'static str,
    ) -> impl FnOnce(ApiError) -> DeployError + use<> {
        let service_id = self.service_id.clone();
        let version = self.version.number;
        move |source| DeployError::Remote {
            step,
            service_id,
            version,
            source,
        }
    }

    /// Replace the version with an editable clone if it is active or locked.
    pub async fn ensure_editable(
        &mut self,
        api: &dyn ServiceApi,
        out: &Output,
    ) -> Result<(), DeployError> {
        if self.version.is_editable() {
            return Ok(());
        }
        let from = self.version.number;
        let cloned = api
            .clone_version(&self.service_id, from)
            .await
            .map_err(self.remote("cloning service version"))?;
        out.verbose(&format!(
            "Service version {from} is not editable, so it was automatically cloned. Now operating on version {}.",
            cloned.number
        ));
        tracing::debug!(service_id = %self.service_id, from, to = cloned.number, "cloned version");
        self.version = cloned;
        self.version.locked = false;
        self.cloned_from = Some(from);
        Ok(())
    }
}

/// Resolve the requested version of an existing service and make it editable.
pub async fn resolve_existing(
    api: &dyn ServiceApi,
    service_id: ServiceId,
    selector: VersionSelector,
    out: &Output,
) -> Result<ServiceTarget, DeployError> {
    let versions = api
        .list_versions(&service_id)
        .await
        .map_err(|source| DeployError::Remote {
            step: "listing service versions",
            service_id: service_id.clone(),
            version: 0,
            source,
        })?;
    let version = selector
        .select(&versions)
        .cloned()
        .ok_or_else(|| DeployError::VersionNotFound {
            service_id: service_id.clone(),
            selector: selector.to_string(),
        })?;

    let mut target = ServiceTarget {
        service_id,
        version,
        new_service: false,
        cloned_from: None,
    };

    let details = api
        .get_service_details(&target.service_id)
        .await
        .map_err(target.remote("fetching service details"))?;
    if details.service_type != WASM_SERVICE_TYPE {
        return Err(DeployError::InvalidServiceType {
            service_id: target.service_id,
            service_type: details.service_type,
        });
    }

    target.ensure_editable(api, out).await?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions() -> Vec<Version> {
        let mut active = Version::new(2);
        active.active = true;
        vec![Version::new(1), active, Version::new(3)]
    }

    #[test]
    fn parses_selectors() {
        assert_eq!("latest".parse::<VersionSelector>().unwrap(), VersionSelector::Latest);
        assert_eq!("Active".parse::<VersionSelector>().unwrap(), VersionSelector::Active);
        assert_eq!("7".parse::<VersionSelector>().unwrap(), VersionSelector::Number(7));
        assert!(matches!(
            "seven".parse::<VersionSelector>(),
            Err(DeployError::InvalidVersion(_))
        ));
    }

    #[test]
    fn selects_versions() {
        let versions = versions();
        assert_eq!(VersionSelector::Latest.select(&versions).unwrap().number, 3);
        assert_eq!(VersionSelector::Active.select(&versions).unwrap().number, 2);
        assert!(VersionSelector::Number(9).select(&versions).is_none());
    }
}
