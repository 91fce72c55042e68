// ABOUTME: Remote resources a new service needs before activation.
// ABOUTME: Configure decides the resource set from fastly.toml and prompts; create materialises it.

use rand::Rng;
use rand::seq::SliceRandom;
use std::net::IpAddr;
use std::path::Path;

use super::{DeployError, ServiceTarget};
use crate::api::{NewBackend, ServiceApi};
use crate::diagnostics::{Diagnostics, Warning};
use crate::manifest::Setup;
use crate::output::Output;
use crate::prompt::Interaction;

pub const DEFAULT_TOP_LEVEL_DOMAIN: &str = "edgecompute.app";
const ORIGINLESS_NAME: &str = "originless";
const ORIGINLESS_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 80;

const ADJECTIVES: &[&str] = &[
    "amazing", "brave", "calm", "clever", "curious", "daring", "eager", "fancy", "gentle",
    "happy", "humble", "jolly", "keen", "lively", "lucky", "merry", "nimble", "polite", "proud",
    "quick", "quiet", "rapid", "shiny", "solid", "sunny", "swift", "tidy", "vivid", "witty",
    "zesty",
];

const NOUNS: &[&str] = &[
    "badger", "beacon", "breeze", "canyon", "comet", "falcon", "forest", "galaxy", "glacier",
    "harbor", "heron", "island", "lagoon", "lantern", "meadow", "meteor", "otter", "panda",
    "pebble", "quartz", "raven", "river", "summit", "thunder", "tiger", "valley", "walrus",
    "willow", "zebra", "zephyr",
];

/// A random `<adjective>-<noun>-<noun>.edgecompute.app` domain.
pub fn generate_domain_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = ADJECTIVES.choose(rng).copied().unwrap_or("happy");
    let first = NOUNS.choose(rng).copied().unwrap_or("otter");
    let second = NOUNS.choose(rng).copied().unwrap_or("river");
    format!("{adjective}-{first}-{second}.{DEFAULT_TOP_LEVEL_DOMAIN}")
}

/// Hostname check for user-entered domains. A leading `*.` wildcard is allowed.
pub fn is_valid_domain(domain: &str) -> bool {
    let name = domain.strip_prefix("*.").unwrap_or(domain);
    if name.len() > 253 || !name.contains('.') {
        return false;
    }
    name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Override host and SSL hostnames for a backend address.
///
/// IP addresses get none; hostnames use themselves for all three.
pub fn backend_for(name: &str, address: &str, port: u16) -> NewBackend {
    let hostname = address.parse::<IpAddr>().is_err().then(|| address.to_string());
    NewBackend {
        name: name.to_string(),
        address: address.to_string(),
        port,
        override_host: hostname.clone(),
        ssl_cert_hostname: hostname.clone(),
        ssl_sni_hostname: hostname,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedConfigStore {
    pub name: String,
    pub items: Vec<(String, String)>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct PlannedSecretStore {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl std::fmt::Debug for PlannedSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.entries.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("PlannedSecretStore")
            .field("name", &self.name)
            .field("entries", &names)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedKvStore {
    pub name: String,
    pub items: Vec<(String, Vec<u8>)>,
}

/// The resources to create, decided before any of them is created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupPlan {
    pub domains: Vec<String>,
    pub backends: Vec<NewBackend>,
    pub config_stores: Vec<PlannedConfigStore>,
    pub secret_stores: Vec<PlannedSecretStore>,
    pub kv_stores: Vec<PlannedKvStore>,
}

/// True when the target version has no domains yet.
pub async fn domains_missing(
    api: &dyn ServiceApi,
    target: &ServiceTarget,
) -> Result<bool, DeployError> {
    let domains = api
        .list_domains(&target.service_id, target.number())
        .await
        .map_err(target.remote("fetching service domains"))?;
    Ok(domains.is_empty())
}

/// Inputs for [`SetupPlan::configure`].
pub struct PlanInputs<'a> {
    pub setup: &'a Setup,
    pub new_service: bool,
    pub domains_missing: bool,
    pub domain_flag: Option<&'a str>,
    /// Base for relative `file` paths in kv store items.
    pub root: &'a Path,
}

impl SetupPlan {
    /// Decide the final resource set. Domains are planned for any service missing
    /// them; everything else only for a new service.
    pub fn configure(
        inputs: &PlanInputs<'_>,
        interaction: &Interaction,
        out: &Output,
        diag: &mut Diagnostics,
    ) -> Result<Self, DeployError> {
        let mut plan = SetupPlan::default();

        if inputs.domains_missing {
            plan.domains.push(configure_domain(inputs.domain_flag, interaction)?);
        }
        if !inputs.new_service {
            return Ok(plan);
        }

        plan.backends = configure_backends(inputs.setup, interaction, out)?;
        plan.config_stores = configure_config_stores(inputs.setup, interaction, out)?;
        plan.secret_stores = configure_secret_stores(inputs.setup, interaction, out)?;
        plan.kv_stores = configure_kv_stores(inputs.setup, inputs.root, interaction, out)?;

        for (name, endpoint) in &inputs.setup.log_endpoints {
            let provider = endpoint.provider.as_deref().unwrap_or("any supported provider");
            diag.warn(Warning::manual_setup(format!(
                "the package expects a log endpoint named '{name}' ({provider}); create it manually once the service exists"
            )));
        }

        Ok(plan)
    }

    pub fn is_originless(&self) -> bool {
        matches!(self.backends.as_slice(), [only] if only.name == ORIGINLESS_NAME && only.address == ORIGINLESS_ADDRESS)
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
            && self.backends.is_empty()
            && self.config_stores.is_empty()
            && self.secret_stores.is_empty()
            && self.kv_stores.is_empty()
    }

    /// Create every planned resource on the target version, in plan order.
    ///
    /// Returns the domains actually created, which differ from the plan when a
    /// taken domain was replaced.
    pub async fn create(
        &self,
        api: &dyn ServiceApi,
        target: &ServiceTarget,
        interaction: &Interaction,
        out: &Output,
    ) -> Result<Vec<String>, DeployError> {
        let service_id = &target.service_id;
        let version = target.number();

        let mut created_domains = Vec::with_capacity(self.domains.len());
        for domain in &self.domains {
            out.progress(&format!("Creating domain '{domain}'..."));
            match api.create_domain(service_id, version, domain).await {
                Ok(created) => created_domains.push(created.name),
                Err(e) if e.is_domain_taken() => {
                    let default = generate_domain_name(&mut rand::thread_rng());
                    let retry = interaction.input(
                        "Domain already taken, please choose another",
                        &default,
                    )?;
                    if !is_valid_domain(&retry) {
                        return Err(DeployError::InvalidDomain(retry));
                    }
                    out.progress(&format!("Creating domain '{retry}'..."));
                    let created = api
                        .create_domain(service_id, version, &retry)
                        .await
                        .map_err(target.remote("creating domain"))?;
                    created_domains.push(created.name);
                }
                Err(e) => return Err(target.remote("creating domain")(e)),
            }
        }

        let originless = self.is_originless();
        for backend in &self.backends {
            if !originless {
                out.progress(&format!(
                    "Creating backend '{}' (host: {}, port: {})...",
                    backend.name, backend.address, backend.port
                ));
            }
            let step = if originless {
                "configuring the service"
            } else {
                "creating backend"
            };
            api.create_backend(service_id, version, backend)
                .await
                .map_err(target.remote(step))?;
        }

        for store in &self.config_stores {
            out.progress(&format!("Creating config store '{}'...", store.name));
            let created = api
                .create_config_store(&store.name)
                .await
                .map_err(target.remote("creating config store"))?;
            for (key, value) in &store.items {
                out.progress(&format!("Creating config store item '{key}'..."));
                api.create_config_store_item(&created.id, key, value)
                    .await
                    .map_err(target.remote("creating config store item"))?;
            }
            out.progress(&format!(
                "Creating resource link between service and config store '{}'...",
                created.name
            ));
            api.create_resource_link(service_id, version, &created.id.erase(), &created.name)
                .await
                .map_err(target.remote("linking config store"))?;
        }

        for store in &self.secret_stores {
            out.progress(&format!("Creating secret store '{}'...", store.name));
            let created = api
                .create_secret_store(&store.name)
                .await
                .map_err(target.remote("creating secret store"))?;
            for (name, secret) in &store.entries {
                out.progress(&format!("Creating secret store entry '{name}'..."));
                api.create_secret(&created.id, name, secret)
                    .await
                    .map_err(target.remote("creating secret store entry"))?;
            }
            out.progress(&format!(
                "Creating resource link between service and secret store '{}'...",
                created.name
            ));
            api.create_resource_link(service_id, version, &created.id.erase(), &created.name)
                .await
                .map_err(target.remote("linking secret store"))?;
        }

        for store in &self.kv_stores {
            out.progress(&format!("Creating KV Store '{}'...", store.name));
            let created = api
                .create_kv_store(&store.name)
                .await
                .map_err(target.remote("creating kv store"))?;
            for (key, value) in &store.items {
                out.progress(&format!("Creating KV Store key '{key}'..."));
                api.insert_kv_key(&created.id, key, value.clone())
                    .await
                    .map_err(target.remote("creating kv store key"))?;
            }
            out.progress(&format!(
                "Creating resource link between service and KV Store '{}'...",
                created.name
            ));
            api.create_resource_link(service_id, version, &created.id.erase(), &created.name)
                .await
                .map_err(target.remote("linking kv store"))?;
        }

        Ok(created_domains)
    }
}

fn configure_domain(flag: Option<&str>, interaction: &Interaction) -> Result<String, DeployError> {
    if let Some(domain) = flag.map(str::trim).filter(|d| !d.is_empty()) {
        return if is_valid_domain(domain) {
            Ok(domain.to_string())
        } else {
            Err(DeployError::InvalidDomain(domain.to_string()))
        };
    }
    let default = generate_domain_name(&mut rand::thread_rng());
    let domain = interaction.input("Domain", &default)?;
    if !is_valid_domain(&domain) {
        return Err(DeployError::InvalidDomain(domain));
    }
    Ok(domain)
}

fn parse_port(input: &str, default: u16, out: &Output) -> u16 {
    match input.trim().parse::<u16>() {
        Ok(port) if port > 0 => port,
        _ => {
            out.warning(&format!(
                "error converting prompt input, using default port number ({default})"
            ));
            default
        }
    }
}

fn configure_backends(
    setup: &Setup,
    interaction: &Interaction,
    out: &Output,
) -> Result<Vec<NewBackend>, DeployError> {
    if !setup.backends.is_empty() {
        let mut backends = Vec::with_capacity(setup.backends.len());
        for (name, settings) in &setup.backends {
            if !interaction.uses_defaults() {
                out.info(&format!("Configure a backend called '{name}'"));
                if let Some(description) = &settings.description {
                    out.info(description);
                }
            }
            let default_address = settings
                .address
                .as_deref()
                .filter(|a| !a.trim().is_empty())
                .unwrap_or(ORIGINLESS_ADDRESS);
            let address = interaction.input("Hostname or IP address", default_address)?;
            let default_port = settings.port.filter(|p| *p > 0).unwrap_or(DEFAULT_PORT);
            let port = interaction.input("Port", &default_port.to_string())?;
            let port = parse_port(&port, default_port, out);
            backends.push(backend_for(name, &address, port));
        }
        return Ok(backends);
    }

    if interaction.uses_defaults() {
        return Ok(vec![backend_for(ORIGINLESS_NAME, ORIGINLESS_ADDRESS, DEFAULT_PORT)]);
    }

    let mut backends = Vec::new();
    for i in 1.. {
        let address = interaction.input(
            "Backend (hostname or IP address, or leave blank to stop adding backends)",
            "",
        )?;
        if address.is_empty() {
            break;
        }
        let port = interaction.input("Backend port number", &DEFAULT_PORT.to_string())?;
        let port = parse_port(&port, DEFAULT_PORT, out);
        let name = interaction.input("Backend name", &format!("backend_{i}"))?;
        backends.push(backend_for(&name, &address, port));
    }
    if backends.is_empty() {
        backends.push(backend_for(ORIGINLESS_NAME, ORIGINLESS_ADDRESS, DEFAULT_PORT));
    }
    Ok(backends)
}

fn configure_config_stores(
    setup: &Setup,
    interaction: &Interaction,
    out: &Output,
) -> Result<Vec<PlannedConfigStore>, DeployError> {
    let mut stores = Vec::with_capacity(setup.config_stores.len());
    for (name, settings) in &setup.config_stores {
        if !interaction.uses_defaults() {
            out.info(&format!("Configuring config store '{name}'"));
            if let Some(description) = &settings.description {
                out.info(description);
            }
        }
        let mut items = Vec::with_capacity(settings.items.len());
        for (key, item) in &settings.items {
            if !interaction.uses_defaults() {
                out.info(&format!("Create a config store item called '{key}'"));
                if let Some(description) = &item.description {
                    out.info(description);
                }
            }
            let default = item.value.as_deref().unwrap_or_default();
            let value = interaction.input("Value", default)?;
            items.push((key.clone(), value));
        }
        stores.push(PlannedConfigStore {
            name: name.clone(),
            items,
        });
    }
    Ok(stores)
}

fn configure_secret_stores(
    setup: &Setup,
    interaction: &Interaction,
    out: &Output,
) -> Result<Vec<PlannedSecretStore>, DeployError> {
    let mut stores = Vec::with_capacity(setup.secret_stores.len());
    for (name, settings) in &setup.secret_stores {
        if !interaction.uses_defaults() {
            out.info(&format!("Configuring secret store '{name}'"));
            if let Some(description) = &settings.description {
                out.info(description);
            }
        }
        let mut entries = Vec::with_capacity(settings.entries.len());
        for (key, entry) in &settings.entries {
            // secrets have no default, so there is nothing to accept
            let value = if interaction.uses_defaults() {
                String::new()
            } else {
                out.info(&format!("Create a secret store entry called '{key}'"));
                if let Some(description) = &entry.description {
                    out.info(description);
                }
                interaction.secret("Value")?
            };
            if value.is_empty() {
                return Err(DeployError::BlankSecret {
                    store: name.clone(),
                    entry: key.clone(),
                });
            }
            entries.push((key.clone(), value));
        }
        stores.push(PlannedSecretStore {
            name: name.clone(),
            entries,
        });
    }
    Ok(stores)
}

fn configure_kv_stores(
    setup: &Setup,
    root: &Path,
    interaction: &Interaction,
    out: &Output,
) -> Result<Vec<PlannedKvStore>, DeployError> {
    let mut stores = Vec::with_capacity(setup.kv_stores.len());
    for (name, settings) in &setup.kv_stores {
        if !interaction.uses_defaults() {
            out.info(&format!("Configuring KV Store '{name}'"));
            if let Some(description) = &settings.description {
                out.info(description);
            }
        }
        let mut items = Vec::with_capacity(settings.items.len());
        for (key, item) in &settings.items {
            let value = match (&item.value, &item.file) {
                (Some(_), Some(_)) => {
                    return Err(DeployError::KvItemSource {
                        store: name.clone(),
                        key: key.clone(),
                    });
                }
                (None, Some(file)) => {
                    let path = root.join(file);
                    std::fs::read(&path)
                        .map_err(|source| DeployError::KvItemFile { path, source })?
                }
                (value, None) => {
                    if !interaction.uses_defaults() {
                        out.info(&format!("Create a KV Store key called '{key}'"));
                        if let Some(description) = &item.description {
                            out.info(description);
                        }
                    }
                    let default = value.as_deref().unwrap_or_default();
                    interaction.input("Value", default)?.into_bytes()
                }
            };
            items.push((key.clone(), value));
        }
        stores.push(PlannedKvStore {
            name: name.clone(),
            items,
        });
    }
    Ok(stores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::Manifest;
    use crate::output::OutputMode;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn inputs<'a>(setup: &'a Setup, root: &'a Path) -> PlanInputs<'a> {
        PlanInputs {
            setup,
            new_service: true,
            domains_missing: true,
            domain_flag: None,
            root,
        }
    }

    #[test]
    fn generated_domains_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let domain = generate_domain_name(&mut rng);
            assert!(domain.ends_with(".edgecompute.app"));
            assert_eq!(domain.split('.').next().unwrap().split('-').count(), 3);
            assert!(is_valid_domain(&domain));
        }
    }

    #[test]
    fn domain_validation() {
        assert!(is_valid_domain("example.com"));
        assert!(is_valid_domain("*.example.com"));
        assert!(!is_valid_domain("localhost"));
        assert!(!is_valid_domain("bad_domain.com"));
        assert!(!is_valid_domain("-lead.example.com"));
    }

    #[test]
    fn hostnames_set_override_and_ssl_names() {
        let host = backend_for("api", "api.example.com", 443);
        assert_eq!(host.override_host.as_deref(), Some("api.example.com"));
        assert_eq!(host.ssl_sni_hostname.as_deref(), Some("api.example.com"));

        let ip = backend_for("local", "10.0.0.1", 80);
        assert_eq!(ip.override_host, None);
        assert_eq!(ip.ssl_cert_hostname, None);
    }

    #[test]
    fn defaults_without_setup_give_originless_backend() {
        let setup = Setup::default();
        let root = Path::new(".");
        let plan = SetupPlan::configure(
            &inputs(&setup, root),
            &Interaction::non_interactive(),
            &Output::new(OutputMode::Quiet),
            &mut Diagnostics::default(),
        )
        .unwrap();

        assert!(plan.is_originless());
        assert_eq!(plan.domains.len(), 1);
        assert_eq!(plan.backends[0].port, 80);
    }

    #[test]
    fn domain_flag_wins() {
        let setup = Setup::default();
        let root = Path::new(".");
        let mut inputs = inputs(&setup, root);
        inputs.domain_flag = Some("app.example.com");
        let plan = SetupPlan::configure(
            &inputs,
            &Interaction::non_interactive(),
            &Output::new(OutputMode::Quiet),
            &mut Diagnostics::default(),
        )
        .unwrap();
        assert_eq!(plan.domains, vec!["app.example.com".to_string()]);
    }

    #[test]
    fn predefined_resources_use_manifest_defaults() {
        let manifest = Manifest::from_toml(
            r#"
[setup.backends.origin]
address = "origin.example.com"
port = 443

[setup.config_stores.settings.items.mode]
value = "production"

[setup.kv_stores.assets.items.greeting]
value = "hello"

[setup.log_endpoints.access]
provider = "BigQuery"
"#,
        )
        .unwrap();
        let root = Path::new(".");
        let mut diag = Diagnostics::default();
        let plan = SetupPlan::configure(
            &inputs(&manifest.setup, root),
            &Interaction::non_interactive(),
            &Output::new(OutputMode::Quiet),
            &mut diag,
        )
        .unwrap();

        assert!(!plan.is_originless());
        assert_eq!(plan.backends[0].address, "origin.example.com");
        assert_eq!(plan.backends[0].port, 443);
        assert_eq!(
            plan.config_stores[0].items,
            vec![("mode".to_string(), "production".to_string())]
        );
        assert_eq!(plan.kv_stores[0].items[0].1, b"hello".to_vec());
        assert_eq!(diag.of_kind(crate::diagnostics::WarningKind::ManualSetup).count(), 1);
    }

    #[test]
    fn secrets_cannot_be_defaulted() {
        let manifest = Manifest::from_toml(
            "[setup.secret_stores.keys.entries.signing]\ndescription = \"signing key\"\n",
        )
        .unwrap();
        let root = Path::new(".");
        let err = SetupPlan::configure(
            &inputs(&manifest.setup, root),
            &Interaction::non_interactive(),
            &Output::new(OutputMode::Quiet),
            &mut Diagnostics::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DeployError::BlankSecret { .. }));
    }

    #[test]
    fn existing_service_only_plans_domains() {
        let manifest = Manifest::from_toml("[setup.backends.origin]\naddress = \"a.example.com\"\n")
            .unwrap();
        let root = Path::new(".");
        let mut inputs = inputs(&manifest.setup, root);
        inputs.new_service = false;
        let plan = SetupPlan::configure(
            &inputs,
            &Interaction::non_interactive(),
            &Output::new(OutputMode::Quiet),
            &mut Diagnostics::default(),
        )
        .unwrap();
        assert_eq!(plan.domains.len(), 1);
        assert!(plan.backends.is_empty());
    }
}
