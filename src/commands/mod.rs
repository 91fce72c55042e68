// ABOUTME: Command module aggregator for the edgeship CLI.
// ABOUTME: Holds the shared command context and re-exports each handler.

mod build;
mod deploy;
mod hash;
mod publish;
mod validate;

pub use build::build;
pub use deploy::deploy;
pub use hash::{hash_files, hashsum};
pub use publish::publish;
pub use validate::validate;

use edgeship::config::Config;
use edgeship::output::Output;
use edgeship::prompt::Interaction;

/// Settings resolved once from global flags and config.yml.
pub struct Context {
    pub config: Config,
    pub output: Output,
    pub interaction: Interaction,
    /// Value of `--token`, if given.
    pub token: Option<String>,
}
