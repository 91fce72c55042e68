// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines the global flags and the build, deploy, publish, validate, and hash subcommands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "edgeship")]
#[command(about = "Build and deploy WebAssembly packages to edge compute services")]
#[command(version)]
pub struct Cli {
    /// Show verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print final results (for CI)
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// Print output as JSON lines
    #[arg(long, global = true)]
    pub json: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long, global = true)]
    pub auto_yes: bool,

    /// Accept the default value for every input prompt
    #[arg(short = 'd', long, global = true)]
    pub accept_defaults: bool,

    /// Never prompt; confirm everything and take defaults
    #[arg(short = 'i', long, global = true)]
    pub non_interactive: bool,

    /// API token (overrides EDGESHIP_API_TOKEN and config.yml)
    #[arg(short, long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a Wasm binary and package it for deployment
    Build(BuildArgs),

    /// Deploy a package to a service
    Deploy {
        #[command(flatten)]
        args: DeployArgs,

        /// Manifest environment to use ('stage' reads fastly.stage.toml)
        #[arg(long)]
        env: Option<String>,
    },

    /// Build the project, then deploy the package it produced
    Publish(PublishArgs),

    /// Validate a package archive
    Validate {
        /// Path to the package archive
        #[arg(short, long)]
        package: PathBuf,
    },

    /// Print a hash of the package's files, ignoring archive metadata
    HashFiles(HashArgs),

    /// Print the SHA-512 of the whole package archive (deprecated; prefer hash-files)
    Hashsum(HashArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Project directory to build (default: current directory)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Include source code in the built package
    #[arg(long)]
    pub include_source: bool,

    /// Language type, overriding fastly.toml
    #[arg(long)]
    pub language: Option<String>,

    /// Package name, overriding fastly.toml
    #[arg(long)]
    pub package_name: Option<String>,

    /// Build script timeout in seconds (0 means no timeout)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Manifest environment to use ('stage' reads fastly.stage.toml)
    #[arg(long)]
    pub env: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Service ID to deploy to
    #[arg(short, long, conflicts_with = "service_name")]
    pub service_id: Option<String>,

    /// Service name to deploy to
    #[arg(long)]
    pub service_name: Option<String>,

    /// Version to deploy: a number, 'latest', or 'active'
    #[arg(long, default_value = "latest")]
    pub version: String,

    /// Path to a package archive (default: pkg/<name>.tar.gz)
    #[arg(short, long)]
    pub package: Option<PathBuf>,

    /// Human-readable comment for the version
    #[arg(long)]
    pub comment: Option<String>,

    /// Domain for a new service (default: a generated *.edgecompute.app name)
    #[arg(long)]
    pub domain: Option<String>,

    /// Required status code for the availability check
    #[arg(long, value_parser = clap::value_parser!(u16).range(100..=999))]
    pub status_check_code: Option<u16>,

    /// Disable the availability check
    #[arg(long)]
    pub status_check_off: bool,

    /// Path requested by the availability check
    #[arg(long)]
    pub status_check_path: Option<String>,

    /// Seconds to wait for the availability check
    #[arg(long)]
    pub status_check_timeout: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct HashArgs {
    /// Path to a package archive (skips the build)
    #[arg(short, long)]
    pub package: Option<PathBuf>,

    /// Hash the existing package without building first
    #[arg(long)]
    pub skip_build: bool,

    #[command(flatten)]
    pub build: BuildArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    #[command(flatten)]
    pub build: BuildArgs,

    #[command(flatten)]
    pub deploy: DeployArgs,
}
