// ABOUTME: Entry point for the edgeship CLI application.
// ABOUTME: Parses arguments, installs logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use commands::Context;
use edgeship::config::Config;
use edgeship::error::Result;
use edgeship::output::{Output, OutputMode};
use edgeship::prompt::Interaction;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let output = Output::new(mode).with_verbose(cli.verbose);

    if let Err(e) = run(cli, output).await {
        let output = Output::new(mode);
        output.error(&e.to_string());
        if let Some(hint) = e.remediation() {
            output.remediation(hint);
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut output: Output) -> Result<()> {
    let config = Config::discover()?;

    let mut interaction = if cli.non_interactive {
        Interaction::non_interactive()
    } else {
        Interaction::terminal()
    };
    interaction.auto_yes = cli.auto_yes;
    interaction.accept_defaults = cli.accept_defaults;

    if matches!(
        cli.command,
        Commands::Build(_) | Commands::Deploy { .. } | Commands::Publish(_)
    ) {
        output.start_timer();
    }

    let ctx = Context {
        config,
        output,
        interaction,
        token: cli.token,
    };

    match cli.command {
        Commands::Build(args) => commands::build(&args, &ctx).await,
        Commands::Deploy { args, env } => commands::deploy(&args, env.as_deref(), &ctx).await,
        Commands::Publish(args) => commands::publish(&args, &ctx).await,
        Commands::Validate { package } => commands::validate(&package, &ctx),
        Commands::HashFiles(args) => commands::hash_files(&args, &ctx).await,
        Commands::Hashsum(args) => commands::hashsum(&args, &ctx).await,
    }
}
