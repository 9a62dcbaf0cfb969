//! scribe CLI - run and maintain the scribe social blogging API
//!
//! - `serve`: migrate, seed roles and run the HTTP API
//! - `db`, `roles`, `users`, `deploy`: database maintenance
//! - `config`: inspect the layered configuration
//! - `completions`: shell completion scripts

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scribe_core::ScribeConfig;

mod commands;
mod logging;

use logging::LogOptions;

#[derive(Parser, Debug)]
#[command(
    name = "scribe",
    author,
    version,
    about = "Social blogging API server: posts, comments, follows and moderation",
    long_about = "Serve the scribe JSON API and maintain its Postgres database. \
                  Configuration comes from ~/.scribe/config.toml (or --config), \
                  .env and environment variables."
)]
struct Cli {
    /// Debug logging (RUST_LOG still wins when set)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Config file (default: ~/.scribe/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Schema management
    Db(commands::db::DbArgs),
    /// Role management
    Roles(commands::db::RolesArgs),
    /// User maintenance
    Users(commands::db::UsersArgs),
    /// Migrate, insert roles and backfill self-follows
    Deploy(commands::db::DeployArgs),
    /// Inspect configuration (show, path, validate)
    Config(commands::config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(LogOptions {
        debug: cli.debug,
        otel: cli.otel,
    })
    .ok();

    let result = run(cli).await;
    logging::shutdown();
    result
}

async fn run(cli: Cli) -> Result<()> {
    let file = cli.config.as_deref();
    let load = || ScribeConfig::load(file).context("Failed to load configuration");

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args, load()?).await?,
        Commands::Db(args) => commands::run_db(args, &load()?).await?,
        Commands::Roles(args) => commands::run_roles(args, &load()?).await?,
        Commands::Users(args) => commands::run_users(args, &load()?).await?,
        Commands::Deploy(args) => commands::run_deploy(args, &load()?).await?,
        Commands::Config(args) => commands::run_config(args, file)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
