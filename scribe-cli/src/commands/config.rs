//! `scribe config`: inspect the layered configuration

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribe_core::ScribeConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective config as TOML, secrets masked
    Show,
    /// Show config file path
    Path,
    /// Check that the config can run a server
    Validate,
}

pub fn run_config(args: ConfigArgs, file: Option<&Path>) -> Result<()> {
    match args.command {
        ConfigCommands::Show => run_show(file),
        ConfigCommands::Path => run_path(file),
        ConfigCommands::Validate => run_validate(file),
    }
}

fn run_show(file: Option<&Path>) -> Result<()> {
    let config = ScribeConfig::load(file)?;
    let toml_str =
        toml::to_string_pretty(&config.redacted()).context("Failed to serialize config to TOML")?;
    println!("{}", toml_str);
    Ok(())
}

fn run_path(file: Option<&Path>) -> Result<()> {
    match file {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", ScribeConfig::config_path().display()),
    }
    Ok(())
}

fn run_validate(file: Option<&Path>) -> Result<()> {
    let config = ScribeConfig::load(file)?;
    println!("   ✓ Config loaded (profile: {})", config.profile);

    config.validate()?;
    println!("   ✓ Secret key is set");

    match &config.admin_email {
        Some(admin) => println!("   ✓ Administrator email: {}", admin),
        None => println!("   ⚠ No administrator email (SCRIBE_ADMIN); nobody registers as admin"),
    }
    println!("   Links point at {}", config.public_url());

    println!("\n✅ Configuration valid!");
    Ok(())
}
