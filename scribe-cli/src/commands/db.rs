//! Database maintenance: schema, role seeding and self-follow backfill

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scribe_core::ScribeConfig;
use scribe_server::db::{create_pool, migrations, RoleRepo, UserRepo};
use sqlx::PgPool;

/// Shared database flag
#[derive(Parser, Debug)]
pub struct DatabaseArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, global = true)]
    pub database_url: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommands,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Create or upgrade the schema
    Migrate,
}

#[derive(Parser, Debug)]
pub struct RolesArgs {
    #[command(subcommand)]
    pub command: RolesCommands,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Subcommand, Debug)]
pub enum RolesCommands {
    /// Create or refresh the User, Moderator and Administrator roles
    Insert,
}

#[derive(Parser, Debug)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: UsersCommands,

    #[command(flatten)]
    pub database: DatabaseArgs,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommands {
    /// Make every user follow themselves (backfill for older accounts)
    AddSelfFollows,
}

/// Migrate, seed roles and backfill self-follows in one go
#[derive(Parser, Debug)]
pub struct DeployArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

async fn connect(config: &ScribeConfig, database: &DatabaseArgs) -> Result<PgPool> {
    let url = database
        .database_url
        .clone()
        .unwrap_or_else(|| config.database_url());

    create_pool(&url)
        .await
        .context("Failed to connect to database")
}

async fn migrate(pool: &PgPool) -> Result<()> {
    migrations::run(pool)
        .await
        .context("Failed to migrate database")?;
    println!("✓ Schema up to date");
    Ok(())
}

async fn insert_roles(pool: &PgPool) -> Result<()> {
    let roles = RoleRepo::new(pool)
        .insert_roles()
        .await
        .context("Failed to insert roles")?;

    for role in roles {
        let default = if role.is_default { " (default)" } else { "" };
        println!(
            "✓ {}{}: {}",
            role.name,
            default,
            role.permission_set().names().join(", ")
        );
    }
    Ok(())
}

async fn add_self_follows(pool: &PgPool) -> Result<()> {
    let added = UserRepo::new(pool)
        .add_self_follows()
        .await
        .context("Failed to backfill self-follows")?;
    println!("✓ Added {} self-follow(s)", added);
    Ok(())
}

pub async fn run_db(args: DbArgs, config: &ScribeConfig) -> Result<()> {
    let pool = connect(config, &args.database).await?;
    match args.command {
        DbCommands::Migrate => migrate(&pool).await,
    }
}

pub async fn run_roles(args: RolesArgs, config: &ScribeConfig) -> Result<()> {
    let pool = connect(config, &args.database).await?;
    match args.command {
        RolesCommands::Insert => insert_roles(&pool).await,
    }
}

pub async fn run_users(args: UsersArgs, config: &ScribeConfig) -> Result<()> {
    let pool = connect(config, &args.database).await?;
    match args.command {
        UsersCommands::AddSelfFollows => add_self_follows(&pool).await,
    }
}

pub async fn run_deploy(args: DeployArgs, config: &ScribeConfig) -> Result<()> {
    let pool = connect(config, &args.database).await?;
    migrate(&pool).await?;
    insert_roles(&pool).await?;
    add_self_follows(&pool).await?;
    tracing::info!("deploy finished");
    Ok(())
}
