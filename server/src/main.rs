mod config;
mod http;
mod mailer;
mod seed;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use api::engine::outbox::{self, Mailer};
use api::schema::{EngineSettings, MutationRoot, QueryRoot};
use async_graphql::{EmptySubscription, Schema};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_obs::{init_tracing, ObsConfig};
use sea_orm::{Database, DatabaseConnection};
use tracing::info;

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
    mailer::{HttpMailer, LogMailer},
};

#[derive(Parser, Debug)]
#[command(name = "banyan-server", version, about = "Banyan engagement engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Seed demo volunteers, cases and a community goal.
    Seed,
    /// Enqueue periodic emails and drain the due queue once.
    Sweep,
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => {
            let app_config = AppConfig::load()?;
            run_server(cmd, app_config).await
        }
        Command::Migrate(action) => {
            let app_config = AppConfig::load()?;
            match action {
                MigrateCommand::Up => migrate_up(&app_config).await,
                MigrateCommand::Down => migrate_down(&app_config).await,
            }
        }
        Command::Seed => {
            let app_config = AppConfig::load()?;
            let db = connect(&app_config).await?;
            seed::run(&db).await
        }
        Command::Sweep => {
            let app_config = AppConfig::load()?;
            run_sweep(app_config).await
        }
        Command::SchemaPrint { output } => schema_print(output),
    }
}

async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    Database::connect(&config.database_url)
        .await
        .map_err(Into::into)
}

fn build_mailer(config: &AppConfig) -> Arc<dyn Mailer> {
    match &config.mailer_endpoint {
        Some(endpoint) => Arc::new(HttpMailer::new(endpoint.clone())),
        None => Arc::new(LogMailer),
    }
}

async fn run_server(cmd: ServeCommand, config: AppConfig) -> Result<()> {
    let db = Arc::new(connect(&config).await?);
    ensure_migrations(db.as_ref(), cmd.allow_dirty).await?;
    let mailer = build_mailer(&config);
    let settings = EngineSettings {
        send_timeout: config.send_timeout,
        goal_multiplier: config.goal_multiplier,
    };
    let schema = api::build_schema(db.clone(), mailer, settings);
    let state = AppState {
        db,
        schema,
        cors_allowed_origins: Arc::new(config.cors_allowed_origins.clone()),
    };
    http::serve((&cmd).into(), state).await
}

/// One pass of the background mail machinery: enqueue the periodic producers,
/// then drain everything due. Intended to run from cron or a systemd timer.
async fn run_sweep(config: AppConfig) -> Result<()> {
    let db = connect(&config).await?;
    let mailer = build_mailer(&config);
    let now = Utc::now().into();

    let weekly = outbox::schedule_weekly_motivation(&db, now).await?;
    let reminders = outbox::schedule_streak_reminders(&db, now).await?;
    info!(weekly, reminders, "periodic producers ran");

    let outcome = outbox::run_delivery_sweep(&db, mailer.as_ref(), config.send_timeout, now).await?;
    info!(sent = outcome.sent, failed = outcome.failed, "sweep complete");
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let sdl = Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl();
    match path {
        Some(target) => {
            std::fs::write(&target, sdl)?;
            info!(path = %target.display(), "schema snapshot written");
        }
        None => print!("{sdl}"),
    }
    Ok(())
}

async fn ensure_migrations(db: &DatabaseConnection, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(db).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `cargo run -p banyan-server -- migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up(config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    Migrator::up(&db, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down(config: &AppConfig) -> Result<()> {
    let db = connect(config).await?;
    Migrator::down(&db, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
