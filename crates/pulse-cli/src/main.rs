use anyhow::{anyhow, Result};
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use pulse_core::db;
use pulse_core::error::CoreError;
use pulse_core::models::Identity;
use pulse_core::repository::{HttpRepository, IdentityRepository, Repository, SqliteRepository};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::{BackendKind, Config};

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            handle_error(anyhow!(CoreError::Configuration(e.to_string())));
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);

    if let Err(e) = run(cli, config).await {
        handle_error(e);
        std::process::exit(1);
    }
}

/// RUST_LOG wins over the configured level.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_repository(config: &Config) -> Result<Box<dyn Repository>> {
    match config.backend.kind {
        BackendKind::Sqlite => {
            debug!(path = %config.backend.database_path, "opening sqlite store");
            let pool = db::establish_connection(&config.backend.database_path).await?;
            Ok(Box::new(SqliteRepository::new(pool)))
        }
        BackendKind::Http => {
            let endpoint = config.backend.endpoint.as_deref().unwrap_or_default();
            debug!(endpoint, "using sheet API");
            Ok(Box::new(HttpRepository::new(endpoint, config.backend.timeout())?))
        }
    }
}

/// Resolves the acting user; `None` when no email is configured.
async fn acting_user(repo: &dyn Repository, cli: &cli::Cli, config: &Config) -> Result<Option<Identity>> {
    let Some(email) = cli.as_user.as_deref().or(config.user_email.as_deref()) else {
        return Ok(None);
    };
    match repo.verify_identity(email).await? {
        Some(identity) => Ok(Some(identity)),
        None => Err(anyhow!(CoreError::denied(format!("'{}' is not a registered user", email)))),
    }
}

async fn run(cli: cli::Cli, config: Config) -> Result<()> {
    config.validate()?;
    let repository = open_repository(&config).await?;
    let repo: &dyn Repository = repository.as_ref();

    // Registering the very first user is the only thing possible without an identity.
    if let cli::Commands::User(cli::UserCommand::Add { email, name, admin }) = &cli.command {
        let caller = acting_user(repo, &cli, &config).await?;
        return commands::user::add_user(repo, caller.as_ref(), email.clone(), name.clone(), *admin).await;
    }

    let me = acting_user(repo, &cli, &config).await?.ok_or_else(|| {
        anyhow!(CoreError::Configuration(
            "no acting user; set user_email in pulse.toml, PULSE_USER_EMAIL, or pass --as".to_string()
        ))
    })?;
    let ctx = commands::Context {
        repo,
        me: &me,
        config: &config,
    };

    match cli.command {
        cli::Commands::User(_) => Ok(()),
        cli::Commands::Whoami => commands::user::whoami(&me),
        cli::Commands::Project(command) => commands::project::project_command(&ctx, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&ctx, command).await,
        cli::Commands::Add(command) => commands::add::add_task(&ctx, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_task(&ctx, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_task(&ctx, command).await,
        cli::Commands::BulkDeadline(command) => commands::bulk::bulk_deadline(&ctx, command).await,
        cli::Commands::Stats(command) => commands::stats::show_stats(&ctx, command).await,
        cli::Commands::History(command) => commands::history::show_history(&ctx, command).await,
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::PermissionDenied(s) => {
                eprintln!("{} Permission denied: {}", "Error:".style(error_style), s.yellow());
            }
            CoreError::AmbiguousId(candidates) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, title) in candidates {
                    eprintln!("  {} ({})", id.yellow(), title);
                }
            }
            CoreError::Validation(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::PartialFailure { updated, failed, details } => {
                eprintln!(
                    "{} {} task(s) updated, {} rejected",
                    "Error:".style(error_style),
                    updated,
                    failed
                );
                for (id, reason) in details {
                    eprintln!("  {} {}: {}", "✗".red(), id.yellow(), reason);
                }
            }
            CoreError::Configuration(s) => {
                eprintln!("{} Configuration: {}", "Error:".style(error_style), s);
            }
            CoreError::Database(e) => {
                eprintln!("{} Database error: {}", "Error:".style(error_style), e);
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), core_error),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
