//! steadydb command-line tool
//!
//! Connects to PostgreSQL through the reconnecting connection manager and
//! runs maintenance commands against the `users` table.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Table, presets::UTF8_FULL};
use steadydb_connection::{
    ConnectionManager, ExecutionContext, HealthStatus, HealthThresholds, RetryExecutor,
};
use steadydb_driver_postgres::PostgresConnectionFactory;

mod config;
mod demo;
mod logging;
mod users;

use config::AppConfig;
use users::User;

#[derive(Parser, Debug)]
#[command(
    name = "steadydb",
    version,
    about = "PostgreSQL access with automatic reconnection and retries"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', global = true, env = "STEADYDB_CONFIG")]
    config: Option<PathBuf>,

    /// Connection target, overriding the configuration file
    #[arg(long, global = true, env = "STEADYDB_DATABASE_URL")]
    database_url: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Probe the database and show pool statistics
    Ping,
    /// Manage rows of the users table
    #[command(subcommand)]
    Users(UsersCommand),
    /// Run the scripted create, read, update and delete walkthrough
    Demo,
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// Insert a user
    Create {
        name: String,
        email: String,
        /// Retry transient failures, reconnecting between attempts
        #[arg(long)]
        retry: bool,
    },
    /// List all users
    List,
    /// Show one user
    Get { id: i64 },
    /// Change the email of a user
    UpdateEmail { id: i64, email: String },
    /// Delete one user
    Delete { id: i64 },
    /// Delete every user
    DeleteAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?.with_database_target(cli.database_url);
    let _log_guard = logging::init(&config.logging)?;

    let factory = PostgresConnectionFactory::from_target(config.database.target())
        .context("invalid database target")?
        .with_connect_timeout(config.database.acquire_timeout());

    tracing::info!(database = %config.database.redacted_target(), "connecting");
    let manager = ConnectionManager::connect(config.database.clone(), factory)
        .await
        .context("failed to connect to the database")?;

    let result = run(&cli.command, &manager, &config, cli.json).await;
    manager.close().await;
    result
}

async fn run(
    command: &Commands,
    manager: &Arc<ConnectionManager>,
    config: &AppConfig,
    json: bool,
) -> Result<()> {
    match command {
        Commands::Ping => ping(manager, json).await,
        Commands::Users(command) => {
            users::ensure_schema(manager)
                .await
                .context("failed to prepare the users table")?;
            run_users(command, manager, config, json).await
        }
        Commands::Demo => {
            users::ensure_schema(manager)
                .await
                .context("failed to prepare the users table")?;
            demo::run(Arc::clone(manager), &config.retry).await;
            Ok(())
        }
    }
}

async fn ping(manager: &ConnectionManager, json: bool) -> Result<()> {
    let pool = manager.get_connection().await?;
    let result = pool.ping(manager.config().probe_timeout()).await;
    let status = HealthStatus::from_ping(&result, &HealthThresholds::default());
    let stats = pool.stats();

    if json {
        let value = serde_json::json!({
            "status": status,
            "latency_ms": result.as_ref().ok().map(|latency| latency.as_millis() as u64),
            "error": result.as_ref().err().map(ToString::to_string),
            "pool": stats,
            "reconnects": manager.reconnect_count(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["Field", "Value"]);
    table.add_row(vec!["status".to_string(), status.to_string()]);
    match &result {
        Ok(latency) => table.add_row(vec!["latency".to_string(), format!("{:?}", latency)]),
        Err(err) => table.add_row(vec!["error".to_string(), err.to_string()]),
    };
    table.add_row(vec!["open".to_string(), stats.total().to_string()]);
    table.add_row(vec!["idle".to_string(), stats.idle().to_string()]);
    table.add_row(vec!["in use".to_string(), stats.in_use().to_string()]);
    println!("{table}");
    Ok(())
}

async fn run_users(
    command: &UsersCommand,
    manager: &Arc<ConnectionManager>,
    config: &AppConfig,
    json: bool,
) -> Result<()> {
    match command {
        UsersCommand::Create { name, email, retry } => {
            let user = if *retry {
                let executor = RetryExecutor::new(Arc::clone(manager));
                let ctx = ExecutionContext::with_timeout(config.retry.operation_timeout());
                users::create_user_with_retry(&executor, &ctx, &config.retry.policy(), name, email)
                    .await?
            } else {
                users::create_user(manager, name, email).await?
            };
            print_users(&[user], json)
        }
        UsersCommand::List => print_users(&users::list_users(manager).await?, json),
        UsersCommand::Get { id } => print_users(&[users::get_user_by_id(manager, *id).await?], json),
        UsersCommand::UpdateEmail { id, email } => {
            users::update_user_email(manager, *id, email).await?;
            println!("Updated email of user {id}");
            Ok(())
        }
        UsersCommand::Delete { id } => {
            users::delete_user(manager, *id).await?;
            println!("Deleted user {id}");
            Ok(())
        }
        UsersCommand::DeleteAll => {
            let deleted = users::delete_users(manager).await?;
            println!("Deleted {deleted} users");
            Ok(())
        }
    }
}

fn print_users(users: &[User], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(users)?);
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(vec!["ID", "Name", "Email", "Created"]);
    for user in users {
        table.add_row(vec![
            user.id.to_string(),
            user.name.clone(),
            user.email.clone(),
            user.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}
