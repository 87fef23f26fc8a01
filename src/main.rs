use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::Parser;
use migrate_runner::config::{DEFAULT_LOCK_TIMEOUT_SECS, DEFAULT_MIGRATIONS_DIR};
use migrate_runner::{
    create_registry, Command, DatabaseConfig, MigrationExecutor, MigrationStatus, MySqlStore,
    RunReport, RunnerConfig, DEFAULT_LOCK_NAME,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Migrate - apply, roll back and inspect database schema migrations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Command: run, rollback or status.
    /// Anything else applies every pending migration.
    command: Option<String>,

    /// Only run or roll back the migration entry with this exact name
    target: Option<String>,

    /// Database host
    #[arg(long, env = "DATA_BASE_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Database port
    #[arg(long, env = "DATA_BASE_PORT", default_value_t = 3306)]
    port: u16,

    /// Database name
    #[arg(long, env = "DATA_BASE_NAME")]
    database: String,

    /// Database user
    #[arg(long, env = "DATA_BASE_USER")]
    user: String,

    /// Database password
    #[arg(long, env = "DATA_BASE_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,

    /// Directory holding the migration entries
    #[arg(long, env = "MIGRATIONS_DIR", default_value = DEFAULT_MIGRATIONS_DIR)]
    migrations_dir: PathBuf,

    /// Seconds to wait for another runner to release the migration lock
    #[arg(long, env = "MIGRATIONS_LOCK_TIMEOUT", default_value_t = DEFAULT_LOCK_TIMEOUT_SECS)]
    lock_timeout: u64,

    /// Name of the advisory lock serializing runners against one server
    #[arg(long, env = "MIGRATIONS_LOCK_NAME", default_value = DEFAULT_LOCK_NAME)]
    lock_name: String,

    /// Fail when the target matches no migration entry
    #[arg(long, env = "MIGRATIONS_STRICT_TARGET", value_parser = BoolishValueParser::new())]
    strict_target: bool,

    /// Print the run report or status as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let (command, honours_target) = Command::from_arg(args.command.as_deref().unwrap_or_default());
    let target = if honours_target {
        args.target.as_deref()
    } else {
        None
    };

    let db_config = DatabaseConfig {
        host: args.host.clone(),
        port: args.port,
        database: args.database.clone(),
        username: args.user.clone(),
        password: args.password.clone(),
    };
    db_config.validate()?;

    let runner_config = RunnerConfig {
        migrations_dir: args.migrations_dir.clone(),
        lock_timeout: Duration::from_secs(args.lock_timeout),
        strict_target: args.strict_target,
    };

    info!(host = %db_config.host, port = db_config.port, database = %db_config.database, "Connecting to database");
    let pool = db_config
        .pool_options()
        .connect_with(db_config.connect_options())
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database {} at {}:{}",
                db_config.database, db_config.host, db_config.port
            )
        })?;
    info!("Connected to database");

    let registry = create_registry()?;
    let store = Arc::new(
        MySqlStore::new(pool.clone(), runner_config.lock_timeout).with_lock_name(&args.lock_name),
    );
    let executor = MigrationExecutor::new(registry, store, pool, runner_config);

    match command {
        Command::Run => {
            let report = executor.migrate(target).await?;
            print_report(&report, args.json)?;
        }
        Command::Rollback => {
            let report = executor.rollback(target).await?;
            print_report(&report, args.json)?;
        }
        Command::Status => {
            let status = executor.status().await?;
            print_status(&status, args.json)?;
        }
    }

    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    }
    Ok(())
}

fn print_status(status: &MigrationStatus, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!("Executed Migrations:");
    for name in &status.applied {
        println!("- {}", name);
    }
    println!();
    println!("Pending Migrations:");
    for name in &status.pending {
        println!("- {}", name);
    }
    Ok(())
}
