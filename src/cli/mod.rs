//! Command-line entry points for operating the database behind the
//! bookkeeping engine.

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::database;

mod chart;
mod migrate;

#[derive(Parser)]
#[command(about = "SACCO bookkeeping engine administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply any pending database migrations.
    Migrate(DatabaseOpts),
    /// Seed a starter chart of accounts with report tags bound, creating
    /// only the accounts that do not already exist.
    InitChart(DatabaseOpts),
}

#[derive(Args)]
struct DatabaseOpts {
    /// Connection string for the database.
    #[arg(long = "database-url", env = "DATABASE_URL")]
    database_url: String,
}

impl From<DatabaseOpts> for migrate::MigrationOpts {
    fn from(opts: DatabaseOpts) -> Self {
        Self {
            database_url: opts.database_url,
        }
    }
}

pub async fn run_with_sys_args() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    match cli.command {
        Commands::Migrate(opts) => migrate::run_migrations(opts.into()).await,
        Commands::InitChart(opts) => {
            migrate::run_migrations(migrate::MigrationOpts {
                database_url: opts.database_url.clone(),
            })
            .await?;

            let pool = database::connect(&opts.database_url).await?;
            let created = chart::seed_chart(&pool).await?;

            println!("{}", serde_json::to_string_pretty(&created)?);

            Ok(())
        }
    }
}
