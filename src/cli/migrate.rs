use tracing::info;

use crate::database;

pub struct MigrationOpts {
    pub database_url: String,
}

pub async fn run_migrations(opts: MigrationOpts) -> anyhow::Result<()> {
    let pool = database::connect(&opts.database_url).await?;

    database::MIGRATOR.run(&pool).await?;

    info!("Applied pending migrations.");

    Ok(())
}
