//! Run a single purge pass over the configured draft store.
//!
//! For hosts that schedule cleanup externally (cron, CI) instead of running
//! the long-lived service.

use anyhow::Result;
use tracing::info;
use translatable_forms::config::Config;
use translatable_forms::scheduler::run_purge_job;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translatable_forms=info".parse()?)
                .add_directive("purge_drafts=info".parse()?),
        )
        .init();

    let config = Config::from_env()?;
    if config.staging_ttl().is_none() {
        info!("STAGING_TTL_MINUTES is 0, drafts never expire; nothing to purge");
        return Ok(());
    }

    let staging = config.open_staging_store().await?;
    let purged = run_purge_job(staging.as_ref()).await?;

    println!("Purged {} expired draft(s)", purged);
    Ok(())
}
