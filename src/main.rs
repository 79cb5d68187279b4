use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use translatable_forms::config::Config;
use translatable_forms::scheduler;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translatable_forms=info".parse()?),
        )
        .init();

    info!("Starting translatable-forms draft service");

    let config = Arc::new(Config::from_env()?);
    let locales = config.locale_registry()?;
    info!(
        "Enabled locales: {} (default: {})",
        locales
            .enabled_locales()
            .iter()
            .map(|l| l.code())
            .collect::<Vec<_>>()
            .join(", "),
        locales.default_locale()
    );

    let staging = config.open_staging_store().await?;

    // Purge abandoned drafts once at startup, then on schedule
    scheduler::run_purge_job(staging.as_ref()).await?;
    let mut jobs = scheduler::start_scheduler(Arc::clone(&config), staging).await?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping scheduler");
    jobs.shutdown().await?;

    Ok(())
}
