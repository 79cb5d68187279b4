use crate::config::Config;
use crate::retry::{with_retry, RetryConfig};
use crate::staging::StagingStore;
use anyhow::Result;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Initialize and start the draft purge scheduler
pub async fn start_scheduler(
    config: Arc<Config>,
    staging: Arc<dyn StagingStore>,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let cron_expr = interval_to_cron(config.purge_interval_minutes)?;
    info!(
        "Scheduling draft purge every {} minute(s) (cron: {})",
        config.purge_interval_minutes, cron_expr
    );

    let job = Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
        let staging = Arc::clone(&staging);

        Box::pin(async move {
            info!("⏰ Scheduled draft purge triggered");
            if let Err(e) = run_purge_job(staging.as_ref()).await {
                error!("Draft purge failed: {}", e);
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    info!("✓ Scheduler started");

    Ok(scheduler)
}

/// Convert a purge interval in minutes to a cron expression
fn interval_to_cron(minutes: u32) -> Result<String> {
    // Cron format: "second minute hour day month day_of_week"
    match minutes {
        0 => anyhow::bail!("PURGE_INTERVAL_MINUTES must be at least 1"),
        1..=59 => Ok(format!("0 */{} * * * *", minutes)),
        m if m % 60 == 0 && m / 60 <= 23 => Ok(format!("0 0 */{} * * *", m / 60)),
        m => anyhow::bail!(
            "PURGE_INTERVAL_MINUTES must be below 60 or a whole number of hours up to 23, got {}",
            m
        ),
    }
}

/// Remove every expired draft once, returning how many subjects were purged
pub async fn run_purge_job(staging: &dyn StagingStore) -> Result<usize> {
    let purged = with_retry(&RetryConfig::purge_pass(), "Draft purge", || {
        staging.purge_expired()
    })
    .await?;

    info!("Purged {} expired draft(s)", purged);
    Ok(purged)
}
