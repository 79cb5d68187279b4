use crate::i18n::LocaleRegistry;
use crate::retry::{with_retry, RetryConfig};
use crate::staging::{FileStagingStore, PgStagingStore, StagingStore};
use anyhow::{bail, Context, Result};
use chrono::Duration;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Where staged drafts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingBackend {
    Postgres,
    File,
}

impl std::str::FromStr for StagingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "file" | "files" => Ok(Self::File),
            other => bail!("Unknown STAGING_BACKEND '{}', expected 'postgres' or 'file'", other),
        }
    }
}

/// Longest accepted draft lifetime: 30 days.
pub const MAX_STAGING_TTL_MINUTES: u64 = 30 * 24 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    // Storage
    pub database_url: Option<String>,
    pub staging_backend: StagingBackend,
    pub drafts_dir: PathBuf,

    // Draft lifetime
    pub staging_ttl_minutes: u64,
    pub purge_interval_minutes: u32,

    // Locales
    pub enabled_locales: Vec<String>,
    pub default_locale: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let staging_backend = match std::env::var("STAGING_BACKEND") {
            Ok(value) => value.parse()?,
            Err(_) => StagingBackend::Postgres,
        };

        let staging_ttl_minutes: u64 = parse_var("STAGING_TTL_MINUTES", 120)?;
        if staging_ttl_minutes > MAX_STAGING_TTL_MINUTES {
            bail!(
                "STAGING_TTL_MINUTES must be at most {} (30 days), got {}",
                MAX_STAGING_TTL_MINUTES,
                staging_ttl_minutes
            );
        }

        let database_url = std::env::var("DATABASE_URL").ok();
        if staging_backend == StagingBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL not set (required when STAGING_BACKEND=postgres)");
        }

        Ok(Self {
            database_url,
            staging_backend,
            drafts_dir: std::env::var("DRAFTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./drafts")),

            staging_ttl_minutes,
            purge_interval_minutes: parse_var("PURGE_INTERVAL_MINUTES", 15)?,

            enabled_locales: std::env::var("ENABLED_LOCALES")
                .map(|v| split_locales(&v))
                .unwrap_or_else(|_| vec!["en".to_string()]),
            default_locale: std::env::var("DEFAULT_LOCALE")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    /// Database URL, for binaries that need PostgreSQL regardless of backend.
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL not set")
    }

    /// Draft lifetime; zero disables expiry. Values above
    /// [`MAX_STAGING_TTL_MINUTES`] are clamped to it.
    pub fn staging_ttl(&self) -> Option<Duration> {
        match self.staging_ttl_minutes.min(MAX_STAGING_TTL_MINUTES) {
            0 => None,
            minutes => i64::try_from(minutes).ok().and_then(Duration::try_minutes),
        }
    }

    /// Build the enabled locale set, defaulting to the first listed locale.
    pub fn locale_registry(&self) -> Result<LocaleRegistry> {
        let registry = match &self.default_locale {
            Some(default) => LocaleRegistry::new(self.enabled_locales.iter().cloned(), default.clone()),
            None => LocaleRegistry::with_first_as_default(self.enabled_locales.iter().cloned()),
        };
        registry.context("Invalid ENABLED_LOCALES/DEFAULT_LOCALE")
    }

    /// Connect to PostgreSQL, retrying while the database comes up.
    pub async fn connect_database(&self) -> Result<PgPool> {
        let url = self.require_database_url()?;
        let pool = with_retry(&RetryConfig::database_connect(), "Database connect", || {
            PgPoolOptions::new().max_connections(5).connect(url)
        })
        .await
        .context("Failed to connect to PostgreSQL")?;

        info!("✓ Connected to PostgreSQL");
        Ok(pool)
    }

    /// Open the configured staging backend, creating its table or directory.
    pub async fn open_staging_store(&self) -> Result<Arc<dyn StagingStore>> {
        let store: Arc<dyn StagingStore> = match self.staging_backend {
            StagingBackend::Postgres => {
                let mut store = PgStagingStore::new(self.connect_database().await?);
                if let Some(ttl) = self.staging_ttl() {
                    store = store.with_ttl(ttl);
                }
                store
                    .migrate()
                    .await
                    .context("Failed to create staging table")?;
                Arc::new(store)
            }
            StagingBackend::File => {
                let mut store = FileStagingStore::open(self.drafts_dir.clone())
                    .await
                    .with_context(|| format!("Failed to open {}", self.drafts_dir.display()))?;
                if let Some(ttl) = self.staging_ttl() {
                    store = store.with_ttl(ttl);
                }
                Arc::new(store)
            }
        };

        info!("Staging drafts in {:?} backend", self.staging_backend);
        Ok(store)
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a non-negative integer, got '{}'", name, value)),
        Err(_) => Ok(default),
    }
}

fn split_locales(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
