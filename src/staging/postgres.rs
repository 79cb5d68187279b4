use crate::i18n::Locale;
use crate::staging::{StagedLocales, StagingError, StagingStore};
use crate::subject::{AttributeMap, SubjectId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::debug;

/// Staging store backed by a PostgreSQL table, for hosts running several
/// processes behind one session space.
#[derive(Debug, Clone)]
pub struct PgStagingStore {
    pool: PgPool,
    ttl: Option<Duration>,
}

impl PgStagingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, ttl: None }
    }

    /// Expire drafts `ttl` after their latest write.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Create the staging table if it does not exist.
    pub async fn migrate(&self) -> Result<(), StagingError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS locale_staging (
                subject_id TEXT NOT NULL,
                locale TEXT NOT NULL,
                attributes JSONB NOT NULL,
                staged_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (subject_id, locale)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Drafts last written before this instant are expired.
    fn cutoff(&self) -> Option<DateTime<Utc>> {
        self.ttl.map(|ttl| Utc::now() - ttl)
    }
}

#[async_trait]
impl StagingStore for PgStagingStore {
    async fn put(
        &self,
        subject: &SubjectId,
        locale: &Locale,
        attributes: AttributeMap,
    ) -> Result<(), StagingError> {
        let mut tx = self.pool.begin().await?;

        if let Some(cutoff) = self.cutoff() {
            let dropped = sqlx::query(
                r#"
                DELETE FROM locale_staging
                WHERE subject_id = $1
                  AND (SELECT MAX(staged_at) FROM locale_staging WHERE subject_id = $1) < $2
                "#,
            )
            .bind(subject.as_str())
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if dropped > 0 {
                debug!("Draft for {} expired, starting a new one", subject);
            }
        }

        sqlx::query(
            r#"
            INSERT INTO locale_staging (subject_id, locale, attributes, staged_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject_id, locale)
            DO UPDATE SET attributes = EXCLUDED.attributes, staged_at = EXCLUDED.staged_at
            "#,
        )
        .bind(subject.as_str())
        .bind(locale.code())
        .bind(Json(&attributes))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get(
        &self,
        subject: &SubjectId,
        locale: &Locale,
    ) -> Result<Option<AttributeMap>, StagingError> {
        let staged: Option<Json<AttributeMap>> = sqlx::query_scalar(
            r#"
            SELECT attributes FROM locale_staging
            WHERE subject_id = $1 AND locale = $2
              AND ($3::timestamptz IS NULL
                   OR (SELECT MAX(staged_at) FROM locale_staging WHERE subject_id = $1) >= $3)
            "#,
        )
        .bind(subject.as_str())
        .bind(locale.code())
        .bind(self.cutoff())
        .fetch_optional(&self.pool)
        .await?;

        Ok(staged.map(|Json(attributes)| attributes))
    }

    async fn get_all(&self, subject: &SubjectId) -> Result<StagedLocales, StagingError> {
        let rows: Vec<(String, Json<AttributeMap>)> = sqlx::query_as(
            r#"
            SELECT locale, attributes FROM locale_staging
            WHERE subject_id = $1
              AND ($2::timestamptz IS NULL
                   OR (SELECT MAX(staged_at) FROM locale_staging WHERE subject_id = $1) >= $2)
            "#,
        )
        .bind(subject.as_str())
        .bind(self.cutoff())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(locale, Json(attributes))| (Locale::new(locale), attributes))
            .collect())
    }

    async fn clear(&self, subject: &SubjectId) -> Result<(), StagingError> {
        sqlx::query("DELETE FROM locale_staging WHERE subject_id = $1")
            .bind(subject.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StagingError> {
        let Some(cutoff) = self.cutoff() else {
            return Ok(0);
        };

        let purged: i64 = sqlx::query_scalar(
            r#"
            WITH expired AS (
                SELECT subject_id FROM locale_staging
                GROUP BY subject_id
                HAVING MAX(staged_at) < $1
            ), deleted AS (
                DELETE FROM locale_staging
                WHERE subject_id IN (SELECT subject_id FROM expired)
                RETURNING subject_id
            )
            SELECT COUNT(DISTINCT subject_id) FROM deleted
            "#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(usize::try_from(purged).unwrap_or_default())
    }
}
