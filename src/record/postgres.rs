use crate::i18n::Locale;
use crate::record::{Record, RecordStore, RecordStoreError, Translations};
use crate::subject::{AttributeMap, SubjectId};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::BTreeMap;

/// Record store backed by a PostgreSQL table with JSONB columns.
#[derive(Debug, Clone)]
pub struct PgRecordStore {
    pool: PgPool,
    fallback_locale: Option<Locale>,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            fallback_locale: None,
        }
    }

    /// Fallback locale given to every loaded record.
    pub fn with_fallback_locale(mut self, locale: Locale) -> Self {
        self.fallback_locale = Some(locale);
        self
    }

    /// Create the records table if it does not exist.
    pub async fn migrate(&self) -> Result<(), RecordStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS translatable_records (
                id TEXT PRIMARY KEY,
                attributes JSONB NOT NULL,
                translations JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn load(&self, id: &SubjectId) -> Result<Option<Record>, RecordStoreError> {
        let row: Option<(Json<AttributeMap>, Json<BTreeMap<String, Translations>>)> =
            sqlx::query_as(
                "SELECT attributes, translations FROM translatable_records WHERE id = $1",
            )
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(Json(attributes), Json(translations))| {
            let mut record = Record {
                id: Some(id.clone()),
                attributes,
                translations,
                fallback_locale: None,
            };
            if let Some(locale) = &self.fallback_locale {
                record = record.with_fallback_locale(locale.clone());
            }
            record
        }))
    }

    async fn save(&self, record: &mut Record) -> Result<(), RecordStoreError> {
        let id = record.id().cloned().unwrap_or_else(SubjectId::generate);

        sqlx::query(
            r#"
            INSERT INTO translatable_records (id, attributes, translations, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET attributes = EXCLUDED.attributes,
                          translations = EXCLUDED.translations,
                          updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(id.as_str())
        .bind(Json(&record.attributes))
        .bind(Json(&record.translations))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        // Only take the id once the row is durable, so a failed first save
        // leaves the record unsaved.
        record.assign_id(id);
        Ok(())
    }
}
