use crate::i18n::Locale;
use crate::staging::{Draft, StagedLocales, StagingError, StagingStore};
use crate::subject::{AttributeMap, SubjectId};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Process-local staging store.
#[derive(Debug, Default)]
pub struct MemoryStagingStore {
    drafts: Mutex<HashMap<SubjectId, Draft>>,
    ttl: Option<Duration>,
}

impl MemoryStagingStore {
    /// Store whose drafts never expire.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose drafts expire `ttl` after their latest write.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            drafts: Mutex::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    /// Number of subjects with a live draft.
    pub async fn subject_count(&self) -> usize {
        let now = Utc::now();
        let drafts = self.drafts.lock().await;
        drafts
            .values()
            .filter(|draft| !draft.is_expired(self.ttl, now))
            .count()
    }
}

#[async_trait]
impl StagingStore for MemoryStagingStore {
    async fn put(
        &self,
        subject: &SubjectId,
        locale: &Locale,
        attributes: AttributeMap,
    ) -> Result<(), StagingError> {
        let now = Utc::now();
        let mut drafts = self.drafts.lock().await;

        let draft = drafts
            .entry(subject.clone())
            .or_insert_with(|| Draft::new(now));
        if draft.is_expired(self.ttl, now) {
            debug!("Draft for {} expired, starting a new one", subject);
            *draft = Draft::new(now);
        }
        draft.stage(locale, attributes, now);

        Ok(())
    }

    async fn get(
        &self,
        subject: &SubjectId,
        locale: &Locale,
    ) -> Result<Option<AttributeMap>, StagingError> {
        let now = Utc::now();
        let drafts = self.drafts.lock().await;

        Ok(drafts
            .get(subject)
            .filter(|draft| !draft.is_expired(self.ttl, now))
            .and_then(|draft| draft.locales.get(locale).cloned()))
    }

    async fn get_all(&self, subject: &SubjectId) -> Result<StagedLocales, StagingError> {
        let now = Utc::now();
        let drafts = self.drafts.lock().await;

        Ok(drafts
            .get(subject)
            .filter(|draft| !draft.is_expired(self.ttl, now))
            .map(|draft| draft.locales.clone())
            .unwrap_or_default())
    }

    async fn clear(&self, subject: &SubjectId) -> Result<(), StagingError> {
        self.drafts.lock().await.remove(subject);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StagingError> {
        let now = Utc::now();
        let mut drafts = self.drafts.lock().await;

        let before = drafts.len();
        drafts.retain(|_, draft| !draft.is_expired(self.ttl, now));
        Ok(before - drafts.len())
    }
}
