//! Locale switching.
//!
//! The outgoing locale is always staged before the active locale moves, so
//! switching back and forth without saving never loses an edit.

use crate::error::Result;
use crate::form::FormSurface;
use crate::session::EditSession;
use crate::staging::StagingStore;
use tracing::{debug, info};

impl<F, S> EditSession<F, S>
where
    F: FormSurface,
    S: StagingStore + ?Sized,
{
    /// Switch the form to another enabled locale.
    ///
    /// Stages the active locale's translatable values from a fresh form
    /// snapshot, reconciles the new locale, then moves the active locale and
    /// refills the form.
    ///
    /// # Errors
    /// * [`Error::InvalidLocale`](crate::Error::InvalidLocale) if `code` is not
    ///   enabled; nothing is staged and the active locale is unchanged
    /// * [`Error::StagingStoreUnavailable`](crate::Error::StagingStoreUnavailable)
    ///   if staging cannot be written or read; the active locale and the form
    ///   are unchanged
    pub async fn switch_locale(&mut self, code: &str) -> Result<()> {
        let locale = self.resource.locales().resolve(code)?;

        self.stage_active_locale().await?;
        let data = self.reconcile_locale(&locale).await?;

        info!(
            "Switching {} from {} to {}",
            self.subject, self.active_locale, locale
        );
        self.active_locale = locale;
        self.load_form(data);

        Ok(())
    }

    /// Stage the form's translatable values under the active locale.
    ///
    /// A form that was never filled has nothing to stage.
    pub async fn stage_active_locale(&self) -> Result<()> {
        let Some(snapshot) = self.form.snapshot() else {
            debug!("Form for {} never filled, nothing to stage", self.subject);
            return Ok(());
        };

        let translatable = self.resource.schema().only_translatable(&snapshot);
        self.staging
            .put(&self.subject, &self.active_locale, translatable)
            .await?;

        debug!("Staged {} in {}", self.subject, self.active_locale);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::form::{FormState, FormSurface};
    use crate::i18n::{Locale, LocaleRegistry};
    use crate::record::{MemoryRecordStore, Record};
    use crate::session::{EditSession, TranslatableResource};
    use crate::staging::{MemoryStagingStore, StagedLocales, StagingError, StagingStore};
    use crate::subject::{AttributeMap, SubjectId, SubjectSchema};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    // ==================== Helper Functions ====================

    fn resource() -> Arc<TranslatableResource> {
        Arc::new(TranslatableResource::new(
            SubjectSchema::new(["title", "body"]).unwrap(),
            LocaleRegistry::new(["en", "fr", "es"], "en").unwrap(),
        ))
    }

    fn persisted() -> Record {
        let mut record = Record::new().with_id(SubjectId::from("1"));
        record.set_attribute("slug", json!("greeting"));
        record.set_translation("title", &Locale::new("en"), json!("Hi"));
        record.set_translation("title", &Locale::new("fr"), json!("Salut"));
        record.set_translation("title", &Locale::new("es"), json!("Hola"));
        record
    }

    /// Staging store whose writes or reads can be made to fail.
    #[derive(Default)]
    struct FlakyStagingStore {
        inner: MemoryStagingStore,
        failing: AtomicBool,
        failing_reads: AtomicBool,
    }

    #[async_trait]
    impl StagingStore for FlakyStagingStore {
        async fn put(
            &self,
            subject: &SubjectId,
            locale: &Locale,
            attributes: AttributeMap,
        ) -> Result<(), StagingError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StagingError::Backend("session store offline".to_string()));
            }
            self.inner.put(subject, locale, attributes).await
        }

        async fn get(
            &self,
            subject: &SubjectId,
            locale: &Locale,
        ) -> Result<Option<AttributeMap>, StagingError> {
            if self.failing_reads.load(Ordering::SeqCst) {
                return Err(StagingError::Backend("session store offline".to_string()));
            }
            self.inner.get(subject, locale).await
        }

        async fn get_all(&self, subject: &SubjectId) -> Result<StagedLocales, StagingError> {
            self.inner.get_all(subject).await
        }

        async fn clear(&self, subject: &SubjectId) -> Result<(), StagingError> {
            self.inner.clear(subject).await
        }

        async fn purge_expired(&self) -> Result<usize, StagingError> {
            self.inner.purge_expired().await
        }
    }

    // ==================== Switch Tests ====================

    #[tokio::test]
    async fn test_switch_stages_outgoing_locale() {
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session = EditSession::open_create(resource(), staging.clone(), FormState::new())
            .await
            .unwrap();

        session.form_mut().set("title", "Hello");
        session.form_mut().set("slug", "hello");
        session.switch_locale("fr").await.unwrap();

        let staged = staging
            .get(session.subject(), &Locale::new("en"))
            .await
            .unwrap()
            .expect("en staged");
        assert_eq!(staged["title"], json!("Hello"));
        assert!(!staged.contains_key("slug"), "non-translatable never staged");
        assert_eq!(session.active_locale().code(), "fr");
    }

    #[tokio::test]
    async fn test_switch_back_restores_edits() {
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session = EditSession::open_create(resource(), staging, FormState::new())
            .await
            .unwrap();

        session.form_mut().set("title", "Hello");
        session.switch_locale("fr").await.unwrap();
        assert_eq!(session.form().get("title"), Some(&Value::Null));

        session.form_mut().set("title", "Bonjour");
        session.switch_locale("en").await.unwrap();
        assert_eq!(session.form().get("title"), Some(&json!("Hello")));

        session.switch_locale("fr").await.unwrap();
        assert_eq!(session.form().get("title"), Some(&json!("Bonjour")));
    }

    #[tokio::test]
    async fn test_switch_keeps_non_translatable_edits() {
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session =
            EditSession::open_edit(resource(), staging, FormState::new(), persisted())
                .await
                .unwrap();

        session.form_mut().set("slug", "edited");
        session.switch_locale("es").await.unwrap();

        assert_eq!(session.form().get("slug"), Some(&json!("edited")));
        assert_eq!(session.form().get("title"), Some(&json!("Hola")));
    }

    #[tokio::test]
    async fn test_switch_to_invalid_locale_changes_nothing() {
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session = EditSession::open_create(resource(), staging.clone(), FormState::new())
            .await
            .unwrap();
        session.form_mut().set("title", "Hello");

        let result = session.switch_locale("de").await;

        assert!(matches!(result, Err(Error::InvalidLocale(code)) if code == "de"));
        assert_eq!(session.active_locale().code(), "en");
        assert_eq!(session.form().get("title"), Some(&json!("Hello")));
        assert!(staging.get_all(session.subject()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switch_to_same_locale_keeps_values() {
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session = EditSession::open_create(resource(), staging, FormState::new())
            .await
            .unwrap();
        session.form_mut().set("title", "Hello");

        session.switch_locale("en").await.unwrap();

        assert_eq!(session.form().get("title"), Some(&json!("Hello")));
    }

    #[tokio::test]
    async fn test_staging_failure_aborts_switch() {
        let staging = Arc::new(FlakyStagingStore::default());
        let mut session = EditSession::open_create(resource(), staging.clone(), FormState::new())
            .await
            .unwrap();
        session.form_mut().set("title", "Hello");
        staging.failing.store(true, Ordering::SeqCst);

        let result = session.switch_locale("fr").await;

        assert!(matches!(result, Err(Error::StagingStoreUnavailable(_))));
        assert_eq!(session.active_locale().code(), "en");
        assert_eq!(session.form().get("title"), Some(&json!("Hello")));
    }

    #[tokio::test]
    async fn test_read_failure_keeps_locale_and_form() {
        let staging = Arc::new(FlakyStagingStore::default());
        let records = MemoryRecordStore::new();
        let mut session =
            EditSession::open_edit(resource(), staging.clone(), FormState::new(), persisted())
                .await
                .unwrap();
        staging.failing_reads.store(true, Ordering::SeqCst);

        let result = session.switch_locale("fr").await;

        assert!(matches!(result, Err(Error::StagingStoreUnavailable(_))));
        assert_eq!(session.active_locale().code(), "en");
        assert_eq!(session.form().get("title"), Some(&json!("Hi")));

        staging.failing_reads.store(false, Ordering::SeqCst);
        let saved = session.commit(&records).await.unwrap();
        assert_eq!(saved.translation("title", &Locale::new("en")), json!("Hi"));
        assert_eq!(saved.translation("title", &Locale::new("fr")), json!("Salut"));
    }

    #[tokio::test]
    async fn test_stage_without_filled_form_is_noop() {
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session = EditSession::open_create(resource(), staging.clone(), FormState::new())
            .await
            .unwrap();
        session.form_mut().reset();

        session.stage_active_locale().await.unwrap();
        assert!(staging.get_all(session.subject()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_visiting_without_editing_stages_persisted_values() {
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session =
            EditSession::open_edit(resource(), staging.clone(), FormState::new(), persisted())
                .await
                .unwrap();

        session.switch_locale("fr").await.unwrap();
        session.switch_locale("en").await.unwrap();

        let all = staging.get_all(session.subject()).await.unwrap();
        assert_eq!(all[&Locale::new("en")]["title"], json!("Hi"));
        assert_eq!(all[&Locale::new("fr")]["title"], json!("Salut"));
        assert_eq!(session.form().snapshot().unwrap()["title"], json!("Hi"));
    }
}
