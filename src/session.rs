//! Edit sessions: one user editing one subject, one locale at a time.
//!
//! An [`EditSession`] owns the subject id, the mode, the active locale and
//! the form, and borrows the shared staging store. Locale switching lives in
//! [`crate::switcher`], saving in [`crate::commit`].

use crate::error::{Error, Result};
use crate::form::{FillHooks, FormSurface};
use crate::i18n::{Locale, LocaleRegistry};
use crate::reconcile::{FormReconciler, Mode};
use crate::record::{Record, RecordStore};
use crate::staging::StagingStore;
use crate::subject::{AttributeMap, SubjectId, SubjectSchema};
use std::sync::Arc;
use tracing::info;

/// Static configuration shared by every edit session of one kind of record.
#[derive(Debug, Clone)]
pub struct TranslatableResource {
    schema: SubjectSchema,
    locales: LocaleRegistry,
    hooks: FillHooks,
}

impl TranslatableResource {
    pub fn new(schema: SubjectSchema, locales: LocaleRegistry) -> Self {
        Self {
            schema,
            locales,
            hooks: FillHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: FillHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn schema(&self) -> &SubjectSchema {
        &self.schema
    }

    pub fn locales(&self) -> &LocaleRegistry {
        &self.locales
    }

    pub fn hooks(&self) -> &FillHooks {
        &self.hooks
    }

    pub(crate) fn reconciler(&self) -> FormReconciler<'_> {
        FormReconciler::new(&self.schema, &self.hooks)
    }

    /// Locale a record should be opened in: the default locale if the record
    /// has a translation for it, else the first enabled locale it has a
    /// translation for, else the default locale.
    pub fn initial_locale(&self, record: &Record) -> Locale {
        let default = self.locales.default_locale();
        let marker = self.schema.primary_attribute();

        if record.has_translation(marker, default) {
            return default.clone();
        }

        self.locales
            .enabled_locales()
            .iter()
            .find(|locale| record.has_translation(marker, locale))
            .unwrap_or(default)
            .clone()
    }
}

/// A single user's editing session over one subject.
pub struct EditSession<F, S: ?Sized = dyn StagingStore> {
    pub(crate) resource: Arc<TranslatableResource>,
    pub(crate) staging: Arc<S>,
    pub(crate) form: F,
    pub(crate) subject: SubjectId,
    pub(crate) mode: Mode,
    pub(crate) active_locale: Locale,
}

impl<F, S> EditSession<F, S>
where
    F: FormSurface,
    S: StagingStore + ?Sized,
{
    /// Open a create session under a fresh draft id and fill the form.
    pub async fn open_create(
        resource: Arc<TranslatableResource>,
        staging: Arc<S>,
        form: F,
    ) -> Result<Self> {
        Self::open_create_with_id(resource, staging, form, SubjectId::draft()).await
    }

    /// Open a create session under a host-provided draft id, e.g. one that
    /// survives page reloads, and fill the form.
    pub async fn open_create_with_id(
        resource: Arc<TranslatableResource>,
        staging: Arc<S>,
        form: F,
        draft_id: SubjectId,
    ) -> Result<Self> {
        let active_locale = resource.locales().default_locale().clone();
        info!("Opening create session {} in {}", draft_id, active_locale);

        let mut session = Self {
            resource,
            staging,
            form,
            subject: draft_id,
            mode: Mode::Create,
            active_locale,
        };
        session.fill_form().await?;
        Ok(session)
    }

    /// Open an edit session over a loaded record and fill the form.
    ///
    /// # Errors
    /// [`Error::UnsavedRecord`] if the record has no id to key drafts by.
    pub async fn open_edit(
        resource: Arc<TranslatableResource>,
        staging: Arc<S>,
        form: F,
        record: Record,
    ) -> Result<Self> {
        let subject = record.id().cloned().ok_or(Error::UnsavedRecord)?;
        let active_locale = resource.initial_locale(&record);
        info!("Opening edit session {} in {}", subject, active_locale);

        let mut session = Self {
            resource,
            staging,
            form,
            subject,
            mode: Mode::Edit(record),
            active_locale,
        };
        session.fill_form().await?;
        Ok(session)
    }

    /// Load a record by id and open an edit session over it.
    ///
    /// # Errors
    /// * [`Error::RecordNotFound`] if no record has this id
    /// * [`Error::RecordLoadFailure`] if the record store cannot be read
    pub async fn open_edit_by_id<R>(
        resource: Arc<TranslatableResource>,
        staging: Arc<S>,
        form: F,
        records: &R,
        id: &SubjectId,
    ) -> Result<Self>
    where
        R: RecordStore + ?Sized,
    {
        let record = records
            .load(id)
            .await
            .map_err(Error::RecordLoadFailure)?
            .ok_or_else(|| Error::RecordNotFound(id.clone()))?;

        Self::open_edit(resource, staging, form, record).await
    }

    pub fn subject(&self) -> &SubjectId {
        &self.subject
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn active_locale(&self) -> &Locale {
        &self.active_locale
    }

    pub fn resource(&self) -> &TranslatableResource {
        &self.resource
    }

    /// Enabled locales to offer in the locale switcher.
    pub fn locale_options(&self) -> &[Locale] {
        self.resource.locales().enabled_locales()
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    /// The form, for applying user edits.
    pub fn form_mut(&mut self) -> &mut F {
        &mut self.form
    }

    /// Reconcile the active locale and load the result into the form.
    ///
    /// On error the form is left as it was.
    pub async fn fill_form(&mut self) -> Result<()> {
        let data = self.reconcile_locale(&self.active_locale).await?;
        self.load_form(data);
        Ok(())
    }

    /// Form data for `locale`, computed from the current form snapshot
    /// without touching the form.
    pub(crate) async fn reconcile_locale(&self, locale: &Locale) -> Result<AttributeMap> {
        let current = self.form.snapshot();
        self.resource
            .reconciler()
            .reconcile(
                self.staging.as_ref(),
                &self.subject,
                locale,
                &self.mode,
                current.as_ref(),
            )
            .await
    }

    pub(crate) fn load_form(&mut self, data: AttributeMap) {
        self.form.load(data);
        self.resource.hooks().after_fill();
    }

    /// Discard every staged draft of this session's subject.
    pub async fn abandon(self) -> Result<()> {
        self.staging.clear(&self.subject).await?;
        info!("Abandoned edit session {}", self.subject);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormState;
    use crate::record::{MemoryRecordStore, RecordStoreError};
    use crate::staging::MemoryStagingStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    // ==================== Helper Functions ====================

    fn resource(locales: &[&str], default: &str) -> TranslatableResource {
        TranslatableResource::new(
            SubjectSchema::new(["title"]).unwrap(),
            LocaleRegistry::new(locales.iter().copied(), default).unwrap(),
        )
    }

    fn record_with(translations: &[(&str, &str)]) -> Record {
        let mut record = Record::new().with_id(SubjectId::from("1"));
        for (locale, title) in translations {
            record.set_translation("title", &Locale::new(*locale), json!(title));
        }
        record
    }

    // ==================== Initial Locale Tests ====================

    #[test]
    fn test_initial_locale_prefers_default() {
        let resource = resource(&["en", "fr"], "en");
        let record = record_with(&[("fr", "Salut"), ("en", "Hi")]);
        assert_eq!(resource.initial_locale(&record).code(), "en");
    }

    #[test]
    fn test_initial_locale_first_enabled_with_translation() {
        let resource = resource(&["en", "es", "fr"], "en");
        let record = record_with(&[("fr", "Salut"), ("es", "Hola")]);
        assert_eq!(resource.initial_locale(&record).code(), "es");
    }

    #[test]
    fn test_initial_locale_ignores_disabled_locales() {
        let resource = resource(&["en", "fr"], "en");
        let record = record_with(&[("de", "Hallo"), ("fr", "Salut")]);
        assert_eq!(resource.initial_locale(&record).code(), "fr");
    }

    #[test]
    fn test_initial_locale_defaults_without_translations() {
        let resource = resource(&["en", "fr"], "fr");
        let record = record_with(&[]);
        assert_eq!(resource.initial_locale(&record).code(), "fr");
    }

    // ==================== Open Tests ====================

    #[tokio::test]
    async fn test_open_create_uses_default_locale_and_defaults() {
        let resource = Arc::new(resource(&["en", "fr"], "fr"));
        let staging: Arc<dyn StagingStore> = Arc::new(MemoryStagingStore::new());
        let form = FormState::new().with_default("title", "Untitled");

        let session = EditSession::open_create(resource, staging, form).await.unwrap();

        assert!(session.mode().is_create());
        assert_eq!(session.active_locale().code(), "fr");
        assert!(session.subject().as_str().starts_with("draft-"));
        assert_eq!(session.form().get("title"), Some(&json!("Untitled")));
    }

    #[tokio::test]
    async fn test_open_edit_fills_initial_locale() {
        let resource = Arc::new(resource(&["en", "fr"], "en"));
        let staging = Arc::new(MemoryStagingStore::new());
        let record = record_with(&[("fr", "Salut")]);

        let session = EditSession::open_edit(resource, staging, FormState::new(), record)
            .await
            .unwrap();

        assert_eq!(session.active_locale().code(), "fr");
        assert_eq!(session.subject().as_str(), "1");
        assert_eq!(session.form().get("title"), Some(&json!("Salut")));
    }

    #[tokio::test]
    async fn test_open_edit_unsaved_record_fails() {
        let resource = Arc::new(resource(&["en"], "en"));
        let staging = Arc::new(MemoryStagingStore::new());

        let result =
            EditSession::open_edit(resource, staging, FormState::new(), Record::new()).await;
        assert!(matches!(result, Err(Error::UnsavedRecord)));
    }

    #[tokio::test]
    async fn test_open_edit_by_id_missing() {
        let resource = Arc::new(resource(&["en"], "en"));
        let staging = Arc::new(MemoryStagingStore::new());
        let records = MemoryRecordStore::new();

        let result = EditSession::open_edit_by_id(
            resource,
            staging,
            FormState::new(),
            &records,
            &SubjectId::from("404"),
        )
        .await;
        assert!(matches!(result, Err(Error::RecordNotFound(id)) if id.as_str() == "404"));
    }

    /// Record store that cannot be read.
    struct OfflineRecordStore;

    #[async_trait::async_trait]
    impl RecordStore for OfflineRecordStore {
        async fn load(&self, _id: &SubjectId) -> Result<Option<Record>, RecordStoreError> {
            Err(RecordStoreError::Backend("connection refused".to_string()))
        }

        async fn save(&self, _record: &mut Record) -> Result<(), RecordStoreError> {
            Err(RecordStoreError::Backend("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_open_edit_by_id_load_failure() {
        let resource = Arc::new(resource(&["en"], "en"));
        let staging = Arc::new(MemoryStagingStore::new());

        let result = EditSession::open_edit_by_id(
            resource,
            staging,
            FormState::new(),
            &OfflineRecordStore,
            &SubjectId::from("1"),
        )
        .await;
        assert!(matches!(result, Err(Error::RecordLoadFailure(_))));
    }

    #[tokio::test]
    async fn test_after_fill_runs_on_open() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let resource = Arc::new(resource(&["en"], "en").with_hooks(
            FillHooks::new().with_after_fill(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        ));
        let staging = Arc::new(MemoryStagingStore::new());

        EditSession::open_create(resource, staging, FormState::new())
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_abandon_clears_staging() {
        let resource = Arc::new(resource(&["en", "fr"], "en"));
        let staging = Arc::new(MemoryStagingStore::new());
        let mut session = EditSession::open_create(resource, staging.clone(), FormState::new())
            .await
            .unwrap();
        session.form_mut().set("title", "Hello");
        session.switch_locale("fr").await.unwrap();
        let subject = session.subject().clone();
        assert!(!staging.get_all(&subject).await.unwrap().is_empty());

        session.abandon().await.unwrap();
        assert!(staging.get_all(&subject).await.unwrap().is_empty());
    }
}
