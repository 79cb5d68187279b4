//! Commit: merge every staged locale into the record and persist it.
//!
//! Order matters. Staging is cleared only after the record store confirms
//! the write, so a failed save can be retried without losing any locale.

use crate::error::{Error, Result};
use crate::form::FormSurface;
use crate::i18n::Locale;
use crate::record::{Record, RecordStore};
use crate::reconcile::Mode;
use crate::session::EditSession;
use crate::staging::StagingStore;
use crate::subject::{AttributeMap, SubjectId, SubjectSchema};
use tracing::{debug, info, warn};

/// Merges staged drafts into a record at save time.
pub struct CommitCoordinator<'a, S: ?Sized, R: ?Sized> {
    schema: &'a SubjectSchema,
    staging: &'a S,
    records: &'a R,
}

impl<'a, S, R> CommitCoordinator<'a, S, R>
where
    S: StagingStore + ?Sized,
    R: RecordStore + ?Sized,
{
    pub fn new(schema: &'a SubjectSchema, staging: &'a S, records: &'a R) -> Self {
        Self {
            schema,
            staging,
            records,
        }
    }

    /// Commit the subject's edits into `target` and persist it.
    ///
    /// `final_snapshot` is the form as the user submitted it while
    /// `active_locale` was shown.
    ///
    /// # Errors
    /// * [`Error::StagingStoreUnavailable`] if staging cannot be read or written
    /// * [`Error::PersistenceFailure`] if the save fails; staged drafts are kept
    pub async fn commit(
        &self,
        subject: &SubjectId,
        active_locale: &Locale,
        final_snapshot: &AttributeMap,
        mut target: Record,
    ) -> Result<Record> {
        self.staging
            .put(
                subject,
                active_locale,
                self.schema.only_translatable(final_snapshot),
            )
            .await?;

        target.fill(&self.schema.except_translatable(final_snapshot));

        let staged = self.staging.get_all(subject).await?;
        for (locale, attributes) in &staged {
            for (name, value) in self.schema.only_translatable(attributes) {
                target.set_translation(&name, locale, value);
            }
        }
        debug!("Merged {} staged locale(s) for {}", staged.len(), subject);

        if let Err(e) = self.records.save(&mut target).await {
            warn!("Saving {} failed, keeping staged drafts: {}", subject, e);
            return Err(Error::PersistenceFailure(e));
        }

        self.staging.clear(subject).await?;
        info!(
            "Committed {} ({} locale(s))",
            target.id().map(SubjectId::as_str).unwrap_or("?"),
            staged.len()
        );

        Ok(target)
    }
}

impl<F, S> EditSession<F, S>
where
    F: FormSurface,
    S: StagingStore + ?Sized,
{
    /// Save the session's subject with every visited locale's edits.
    ///
    /// Afterwards the session edits the saved record, so a create session
    /// moves from its draft id to the record's id.
    pub async fn commit<R>(&mut self, records: &R) -> Result<Record>
    where
        R: RecordStore + ?Sized,
    {
        let final_snapshot = self.form.snapshot().unwrap_or_default();
        let target = match &self.mode {
            Mode::Create => self.new_record(),
            Mode::Edit(record) => record.clone(),
        };

        let saved = CommitCoordinator::new(self.resource.schema(), self.staging.as_ref(), records)
            .commit(&self.subject, &self.active_locale, &final_snapshot, target)
            .await?;

        if let Some(id) = saved.id() {
            self.subject = id.clone();
            self.mode = Mode::Edit(saved.clone());
        }
        Ok(saved)
    }

    /// Save, then start a fresh create draft: new draft id, empty form,
    /// default locale.
    ///
    /// Once the save succeeds the saved record is returned even if the new
    /// draft cannot be filled; the form is then left unfilled and
    /// [`fill_form`](Self::fill_form) can be retried.
    pub async fn commit_and_create_another<R>(&mut self, records: &R) -> Result<Record>
    where
        R: RecordStore + ?Sized,
    {
        let saved = self.commit(records).await?;

        self.subject = SubjectId::draft();
        self.mode = Mode::Create;
        self.active_locale = self.resource.locales().default_locale().clone();
        self.form.reset();
        info!("Starting another create session {}", self.subject);

        if let Err(e) = self.fill_form().await {
            warn!("Saved record but could not fill the next draft {}: {}", self.subject, e);
        }
        Ok(saved)
    }

    fn new_record(&self) -> Record {
        Record::new().with_fallback_locale(self.resource.locales().default_locale().clone())
    }
}
