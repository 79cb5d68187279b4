//! Form reconciliation: what the form shows when a locale becomes active.
//!
//! Precedence per translatable attribute, highest first:
//! 1. the staged value for `(subject, locale)`
//! 2. create mode: `null`; edit mode: the record's translation for `locale`

use crate::error::Result;
use crate::form::FillHooks;
use crate::i18n::Locale;
use crate::record::Record;
use crate::staging::StagingStore;
use crate::subject::{AttributeMap, SubjectId, SubjectSchema};
use serde_json::Value;
use tracing::debug;

/// Whether the session creates a new record or edits a persisted one.
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Create,
    /// Edit mode carries the persisted record snapshot.
    Edit(Record),
}

impl Mode {
    pub fn is_create(&self) -> bool {
        matches!(self, Mode::Create)
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Mode::Create => None,
            Mode::Edit(record) => Some(record),
        }
    }
}

/// Computes the attribute values to load into the form for a locale.
#[derive(Debug, Clone, Copy)]
pub struct FormReconciler<'a> {
    schema: &'a SubjectSchema,
    hooks: &'a FillHooks,
}

impl<'a> FormReconciler<'a> {
    pub fn new(schema: &'a SubjectSchema, hooks: &'a FillHooks) -> Self {
        Self { schema, hooks }
    }

    /// Reconcile the form data for `(subject, locale)`.
    ///
    /// `current` is the form's snapshot, `None` if the form was never filled.
    /// Reading staging is the only side effect, so two calls with no edit in
    /// between return the same data.
    ///
    /// # Errors
    /// [`Error::StagingStoreUnavailable`](crate::Error::StagingStoreUnavailable)
    /// if the staged entry cannot be read.
    pub async fn reconcile<S>(
        &self,
        staging: &S,
        subject: &SubjectId,
        locale: &Locale,
        mode: &Mode,
        current: Option<&AttributeMap>,
    ) -> Result<AttributeMap>
    where
        S: StagingStore + ?Sized,
    {
        let staged = staging.get(subject, locale).await?;
        debug!(
            "Reconciling {} in {} (staged: {})",
            subject,
            locale,
            staged.is_some()
        );

        let mut data = match (mode, current) {
            (_, Some(current)) => current.clone(),
            (Mode::Create, None) => AttributeMap::new(),
            (Mode::Edit(record), None) => record.attributes_snapshot(locale),
        };

        // A create form loaded for the first time keeps its field defaults:
        // only staged values are applied.
        let null_fill = !(mode.is_create() && current.is_none());

        for attribute in self.schema.translatable_attributes() {
            let staged_value = staged.as_ref().and_then(|entry| entry.get(attribute));

            let value = match (staged_value, mode) {
                (Some(value), _) => value.clone(),
                (None, Mode::Create) if null_fill => Value::Null,
                (None, Mode::Create) => continue,
                (None, Mode::Edit(record)) => record.translation(attribute, locale),
            };
            data.insert(attribute.clone(), value);
        }

        Ok(self.hooks.before_fill(data))
    }
}
