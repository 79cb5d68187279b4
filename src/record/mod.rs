//! Persisted multi-locale records.
//!
//! A [`Record`] keeps non-translatable attributes once and translatable
//! attributes as one value per locale. [`RecordStore`] is the persistence
//! seam: the editing core only ever loads a record and saves it back.

mod memory;
mod postgres;

pub use memory::MemoryRecordStore;
pub use postgres::PgRecordStore;

use crate::i18n::Locale;
use crate::subject::{AttributeMap, SubjectId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Translations of one attribute, keyed by locale.
pub type Translations = BTreeMap<Locale, Value>;

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("record database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("record store error: {0}")]
    Backend(String),
}

/// A record with translatable attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    id: Option<SubjectId>,
    attributes: AttributeMap,
    translations: BTreeMap<String, Translations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_locale: Option<Locale>,
}

impl Record {
    /// A record that has never been saved.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: SubjectId) -> Self {
        self.id = Some(id);
        self
    }

    /// Locale whose translation is returned when the requested one is missing.
    pub fn with_fallback_locale(mut self, locale: Locale) -> Self {
        self.fallback_locale = Some(locale);
        self
    }

    pub fn id(&self) -> Option<&SubjectId> {
        self.id.as_ref()
    }

    pub(crate) fn assign_id(&mut self, id: SubjectId) {
        self.id = Some(id);
    }

    pub fn fallback_locale(&self) -> Option<&Locale> {
        self.fallback_locale.as_ref()
    }

    /// Non-translatable attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    /// Write every given non-translatable attribute.
    pub fn fill(&mut self, attributes: &AttributeMap) {
        for (name, value) in attributes {
            self.attributes.insert(name.clone(), value.clone());
        }
    }

    /// Every attribute as seen in `locale`: non-translatable values plus each
    /// translatable attribute's translation for that locale.
    pub fn attributes_snapshot(&self, locale: &Locale) -> AttributeMap {
        let mut snapshot = self.attributes.clone();
        for name in self.translations.keys() {
            snapshot.insert(name.clone(), self.translation(name, locale));
        }
        snapshot
    }

    /// Translation of `attribute` in `locale`, falling back to the record's
    /// fallback locale, else `Null`.
    pub fn translation(&self, attribute: &str, locale: &Locale) -> Value {
        let Some(translations) = self.translations.get(attribute) else {
            return Value::Null;
        };

        translations
            .get(locale)
            .or_else(|| {
                self.fallback_locale
                    .as_ref()
                    .and_then(|fallback| translations.get(fallback))
            })
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Whether `attribute` has its own translation in `locale`.
    pub fn has_translation(&self, attribute: &str, locale: &Locale) -> bool {
        self.translations
            .get(attribute)
            .is_some_and(|translations| translations.contains_key(locale))
    }

    /// Every translation of `attribute`.
    pub fn translations_for(&self, attribute: &str) -> Translations {
        self.translations.get(attribute).cloned().unwrap_or_default()
    }

    /// Set the translation of `attribute` in `locale`. A `Null` value removes
    /// that locale's translation.
    pub fn set_translation(&mut self, attribute: &str, locale: &Locale, value: Value) {
        if value.is_null() {
            if let Some(translations) = self.translations.get_mut(attribute) {
                translations.remove(locale);
                if translations.is_empty() {
                    self.translations.remove(attribute);
                }
            }
            return;
        }

        self.translations
            .entry(attribute.to_string())
            .or_default()
            .insert(locale.clone(), value);
    }
}

/// Persistence for records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load a record by id.
    async fn load(&self, id: &SubjectId) -> Result<Option<Record>, RecordStoreError>;

    /// Durably write a record, assigning it an id on first save.
    async fn save(&self, record: &mut Record) -> Result<(), RecordStoreError>;
}
