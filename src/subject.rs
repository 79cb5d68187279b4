//! Subjects: the records being created or edited, and their attribute layout.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Attribute name to value mapping, as held by a form or a staging entry.
pub type AttributeMap = serde_json::Map<String, serde_json::Value>;

/// Stable identifier of the subject of an edit session.
///
/// Create sessions use a generated draft id; edit sessions use the record's
/// primary identifier. Every staging key includes it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh draft id for a record that does not exist yet.
    pub fn draft() -> Self {
        Self(format!("draft-{}", Uuid::new_v4()))
    }

    /// Generate a fresh record id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// The statically configured list of translatable attributes of a subject.
///
/// Every attribute not listed here is non-translatable and never staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSchema {
    translatable: Vec<String>,
}

impl SubjectSchema {
    /// # Errors
    /// [`Error::MissingTranslatableAttributeList`] if no attribute is given.
    pub fn new<I, S>(translatable: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut attributes: Vec<String> = Vec::new();
        for name in translatable.into_iter().map(Into::into) {
            if !attributes.contains(&name) {
                attributes.push(name);
            }
        }

        if attributes.is_empty() {
            return Err(Error::MissingTranslatableAttributeList);
        }

        Ok(Self {
            translatable: attributes,
        })
    }

    pub fn translatable_attributes(&self) -> &[String] {
        &self.translatable
    }

    /// The first translatable attribute, used to check which locales a
    /// record already carries.
    pub fn primary_attribute(&self) -> &str {
        // Non-empty by construction.
        self.translatable.first().map(String::as_str).unwrap_or_default()
    }

    pub fn is_translatable(&self, name: &str) -> bool {
        self.translatable.iter().any(|attribute| attribute == name)
    }

    /// Keep only the translatable attributes of `data`.
    pub fn only_translatable(&self, data: &AttributeMap) -> AttributeMap {
        data.iter()
            .filter(|(name, _)| self.is_translatable(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Drop the translatable attributes of `data`.
    pub fn except_translatable(&self, data: &AttributeMap) -> AttributeMap {
        data.iter()
            .filter(|(name, _)| !self.is_translatable(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}
