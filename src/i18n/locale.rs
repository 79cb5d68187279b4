//! Locale type: an opaque, ordered locale code.
//!
//! A `Locale` carries no validation of its own. Membership in the enabled
//! locale set is checked by [`LocaleRegistry::resolve`](crate::i18n::LocaleRegistry::resolve),
//! which is the only way the editing session accepts a locale from a caller.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A locale code such as `"en"`, `"fr"` or `"pt-BR"`.
///
/// Serializes as a plain string so it can be used as a JSON object key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Create a locale from any string-like code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the locale code.
    pub fn code(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locale {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Locale {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl AsRef<str> for Locale {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Locale {
    fn borrow(&self) -> &str {
        &self.0
    }
}
