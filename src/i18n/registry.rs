//! Locale registry: the enabled locale set and the default locale.
//!
//! The registry is built once at setup from configuration and shared by every
//! editing session of a resource. Construction validates the set, so an
//! invalid locale configuration fails fast instead of on the first switch.

use crate::error::{Error, Result};
use crate::i18n::Locale;

/// Ordered set of enabled locales with exactly one default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRegistry {
    locales: Vec<Locale>,
    default: Locale,
}

impl LocaleRegistry {
    /// Build a registry from an ordered list of locale codes and a default.
    ///
    /// Duplicate codes are dropped, keeping the first occurrence.
    ///
    /// # Errors
    /// * [`Error::EmptyLocaleSet`] if no locale is given
    /// * [`Error::DefaultLocaleNotEnabled`] if `default` is not in the list
    pub fn new<I, L>(locales: I, default: impl Into<Locale>) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Locale>,
    {
        let mut enabled: Vec<Locale> = Vec::new();
        for locale in locales.into_iter().map(Into::into) {
            if !enabled.contains(&locale) {
                enabled.push(locale);
            }
        }

        if enabled.is_empty() {
            return Err(Error::EmptyLocaleSet);
        }

        let default = default.into();
        if !enabled.contains(&default) {
            return Err(Error::DefaultLocaleNotEnabled(default.code().to_string()));
        }

        Ok(Self {
            locales: enabled,
            default,
        })
    }

    /// Build a registry whose default is the first enabled locale.
    pub fn with_first_as_default<I, L>(locales: I) -> Result<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Locale>,
    {
        let locales: Vec<Locale> = locales.into_iter().map(Into::into).collect();
        let default = locales.first().cloned().ok_or(Error::EmptyLocaleSet)?;
        Self::new(locales, default)
    }

    /// All enabled locales, in configured order.
    pub fn enabled_locales(&self) -> &[Locale] {
        &self.locales
    }

    /// The default locale.
    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    /// Check if a locale code is enabled.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.locales.iter().any(|locale| locale.code() == code)
    }

    /// Resolve a code to an enabled locale.
    ///
    /// # Errors
    /// [`Error::InvalidLocale`] if the code is not enabled.
    pub fn resolve(&self, code: &str) -> Result<Locale> {
        self.locales
            .iter()
            .find(|locale| locale.code() == code)
            .cloned()
            .ok_or_else(|| Error::InvalidLocale(code.to_string()))
    }
}
