//! Locale handling for translatable records.
//!
//! - `locale`: the opaque `Locale` code type
//! - `registry`: the enabled locale set and default locale, validated at setup
//!
//! # Example
//!
//! ```rust,ignore
//! use translatable_forms::i18n::LocaleRegistry;
//!
//! let registry = LocaleRegistry::new(["en", "fr"], "en")?;
//! let french = registry.resolve("fr")?;
//! ```

mod locale;
mod registry;

pub use locale::Locale;
pub use registry::LocaleRegistry;
