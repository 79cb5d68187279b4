//! Error types surfaced by the editing core.
//!
//! Store backends report their own error types ([`StagingError`],
//! [`RecordStoreError`]); the session maps them into [`Error`] so callers can
//! tell a staging outage apart from a failed save.

use crate::record::RecordStoreError;
use crate::staging::StagingError;
use crate::subject::SubjectId;
use thiserror::Error;

/// Result alias for editing operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The requested locale is not part of the enabled locale set.
    #[error("locale '{0}' is not enabled")]
    InvalidLocale(String),

    /// The subject declares no translatable attributes.
    #[error("subject configuration declares no translatable attributes")]
    MissingTranslatableAttributeList,

    /// The enabled locale set is empty.
    #[error("enabled locale set is empty")]
    EmptyLocaleSet,

    /// The default locale is not part of the enabled locale set.
    #[error("default locale '{0}' is not in the enabled locale set")]
    DefaultLocaleNotEnabled(String),

    /// The record could not be persisted. Staged drafts are left in place.
    #[error("failed to persist record: {0}")]
    PersistenceFailure(#[source] RecordStoreError),

    /// The staging transport could not be read or written.
    #[error("staging store unavailable: {0}")]
    StagingStoreUnavailable(#[from] StagingError),

    /// An edit session was opened over a record that was never saved.
    #[error("cannot edit a record that was never saved")]
    UnsavedRecord,

    /// The record to edit could not be loaded.
    #[error("failed to load record: {0}")]
    RecordLoadFailure(#[source] RecordStoreError),

    /// An edit session was opened for a record that does not exist.
    #[error("record '{0}' not found")]
    RecordNotFound(SubjectId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_locale_message() {
        let err = Error::InvalidLocale("de".to_string());
        assert_eq!(err.to_string(), "locale 'de' is not enabled");
    }

    #[test]
    fn test_staging_error_converts() {
        let err: Error = StagingError::Backend("connection reset".to_string()).into();
        assert!(matches!(err, Error::StagingStoreUnavailable(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn test_load_failure_is_not_a_save_failure() {
        let err = Error::RecordLoadFailure(RecordStoreError::Backend("timeout".to_string()));
        assert!(err.to_string().starts_with("failed to load record"));
        assert!(!matches!(err, Error::PersistenceFailure(_)));
    }

    #[test]
    fn test_persistence_failure_keeps_source() {
        let err = Error::PersistenceFailure(RecordStoreError::Backend("disk full".to_string()));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("record store error: disk full"));
    }
}
