//! Edit multi-language records one locale at a time.
//!
//! Switching the form to another locale stages the outgoing locale's
//! translatable values; saving merges every staged locale into the record
//! in one write.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use translatable_forms::{
//!     EditSession, FormState, LocaleRegistry, MemoryRecordStore, MemoryStagingStore,
//!     SubjectSchema, TranslatableResource,
//! };
//!
//! let resource = Arc::new(TranslatableResource::new(
//!     SubjectSchema::new(["title", "body"])?,
//!     LocaleRegistry::new(["en", "fr"], "en")?,
//! ));
//! let staging = Arc::new(MemoryStagingStore::new());
//! let records = MemoryRecordStore::new();
//!
//! let mut session = EditSession::open_create(resource, staging, FormState::new()).await?;
//! session.form_mut().set("title", "Hello");
//! session.switch_locale("fr").await?;
//! session.form_mut().set("title", "Bonjour");
//! let record = session.commit(&records).await?;
//! ```

pub mod commit;
pub mod config;
pub mod error;
pub mod form;
pub mod i18n;
pub mod reconcile;
pub mod record;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod staging;
pub mod subject;
pub mod switcher;

pub use commit::CommitCoordinator;
pub use error::{Error, Result};
pub use form::{FillHooks, FormState, FormSurface};
pub use i18n::{Locale, LocaleRegistry};
pub use reconcile::{FormReconciler, Mode};
pub use record::{MemoryRecordStore, PgRecordStore, Record, RecordStore, RecordStoreError};
pub use session::{EditSession, TranslatableResource};
pub use staging::{
    FileStagingStore, MemoryStagingStore, PgStagingStore, StagedLocales, StagingError,
    StagingStore,
};
pub use subject::{AttributeMap, SubjectId, SubjectSchema};
