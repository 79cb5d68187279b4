//! Locale staging: per-subject, per-locale drafts of translatable attributes.
//!
//! A staging entry is keyed by `(subject, locale)` and holds the full set of
//! translatable attribute values the user last had in the form for that
//! locale. All entries of one subject form a *draft*. Drafts expire as a
//! unit: a TTL never drops one locale while keeping another.
//!
//! Backends:
//! - `memory`: process-local map, for single-process hosts and tests
//! - `file`: one JSON draft file per subject in a directory
//! - `postgres`: shared table for multi-process hosts

mod file;
mod memory;
mod postgres;

pub use file::FileStagingStore;
pub use memory::MemoryStagingStore;
pub use postgres::PgStagingStore;

use crate::i18n::Locale;
use crate::subject::{AttributeMap, SubjectId};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Every staged locale of one subject.
pub type StagedLocales = BTreeMap<Locale, AttributeMap>;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("staging io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("staged draft is not valid json: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("staging database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("staging store error: {0}")]
    Backend(String),
}

/// Storage for staged drafts.
///
/// "No entry" is a normal answer (the locale was never visited); any failure
/// to reach the transport must be returned as an error instead.
#[async_trait]
pub trait StagingStore: Send + Sync {
    /// Replace the staging entry for `(subject, locale)`.
    async fn put(
        &self,
        subject: &SubjectId,
        locale: &Locale,
        attributes: AttributeMap,
    ) -> Result<(), StagingError>;

    /// Staging entry for `(subject, locale)`, if the locale was visited.
    async fn get(
        &self,
        subject: &SubjectId,
        locale: &Locale,
    ) -> Result<Option<AttributeMap>, StagingError>;

    /// Every staged locale of the subject. Empty if nothing is staged.
    async fn get_all(&self, subject: &SubjectId) -> Result<StagedLocales, StagingError>;

    /// Remove every staging entry of the subject.
    async fn clear(&self, subject: &SubjectId) -> Result<(), StagingError>;

    /// Drop every expired draft and return how many were dropped.
    async fn purge_expired(&self) -> Result<usize, StagingError>;
}

/// A subject's staged locales plus the time of its latest write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Draft {
    pub(crate) touched_at: DateTime<Utc>,
    pub(crate) locales: StagedLocales,
}

impl Draft {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            touched_at: now,
            locales: StagedLocales::new(),
        }
    }

    pub(crate) fn is_expired(&self, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
        is_expired(self.touched_at, ttl, now)
    }

    pub(crate) fn stage(&mut self, locale: &Locale, attributes: AttributeMap, now: DateTime<Utc>) {
        self.locales.insert(locale.clone(), attributes);
        self.touched_at = now;
    }
}

/// Whether a draft last written at `touched_at` has outlived `ttl`.
pub(crate) fn is_expired(touched_at: DateTime<Utc>, ttl: Option<Duration>, now: DateTime<Utc>) -> bool {
    match ttl {
        Some(ttl) => now - touched_at > ttl,
        None => false,
    }
}
