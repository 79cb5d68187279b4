use crate::i18n::Locale;
use crate::staging::{Draft, StagedLocales, StagingError, StagingStore};
use crate::subject::{AttributeMap, SubjectId};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

const DRAFT_EXTENSION: &str = "json";

/// Staging store keeping one JSON draft file per subject.
///
/// Writes go through a temporary file and a rename, so a reader never sees
/// a half-written draft.
#[derive(Debug)]
pub struct FileStagingStore {
    dir: PathBuf,
    ttl: Option<Duration>,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStagingStore {
    /// Open (and create if needed) a draft directory.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StagingError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir,
            ttl: None,
            write_lock: Mutex::new(()),
        })
    }

    /// Expire drafts `ttl` after their latest write.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn draft_path(&self, subject: &SubjectId) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_file_stem(subject.as_str()), DRAFT_EXTENSION))
    }

    async fn read_draft(&self, path: &Path) -> Result<Option<Draft>, StagingError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_live_draft(&self, subject: &SubjectId) -> Result<Option<Draft>, StagingError> {
        let draft = self.read_draft(&self.draft_path(subject)).await?;
        Ok(draft.filter(|draft| !draft.is_expired(self.ttl, Utc::now())))
    }

    async fn write_draft(&self, path: &Path, draft: &Draft) -> Result<(), StagingError> {
        let bytes = serde_json::to_vec_pretty(draft)?;
        let tmp = path.with_extension(format!("{}.tmp-{}", DRAFT_EXTENSION, Uuid::new_v4()));

        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn remove_draft(&self, path: &Path) -> Result<bool, StagingError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl StagingStore for FileStagingStore {
    async fn put(
        &self,
        subject: &SubjectId,
        locale: &Locale,
        attributes: AttributeMap,
    ) -> Result<(), StagingError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let path = self.draft_path(subject);

        let mut draft = match self.read_draft(&path).await? {
            Some(draft) if !draft.is_expired(self.ttl, now) => draft,
            Some(_) => {
                debug!("Draft for {} expired, starting a new one", subject);
                Draft::new(now)
            }
            None => Draft::new(now),
        };
        draft.stage(locale, attributes, now);

        self.write_draft(&path, &draft).await
    }

    async fn get(
        &self,
        subject: &SubjectId,
        locale: &Locale,
    ) -> Result<Option<AttributeMap>, StagingError> {
        let draft = self.read_live_draft(subject).await?;
        Ok(draft.and_then(|mut draft| draft.locales.remove(locale)))
    }

    async fn get_all(&self, subject: &SubjectId) -> Result<StagedLocales, StagingError> {
        let draft = self.read_live_draft(subject).await?;
        Ok(draft.map(|draft| draft.locales).unwrap_or_default())
    }

    async fn clear(&self, subject: &SubjectId) -> Result<(), StagingError> {
        let _guard = self.write_lock.lock().await;
        self.remove_draft(&self.draft_path(subject)).await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, StagingError> {
        let _guard = self.write_lock.lock().await;
        let now = Utc::now();
        let mut purged = 0;

        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(DRAFT_EXTENSION) {
                continue;
            }

            let draft = match self.read_draft(&path).await {
                Ok(Some(draft)) => draft,
                Ok(None) => continue,
                Err(StagingError::Serialization(e)) => {
                    warn!("Skipping unreadable draft {}: {}", path.display(), e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if draft.is_expired(self.ttl, now) && self.remove_draft(&path).await? {
                purged += 1;
            }
        }

        Ok(purged)
    }
}

/// Encode a subject id into a file stem that is safe on every platform.
///
/// ASCII letters, digits, `-` and `_` are kept; every other byte becomes
/// `%XX`. The encoding is injective, so two subjects never share a file.
fn encode_file_stem(id: &str) -> String {
    let mut stem = String::with_capacity(id.len());
    for byte in id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            stem.push(byte as char);
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}
