use crate::record::{Record, RecordStore, RecordStoreError};
use crate::subject::SubjectId;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Process-local record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<SubjectId, Record>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an already-persisted record.
    pub async fn insert(&self, mut record: Record) -> SubjectId {
        let id = record.id().cloned().unwrap_or_else(SubjectId::generate);
        record.assign_id(id.clone());
        self.records.lock().await.insert(id.clone(), record);
        id
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn load(&self, id: &SubjectId) -> Result<Option<Record>, RecordStoreError> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn save(&self, record: &mut Record) -> Result<(), RecordStoreError> {
        if record.id().is_none() {
            record.assign_id(SubjectId::generate());
        }

        let id = record
            .id()
            .cloned()
            .ok_or_else(|| RecordStoreError::Backend("record has no id".to_string()))?;
        self.records.lock().await.insert(id, record.clone());
        Ok(())
    }
}
