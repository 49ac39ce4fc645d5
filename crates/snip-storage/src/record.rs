use crate::kv::KeyValueStore;
use async_trait::async_trait;
use snip_core::error::StorageError;
use snip_core::repository::{RecordStore, Result, UrlRecord};
use tracing::{trace, warn};

/// Key under which the full record set is stored.
pub const RECORDS_KEY: &str = "shortenedUrls";

/// [`RecordStore`] that keeps the whole record set as one JSON array in a
/// [`KeyValueStore`].
///
/// Decoding is fail-open: a missing or corrupt blob reads as an empty
/// record set, and the next write replaces it.
#[derive(Debug, Clone)]
pub struct KvRecordStore<K> {
    kv: K,
    key: String,
}

impl<K: KeyValueStore> KvRecordStore<K> {
    pub fn new(kv: K) -> Self {
        Self::with_key(kv, RECORDS_KEY)
    }

    /// Stores the record set under a custom key.
    pub fn with_key(kv: K, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// Returns a reference to the underlying key-value store.
    pub fn kv(&self) -> &K {
        &self.kv
    }
}

#[async_trait]
impl<K: KeyValueStore> RecordStore for KvRecordStore<K> {
    async fn read_all(&self) -> Result<Vec<UrlRecord>> {
        let Some(blob) = self.kv.get(&self.key).await? else {
            trace!(key = %self.key, "record set absent, treating as empty");
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<UrlRecord>>(&blob) {
            Ok(records) => {
                trace!(key = %self.key, count = records.len(), "read record set");
                Ok(records)
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "stored record set is unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    async fn write_all(&self, records: &[UrlRecord]) -> Result<()> {
        let blob = serde_json::to_string(records)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        trace!(key = %self.key, count = records.len(), "writing record set");
        self.kv.set(&self.key, blob).await
    }
}
