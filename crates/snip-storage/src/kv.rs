use async_trait::async_trait;
use snip_core::repository::Result;
use std::sync::Arc;

/// A string key-value store, the persistence surface every Snip component
/// writes through.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Returns `true` if a value was present.
    async fn remove(&self, key: &str) -> Result<bool>;
}

#[async_trait]
impl<K: KeyValueStore + ?Sized> KeyValueStore for Arc<K> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        (**self).set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        (**self).remove(key).await
    }
}
