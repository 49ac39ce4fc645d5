//! Storage backends for the Snip URL shortener.
//!
//! Everything is persisted through a small string key-value surface
//! ([`KeyValueStore`]). [`KvRecordStore`] layers the record set on top of it
//! as one JSON blob under a fixed key.

pub mod file;
pub mod kv;
pub mod memory;
pub mod record;

pub use file::FileStore;
pub use kv::KeyValueStore;
pub use memory::InMemoryStore;
pub use record::{KvRecordStore, RECORDS_KEY};
