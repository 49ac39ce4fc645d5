use jiff::Timestamp;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use snip_core::error::StorageError;
use snip_storage::KeyValueStore;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{warn, Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Key under which persisted log entries are stored.
pub const LOGS_KEY: &str = "appLogs";
/// Only the most recent entries are kept, both in memory and when persisted.
pub const MAX_ENTRIES: usize = 100;
pub const LOG_SOURCE: &str = "snip";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: Timestamp,
    /// Lowercase level name, e.g. "info".
    pub level: String,
    pub message: String,
    #[serde(default)]
    pub data: Map<String, Value>,
    pub source: String,
}

/// Bounded buffer of recent log entries shared between the tracing layer
/// and whoever persists them.
#[derive(Debug, Clone)]
pub struct LogJournal {
    buffer: Arc<Mutex<Buffer>>,
    capacity: usize,
}

#[derive(Debug)]
struct Buffer {
    entries: VecDeque<LogEntry>,
    /// Entries dropped from the front so far, either evicted or persisted.
    dropped: u64,
}

impl Default for LogJournal {
    fn default() -> Self {
        Self::with_capacity(MAX_ENTRIES)
    }
}

impl LogJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a journal holding at most `capacity` entries, and at least one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buffer: Arc::new(Mutex::new(Buffer {
                entries: VecDeque::with_capacity(capacity),
                dropped: 0,
            })),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, entry: LogEntry) {
        let mut buffer = self.buffer.lock();
        while buffer.entries.len() >= self.capacity {
            buffer.entries.pop_front();
            buffer.dropped += 1;
        }
        buffer.entries.push_back(entry);
    }

    /// Entries currently buffered, oldest first.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.buffer.lock().entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().entries.is_empty()
    }

    /// Appends the buffered entries to those already stored under
    /// [`LOGS_KEY`] and keeps the newest `capacity`. Returns the number of
    /// entries now stored.
    ///
    /// Entries leave the buffer only once the write succeeded; on error they
    /// stay buffered for the next attempt.
    pub async fn persist<K>(&self, kv: &K) -> Result<usize, StorageError>
    where
        K: KeyValueStore + ?Sized,
    {
        // loaded first so events logged while loading are part of this batch
        let mut stored = Self::load(kv).await?;

        let (pending, mark) = {
            let buffer = self.buffer.lock();
            let pending: Vec<LogEntry> = buffer.entries.iter().cloned().collect();
            (pending, buffer.dropped)
        };
        let persisted = pending.len() as u64;

        stored.extend(pending);
        if stored.len() > self.capacity {
            stored.drain(..stored.len() - self.capacity);
        }

        let blob = serde_json::to_string(&stored)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        kv.set(LOGS_KEY, blob).await?;

        let mut buffer = self.buffer.lock();
        let already_dropped = buffer.dropped - mark;
        let remove = persisted
            .saturating_sub(already_dropped)
            .min(buffer.entries.len() as u64);
        buffer.entries.drain(..remove as usize);
        buffer.dropped += remove;

        Ok(stored.len())
    }

    /// Reads persisted entries. A missing or unreadable value yields none.
    pub async fn load<K>(kv: &K) -> Result<Vec<LogEntry>, StorageError>
    where
        K: KeyValueStore + ?Sized,
    {
        let Some(blob) = kv.get(LOGS_KEY).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&blob) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(error = %e, "stored log entries are unreadable, treating as empty");
                Ok(Vec::new())
            }
        }
    }
}

/// Tracing layer that copies every event it sees into a [`LogJournal`].
pub struct JournalLayer {
    journal: LogJournal,
}

impl JournalLayer {
    pub fn new(journal: LogJournal) -> Self {
        Self { journal }
    }
}

impl<S: Subscriber> Layer<S> for JournalLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        self.journal.push(LogEntry {
            timestamp: Timestamp::now(),
            level: event.metadata().level().as_str().to_ascii_lowercase(),
            message: visitor.message.unwrap_or_default(),
            data: visitor.data,
            source: LOG_SOURCE.to_string(),
        });
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    data: Map<String, Value>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.data.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}
