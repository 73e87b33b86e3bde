//! Persisted shapes for the progress and queue blobs, and their JSON codecs.
//!
//! Records mirror the domain types so the stores can encode and decode
//! without the domain layer knowing about the blob layout. Decoding validates
//! each entry on its own: a malformed entry is dropped and reported, the rest
//! of the blob still loads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use spark_core::model::{
    ModuleId, ProgressMap, ProgressRecord, Queue, QueueItem, TopicId,
};
use spark_core::time::to_iso8601;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp {raw:?}: {e}"))
}

//
// ─── DECODE RESULT ─────────────────────────────────────────────────────────────
//

/// An entry that could not be rehydrated and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub key: String,
    pub reason: String,
}

/// A decoded blob plus whatever had to be dropped from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded<T> {
    pub value: T,
    pub rejected: Vec<RejectedEntry>,
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Persisted shape of one module's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEntryRecord {
    pub current_card_index: u32,
    pub total_cards: u32,
    #[serde(default)]
    pub completed: bool,
    pub last_accessed: String,
    #[serde(default)]
    pub progress_percentage: u8,
}

impl ProgressEntryRecord {
    #[must_use]
    pub fn from_progress(record: &ProgressRecord) -> Self {
        Self {
            current_card_index: record.current_card_index(),
            total_cards: record.total_cards(),
            completed: record.completed(),
            last_accessed: to_iso8601(record.last_accessed()),
            progress_percentage: record.progress_percentage(),
        }
    }

    /// Convert back into a domain record. The stored percentage is not trusted.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the timestamp does not parse or
    /// the index/total pair is invalid.
    pub fn into_progress(self) -> Result<ProgressRecord, String> {
        let last_accessed = parse_timestamp(&self.last_accessed)?;
        ProgressRecord::from_persisted(
            self.current_card_index,
            self.total_cards,
            self.completed,
            last_accessed,
        )
        .map_err(|e| e.to_string())
    }
}

/// Serialize the whole progress map.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_progress_map(map: &ProgressMap) -> Result<String, StorageError> {
    let entries: BTreeMap<&str, ProgressEntryRecord> = map
        .iter()
        .map(|(id, record)| (id.as_str(), ProgressEntryRecord::from_progress(record)))
        .collect();
    serde_json::to_string(&entries).map_err(ser)
}

/// Parse a progress blob.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the blob is not a JSON object.
/// Individual bad entries are reported in [`Decoded::rejected`] instead.
pub fn decode_progress_map(raw: &str) -> Result<Decoded<ProgressMap>, StorageError> {
    Ok(ProgressBlob::parse(raw)?.decode())
}

/// The progress blob as stored, edited one module at a time.
///
/// Entries that fail validation are carried through edits untouched, so a
/// save for one module never erases another module's entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressBlob {
    entries: Map<String, Value>,
}

impl ProgressBlob {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the blob is not a JSON object.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let entries: Map<String, Value> = serde_json::from_str(raw).map_err(ser)?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn decode(&self) -> Decoded<ProgressMap> {
        let mut map = ProgressMap::new();
        let mut rejected = Vec::new();
        for (key, value) in &self.entries {
            let decoded = ModuleId::try_new(key.clone())
                .map_err(|e| e.to_string())
                .and_then(|id| {
                    let record: ProgressEntryRecord =
                        serde_json::from_value(value.clone()).map_err(|e| e.to_string())?;
                    Ok((id, record.into_progress()?))
                });
            match decoded {
                Ok((id, record)) => map.upsert(id, record),
                Err(reason) => rejected.push(RejectedEntry {
                    key: key.clone(),
                    reason,
                }),
            }
        }

        Decoded {
            value: map,
            rejected,
        }
    }

    /// Replace the entry for `id`, leaving every other key as stored.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the record cannot be encoded.
    pub fn upsert(&mut self, id: &ModuleId, record: &ProgressRecord) -> Result<(), StorageError> {
        let value =
            serde_json::to_value(ProgressEntryRecord::from_progress(record)).map_err(ser)?;
        self.entries.insert(id.as_str().to_owned(), value);
        Ok(())
    }

    /// Drop the entry for `id`, valid or not. Returns whether it was present.
    pub fn remove(&mut self, id: &ModuleId) -> bool {
        self.entries.remove(id.as_str()).is_some()
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string(&self.entries).map_err(ser)
    }
}

//
// ─── QUEUE ─────────────────────────────────────────────────────────────────────
//

/// Persisted shape of one queued topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueItemRecord {
    pub topic_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub articles_count: u32,
    pub added_at: String,
}

impl QueueItemRecord {
    #[must_use]
    pub fn from_item(item: &QueueItem) -> Self {
        Self {
            topic_id: item.topic_id.as_str().to_owned(),
            title: item.title.clone(),
            icon: item.icon.clone(),
            color: item.color.clone(),
            articles_count: item.articles_count,
            added_at: to_iso8601(item.added_at),
        }
    }

    /// Convert back into a domain item.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem for blank ids or bad timestamps.
    pub fn into_item(self) -> Result<QueueItem, String> {
        let topic_id = TopicId::try_new(self.topic_id).map_err(|e| e.to_string())?;
        let added_at = parse_timestamp(&self.added_at)?;
        Ok(QueueItem {
            topic_id,
            title: self.title,
            icon: self.icon,
            color: self.color,
            articles_count: self.articles_count,
            added_at,
        })
    }
}

/// Serialize the queue in order.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if encoding fails.
pub fn encode_queue(queue: &Queue) -> Result<String, StorageError> {
    let items: Vec<QueueItemRecord> = queue.items().iter().map(QueueItemRecord::from_item).collect();
    serde_json::to_string(&items).map_err(ser)
}

/// Parse a queue blob, keeping the first entry for any repeated topic id.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the blob is not a JSON array.
pub fn decode_queue(raw: &str) -> Result<Decoded<Queue>, StorageError> {
    Ok(QueueBlob::parse(raw)?.decode())
}

/// The queue blob as stored, edited one topic at a time.
///
/// Items that fail validation keep their position across adds and removes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueBlob {
    entries: Vec<Value>,
}

impl QueueBlob {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the blob is not a JSON array.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let entries: Vec<Value> = serde_json::from_str(raw).map_err(ser)?;
        Ok(Self { entries })
    }

    #[must_use]
    pub fn decode(&self) -> Decoded<Queue> {
        let mut items = Vec::with_capacity(self.entries.len());
        let mut rejected = Vec::new();
        for (position, value) in self.entries.iter().enumerate() {
            let decoded = serde_json::from_value::<QueueItemRecord>(value.clone())
                .map_err(|e| e.to_string())
                .and_then(QueueItemRecord::into_item);
            match decoded {
                Ok(item) => items.push(item),
                Err(reason) => rejected.push(RejectedEntry {
                    key: format!("#{position}"),
                    reason,
                }),
            }
        }

        let (queue, duplicates) = Queue::from_persisted(items);
        rejected.extend(duplicates.into_iter().map(|id| RejectedEntry {
            key: id.to_string(),
            reason: "duplicate topic id".to_owned(),
        }));

        Decoded {
            value: queue,
            rejected,
        }
    }

    /// Append an item at the end.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the item cannot be encoded.
    pub fn push(&mut self, item: &QueueItem) -> Result<(), StorageError> {
        let value = serde_json::to_value(QueueItemRecord::from_item(item)).map_err(ser)?;
        self.entries.push(value);
        Ok(())
    }

    /// Drop every stored entry carrying `topic_id`, repeats included.
    /// Returns whether anything was removed.
    pub fn remove(&mut self, topic_id: &TopicId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|value| {
            value.get("topicId").and_then(Value::as_str) != Some(topic_id.as_str())
        });
        self.entries.len() != before
    }

    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if encoding fails.
    pub fn encode(&self) -> Result<String, StorageError> {
        serde_json::to_string(&self.entries).map_err(ser)
    }
}
