use std::sync::Arc;

use serde::Serialize;
use spark_core::model::{Queue, QueueInsert, QueueItem, QueueStatus, TopicId, TopicSummary};
use storage::keys::QUEUE_KEY;
use storage::records::{QueueBlob, decode_queue};
use storage::{KeyValueStore, StorageError};

use crate::Clock;
use crate::error::QueueAddError;

/// Flat outcome of [`QueueStore::add_to_queue`], shaped for UI callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToQueueResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_near_limit: Option<bool>,
}

impl From<Result<QueueInsert, QueueAddError>> for AddToQueueResult {
    fn from(result: Result<QueueInsert, QueueAddError>) -> Self {
        match result {
            Ok(insert) => Self {
                success: true,
                message: "Added to queue".to_owned(),
                code: None,
                queue_size: Some(insert.queue_size),
                is_near_limit: Some(insert.is_near_limit),
            },
            Err(err) => Self {
                success: false,
                message: err.message(),
                code: Some(err.code()),
                queue_size: None,
                is_near_limit: None,
            },
        }
    }
}

/// Bounded list of topics saved for later, kept as one blob under a single key.
///
/// Same two-tier shape as `ProgressStore`: `try_*` methods return typed
/// errors, the plain methods log and fall back.
#[derive(Clone)]
pub struct QueueStore {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl QueueStore {
    #[must_use]
    pub fn new(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            kv,
            key: QUEUE_KEY.to_owned(),
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Load the queue. A missing key is an empty queue.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read fails or the blob is not a JSON array.
    pub async fn try_get_queue(&self) -> Result<Queue, StorageError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(Queue::new());
        };
        let decoded = decode_queue(&raw)?;
        for rejected in &decoded.rejected {
            log::warn!("dropping queue entry {}: {}", rejected.key, rejected.reason);
        }
        Ok(decoded.value)
    }

    /// Append a topic, rejecting duplicates and a full queue.
    ///
    /// # Errors
    ///
    /// Returns `QueueAddError::AlreadyExists` or `QueueAddError::Full` for
    /// domain conflicts (nothing is written) and `QueueAddError::Storage` for
    /// I/O failures.
    pub async fn try_add_to_queue(&self, topic: TopicSummary) -> Result<QueueInsert, QueueAddError> {
        let mut blob = self.load_for_write().await?;
        let mut queue = blob.decode().value;
        let topic_id = topic.id.clone();
        let insert = queue.try_push(topic, self.clock.now())?;
        if let Some(item) = queue.items().last() {
            blob.push(item)?;
        }
        self.write(&blob).await?;
        log::debug!("queued {topic_id} ({} in queue)", insert.queue_size);
        Ok(insert)
    }

    /// Remove a topic. Removing an absent topic still rewrites the queue.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the read or write fails.
    pub async fn try_remove_from_queue(&self, topic_id: &TopicId) -> Result<bool, StorageError> {
        let mut blob = self.load_for_write().await?;
        let removed = blob.remove(topic_id);
        self.write(&blob).await?;
        Ok(removed)
    }

    /// # Errors
    ///
    /// See [`QueueStore::try_get_queue`].
    pub async fn try_is_in_queue(&self, topic_id: &TopicId) -> Result<bool, StorageError> {
        Ok(self.try_get_queue().await?.contains(topic_id))
    }

    /// # Errors
    ///
    /// See [`QueueStore::try_get_queue`].
    pub async fn try_get_queue_status(&self) -> Result<QueueStatus, StorageError> {
        Ok(self.try_get_queue().await?.status())
    }

    /// Delete the whole queue blob.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    pub async fn try_clear_queue(&self) -> Result<(), StorageError> {
        self.kv.remove(&self.key).await?;
        log::debug!("cleared queue");
        Ok(())
    }

    //
    // ─── FAIL-SOFT API ─────────────────────────────────────────────────────────
    //

    /// Queued items in insertion order, empty on any failure.
    pub async fn get_queue(&self) -> Vec<QueueItem> {
        soften("getting queue", self.try_get_queue().await)
            .map(Queue::into_items)
            .unwrap_or_default()
    }

    pub async fn add_to_queue(&self, topic: TopicSummary) -> AddToQueueResult {
        let result = self.try_add_to_queue(topic).await;
        if let Err(QueueAddError::Storage(err)) = &result {
            log::warn!("error adding to queue: {err}");
        }
        AddToQueueResult::from(result)
    }

    pub async fn remove_from_queue(&self, topic_id: &TopicId) -> bool {
        soften(
            "removing from queue",
            self.try_remove_from_queue(topic_id).await,
        )
        .is_some()
    }

    pub async fn is_in_queue(&self, topic_id: &TopicId) -> bool {
        soften("checking queue", self.try_is_in_queue(topic_id).await).unwrap_or(false)
    }

    /// Occupancy; reports an empty queue on failure.
    pub async fn get_queue_status(&self) -> QueueStatus {
        soften("getting queue status", self.try_get_queue_status().await)
            .unwrap_or_else(|| QueueStatus::for_size(0))
    }

    pub async fn clear_queue(&self) -> bool {
        soften("clearing queue", self.try_clear_queue().await).is_some()
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    /// Stored blob for a read-modify-write. Items that fail validation keep
    /// their place. An unparseable blob is replaced by an empty one.
    async fn load_for_write(&self) -> Result<QueueBlob, StorageError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(QueueBlob::new());
        };
        match QueueBlob::parse(&raw) {
            Ok(blob) => Ok(blob),
            Err(err) => {
                log::warn!("queue blob unreadable, starting from empty: {err}");
                Ok(QueueBlob::new())
            }
        }
    }

    async fn write(&self, blob: &QueueBlob) -> Result<(), StorageError> {
        let raw = blob.encode()?;
        self.kv.set(&self.key, &raw).await
    }
}

fn soften<T>(action: &str, result: Result<T, StorageError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("error {action}: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_core::model::MAX_QUEUE_SIZE;
    use spark_core::time::{fixed_clock, fixed_now};
    use storage::InMemoryKeyValueStore;

    fn topic(id: &str) -> TopicSummary {
        TopicSummary {
            id: TopicId::try_new(id).unwrap(),
            title: format!("Topic {id}"),
            icon: Some("🧠".into()),
            color: Some("#7B61FF".into()),
            articles_count: 4,
        }
    }

    fn store() -> (QueueStore, InMemoryKeyValueStore) {
        let kv = InMemoryKeyValueStore::new();
        (QueueStore::new(fixed_clock(), Arc::new(kv.clone())), kv)
    }

    #[tokio::test]
    async fn first_add_reports_size_one() {
        let (store, _) = store();
        let result = store.add_to_queue(topic("topic-x")).await;
        assert_eq!(
            result,
            AddToQueueResult {
                success: true,
                message: "Added to queue".into(),
                code: None,
                queue_size: Some(1),
                is_near_limit: Some(false),
            }
        );

        let items = store.get_queue().await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Topic topic-x");
        assert_eq!(items[0].added_at, fixed_now());
    }

    #[tokio::test]
    async fn duplicate_add_leaves_queue_unchanged() {
        let (store, _) = store();
        store.add_to_queue(topic("a")).await;
        let result = store.add_to_queue(topic("a")).await;
        assert!(!result.success);
        assert_eq!(result.code, Some("ALREADY_EXISTS"));
        assert_eq!(store.get_queue_status().await.size, 1);
    }

    #[tokio::test]
    async fn sixteenth_topic_is_rejected() {
        let (store, _) = store();
        for i in 0..MAX_QUEUE_SIZE {
            let result = store.add_to_queue(topic(&format!("t{i}"))).await;
            assert!(result.success, "add {i} failed: {}", result.message);
            assert_eq!(result.is_near_limit, Some(i + 1 >= 12));
        }

        let result = store.add_to_queue(topic("overflow")).await;
        assert_eq!(result.code, Some("QUEUE_FULL"));
        assert_eq!(result.message, "Queue is full (max 15 topics)");

        let status = store.get_queue_status().await;
        assert_eq!(status.size, 15);
        assert!(status.is_full);
        assert!(!status.is_near_limit);
        assert_eq!(status.remaining, 0);
    }

    #[tokio::test]
    async fn remove_and_membership() {
        let (store, _) = store();
        store.add_to_queue(topic("a")).await;
        store.add_to_queue(topic("b")).await;

        let a = TopicId::try_new("a").unwrap();
        assert!(store.is_in_queue(&a).await);
        assert!(store.remove_from_queue(&a).await);
        assert!(!store.is_in_queue(&a).await);
        assert!(store.remove_from_queue(&a).await);
        assert!(!store.try_remove_from_queue(&a).await.unwrap());

        let ids: Vec<String> = store
            .get_queue()
            .await
            .into_iter()
            .map(|item| item.topic_id.to_string())
            .collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn clear_queue_deletes_key() {
        let (store, kv) = store();
        store.add_to_queue(topic("a")).await;
        assert!(store.clear_queue().await);
        assert_eq!(kv.get(QUEUE_KEY).await.unwrap(), None);
        assert!(store.get_queue().await.is_empty());
    }

    #[tokio::test]
    async fn corrupted_blob_reads_empty() {
        let (store, kv) = store();
        kv.set(QUEUE_KEY, "{\"not\":\"an array\"}").await.unwrap();
        assert!(store.get_queue().await.is_empty());
        assert_eq!(store.get_queue_status().await.size, 0);
        assert!(store.add_to_queue(topic("a")).await.success);
        assert_eq!(store.get_queue().await.len(), 1);
    }

    #[tokio::test]
    async fn unreadable_items_survive_add_and_remove() {
        let (store, kv) = store();
        kv.set(
            QUEUE_KEY,
            r#"[{"topicId":"a","title":"A","addedAt":"2024-01-01T00:00:00Z"},{"title":"legacy item"},{"topicId":"b","title":"B","addedAt":"2024-01-01T00:00:00Z"}]"#,
        )
        .await
        .unwrap();

        assert!(store.add_to_queue(topic("c")).await.success);
        assert!(store.remove_from_queue(&TopicId::try_new("a").unwrap()).await);

        let raw = kv.get(QUEUE_KEY).await.unwrap().unwrap();
        let stored: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.len(), 3);
        assert_eq!(stored[0]["title"], "legacy item");
        assert_eq!(stored[1]["topicId"], "b");
        assert_eq!(stored[2]["topicId"], "c");

        let ids: Vec<String> = store
            .get_queue()
            .await
            .into_iter()
            .map(|item| item.topic_id.to_string())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn result_serializes_like_the_ui_expects() {
        let ok = AddToQueueResult::from(Ok(QueueInsert {
            queue_size: 12,
            is_near_limit: true,
        }));
        assert_eq!(
            serde_json::to_string(&ok).unwrap(),
            r#"{"success":true,"message":"Added to queue","queueSize":12,"isNearLimit":true}"#
        );

        let full = AddToQueueResult::from(Err(QueueAddError::Full));
        assert_eq!(
            serde_json::to_string(&full).unwrap(),
            r#"{"success":false,"message":"Queue is full (max 15 topics)","code":"QUEUE_FULL"}"#
        );
    }
}
