use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::TopicId;

/// Hard cap on queued topics.
pub const MAX_QUEUE_SIZE: usize = 15;

/// Size at which the queue starts warning that it is filling up.
pub const NEAR_LIMIT_THRESHOLD: usize = 12;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Domain reasons a topic cannot be queued.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum QueueRejection {
    #[error("Already in queue")]
    AlreadyExists,

    #[error("Queue is full (max {MAX_QUEUE_SIZE} topics)")]
    Full,
}

impl QueueRejection {
    /// Machine-readable code for callers choosing their own messaging.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            QueueRejection::AlreadyExists => "ALREADY_EXISTS",
            QueueRejection::Full => "QUEUE_FULL",
        }
    }
}

//
// ─── TYPES ─────────────────────────────────────────────────────────────────────
//

/// Topic metadata offered for queueing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub id: TopicId,
    pub title: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub articles_count: u32,
}

/// A queued topic. Display metadata is captured at insertion and not refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueItem {
    pub topic_id: TopicId,
    pub title: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub articles_count: u32,
    pub added_at: DateTime<Utc>,
}

impl QueueItem {
    #[must_use]
    pub fn from_topic(topic: TopicSummary, added_at: DateTime<Utc>) -> Self {
        Self {
            topic_id: topic.id,
            title: topic.title,
            icon: topic.icon,
            color: topic.color,
            articles_count: topic.articles_count,
            added_at,
        }
    }
}

/// Snapshot of queue occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatus {
    pub size: usize,
    pub is_near_limit: bool,
    pub is_full: bool,
    pub remaining: usize,
}

impl QueueStatus {
    #[must_use]
    pub fn for_size(size: usize) -> Self {
        let is_full = size >= MAX_QUEUE_SIZE;
        Self {
            size,
            is_near_limit: size >= NEAR_LIMIT_THRESHOLD && !is_full,
            is_full,
            remaining: MAX_QUEUE_SIZE.saturating_sub(size),
        }
    }
}

/// Outcome of a successful insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueInsert {
    pub queue_size: usize,
    pub is_near_limit: bool,
}

//
// ─── QUEUE ─────────────────────────────────────────────────────────────────────
//

/// Insertion-ordered, bounded list of topics with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queue {
    items: Vec<QueueItem>,
}

impl Queue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a queue from persisted items, keeping the first occurrence of
    /// each topic id. Returns the queue and the ids that were dropped.
    #[must_use]
    pub fn from_persisted(items: Vec<QueueItem>) -> (Self, Vec<TopicId>) {
        let mut queue = Self::new();
        let mut dropped = Vec::new();
        for item in items {
            if queue.contains(&item.topic_id) {
                dropped.push(item.topic_id);
            } else {
                queue.items.push(item);
            }
        }
        (queue, dropped)
    }

    /// Appends a topic unless it is already queued or the queue is full.
    ///
    /// # Errors
    ///
    /// Returns `QueueRejection::AlreadyExists` for a duplicate topic id (checked
    /// first) and `QueueRejection::Full` once `MAX_QUEUE_SIZE` is reached.
    pub fn try_push(
        &mut self,
        topic: TopicSummary,
        now: DateTime<Utc>,
    ) -> Result<QueueInsert, QueueRejection> {
        if self.contains(&topic.id) {
            return Err(QueueRejection::AlreadyExists);
        }
        if self.items.len() >= MAX_QUEUE_SIZE {
            return Err(QueueRejection::Full);
        }

        self.items.push(QueueItem::from_topic(topic, now));
        let queue_size = self.items.len();
        Ok(QueueInsert {
            queue_size,
            is_near_limit: queue_size >= NEAR_LIMIT_THRESHOLD,
        })
    }

    /// Removes the topic if present. Returns whether anything was removed.
    pub fn remove(&mut self, topic_id: &TopicId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.topic_id != topic_id);
        self.items.len() != before
    }

    #[must_use]
    pub fn contains(&self, topic_id: &TopicId) -> bool {
        self.items.iter().any(|item| &item.topic_id == topic_id)
    }

    #[must_use]
    pub fn status(&self) -> QueueStatus {
        QueueStatus::for_size(self.items.len())
    }

    #[must_use]
    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    #[must_use]
    pub fn into_items(self) -> Vec<QueueItem> {
        self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
