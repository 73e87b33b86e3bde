use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::ids::ModuleId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("total cards must be > 0")]
    ZeroTotal,

    #[error("card index {index} is beyond total cards {total}")]
    IndexOutOfRange { index: u32, total: u32 },
}

/// Rounded share of `index` over `total`, in whole percent.
///
/// Rounds half up, so 1 of 8 cards is 13%. Callers guarantee `total > 0`
/// and `index <= total`.
#[must_use]
pub fn progress_percentage(index: u32, total: u32) -> u8 {
    let index = u64::from(index);
    let total = u64::from(total.max(1));
    let pct = (200 * index + total) / (2 * total);
    u8::try_from(pct.min(100)).unwrap_or(100)
}

//
// ─── RECORD ────────────────────────────────────────────────────────────────────
//

/// How far a learner got through one module at the last save.
///
/// `progress_percentage` is derived from the index and total on every
/// construction and cannot be set independently. `completed` is taken as the
/// caller passed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    current_card_index: u32,
    total_cards: u32,
    completed: bool,
    last_accessed: DateTime<Utc>,
    progress_percentage: u8,
}

impl ProgressRecord {
    /// Builds a record for a save happening at `now`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::ZeroTotal` for an empty module and
    /// `ProgressError::IndexOutOfRange` when the index passes the total.
    pub fn new(
        current_card_index: u32,
        total_cards: u32,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        if total_cards == 0 {
            return Err(ProgressError::ZeroTotal);
        }
        if current_card_index > total_cards {
            return Err(ProgressError::IndexOutOfRange {
                index: current_card_index,
                total: total_cards,
            });
        }

        Ok(Self {
            current_card_index,
            total_cards,
            completed,
            last_accessed: now,
            progress_percentage: progress_percentage(current_card_index, total_cards),
        })
    }

    /// Rehydrate a record read back from storage.
    ///
    /// Applies the same validation as [`ProgressRecord::new`]; any stored
    /// percentage is discarded and recomputed.
    ///
    /// # Errors
    ///
    /// See [`ProgressRecord::new`].
    pub fn from_persisted(
        current_card_index: u32,
        total_cards: u32,
        completed: bool,
        last_accessed: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        Self::new(current_card_index, total_cards, completed, last_accessed)
    }

    #[must_use]
    pub fn current_card_index(&self) -> u32 {
        self.current_card_index
    }

    #[must_use]
    pub fn total_cards(&self) -> u32 {
        self.total_cards
    }

    #[must_use]
    pub fn completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn last_accessed(&self) -> DateTime<Utc> {
        self.last_accessed
    }

    #[must_use]
    pub fn progress_percentage(&self) -> u8 {
        self.progress_percentage
    }

    /// Started but not finished.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.progress_percentage > 0 && !self.completed
    }

    /// Card index a new viewing session should open at.
    ///
    /// Completed modules restart from the first card; otherwise the saved
    /// index is clamped to the last card of the current sequence.
    #[must_use]
    pub fn resume_index(&self, card_count: usize) -> usize {
        if self.completed || card_count == 0 {
            return 0;
        }
        let saved = usize::try_from(self.current_card_index).unwrap_or(usize::MAX);
        saved.min(card_count - 1)
    }
}

//
// ─── MAP ───────────────────────────────────────────────────────────────────────
//

/// All module progress, keyed by module id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressMap {
    entries: BTreeMap<ModuleId, ProgressRecord>,
}

impl ProgressMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, id: &ModuleId) -> Option<&ProgressRecord> {
        self.entries.get(id)
    }

    /// Inserts or replaces the entry for `id`.
    pub fn upsert(&mut self, id: ModuleId, record: ProgressRecord) {
        self.entries.insert(id, record);
    }

    /// Removes the entry for `id`, returning it if present.
    pub fn remove(&mut self, id: &ModuleId) -> Option<ProgressRecord> {
        self.entries.remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModuleId, &ProgressRecord)> {
        self.entries.iter()
    }

    /// Modules with some progress that are not completed.
    #[must_use]
    pub fn in_progress_ids(&self) -> Vec<ModuleId> {
        self.entries
            .iter()
            .filter(|(_, record)| record.is_in_progress())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Modules marked completed.
    #[must_use]
    pub fn completed_ids(&self) -> Vec<ModuleId> {
        self.entries
            .iter()
            .filter(|(_, record)| record.completed())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

impl FromIterator<(ModuleId, ProgressRecord)> for ProgressMap {
    fn from_iter<I: IntoIterator<Item = (ModuleId, ProgressRecord)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ProgressMap {
    type Item = (ModuleId, ProgressRecord);
    type IntoIter = std::collections::btree_map::IntoIter<ModuleId, ProgressRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
