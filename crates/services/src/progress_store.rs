use std::collections::BTreeMap;
use std::sync::Arc;

use spark_core::model::{ModuleId, ProgressMap, ProgressRecord};
use storage::keys::PROGRESS_KEY;
use storage::records::{ProgressBlob, decode_progress_map};
use storage::KeyValueStore;

use crate::Clock;
use crate::error::ProgressStoreError;

/// Per-module learning progress, kept as one blob under a single key.
///
/// Every write reads the whole map, changes one entry and writes the whole
/// map back. Overlapping writes are last-write-wins; callers serialize saves.
///
/// Each operation comes in two forms. `try_*` methods return typed errors.
/// The plain methods never fail: they log and fall back to an empty value or
/// `false`.
#[derive(Clone)]
pub struct ProgressStore {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    key: String,
}

impl ProgressStore {
    #[must_use]
    pub fn new(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            clock,
            kv,
            key: PROGRESS_KEY.to_owned(),
        }
    }

    /// Use a different storage key (e.g. per profile).
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    //
    // ─── TYPED API ─────────────────────────────────────────────────────────────
    //

    /// Load the full progress map. A missing key is an empty map.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Storage` if the read fails or the blob is
    /// not a JSON object.
    pub async fn try_get_all(&self) -> Result<ProgressMap, ProgressStoreError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(ProgressMap::new());
        };
        let decoded = decode_progress_map(&raw)?;
        for rejected in &decoded.rejected {
            log::warn!(
                "dropping progress entry {:?}: {}",
                rejected.key,
                rejected.reason
            );
        }
        Ok(decoded.value)
    }

    /// Progress for one module, `None` if it was never saved.
    ///
    /// # Errors
    ///
    /// See [`ProgressStore::try_get_all`].
    pub async fn try_get_module_progress(
        &self,
        module_id: &ModuleId,
    ) -> Result<Option<ProgressRecord>, ProgressStoreError> {
        let map = self.try_get_all().await?;
        Ok(map.get(module_id).cloned())
    }

    /// Upsert a module's progress, stamping it with the current time.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Progress` for an invalid index/total pair
    /// (nothing is written) and `ProgressStoreError::Storage` if the read or
    /// write fails.
    pub async fn try_save_module_progress(
        &self,
        module_id: &ModuleId,
        current_card_index: u32,
        total_cards: u32,
        completed: bool,
    ) -> Result<ProgressRecord, ProgressStoreError> {
        let record =
            ProgressRecord::new(current_card_index, total_cards, completed, self.clock.now())?;

        let mut blob = self.load_for_write().await?;
        blob.upsert(module_id, &record)?;
        self.write(&blob).await?;

        log::debug!(
            "saved progress for {module_id}: {current_card_index}/{total_cards} ({}%)",
            record.progress_percentage()
        );
        Ok(record)
    }

    /// Mark a module finished: index and total both set to `total_cards`.
    ///
    /// # Errors
    ///
    /// See [`ProgressStore::try_save_module_progress`].
    pub async fn try_complete_module(
        &self,
        module_id: &ModuleId,
        total_cards: u32,
    ) -> Result<ProgressRecord, ProgressStoreError> {
        self.try_save_module_progress(module_id, total_cards, total_cards, true)
            .await
    }

    /// Drop one module's entry. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Storage` if the read or write fails.
    pub async fn try_reset_module_progress(
        &self,
        module_id: &ModuleId,
    ) -> Result<bool, ProgressStoreError> {
        let mut blob = self.load_for_write().await?;
        let existed = blob.remove(module_id);
        self.write(&blob).await?;
        Ok(existed)
    }

    /// Delete the whole progress blob.
    ///
    /// # Errors
    ///
    /// Returns `ProgressStoreError::Storage` if the delete fails.
    pub async fn try_clear_all_progress(&self) -> Result<(), ProgressStoreError> {
        self.kv.remove(&self.key).await?;
        log::debug!("cleared all progress");
        Ok(())
    }

    /// Modules started but not completed.
    ///
    /// # Errors
    ///
    /// See [`ProgressStore::try_get_all`].
    pub async fn try_get_in_progress_modules(&self) -> Result<Vec<ModuleId>, ProgressStoreError> {
        Ok(self.try_get_all().await?.in_progress_ids())
    }

    /// Modules marked completed.
    ///
    /// # Errors
    ///
    /// See [`ProgressStore::try_get_all`].
    pub async fn try_get_completed_modules(&self) -> Result<Vec<ModuleId>, ProgressStoreError> {
        Ok(self.try_get_all().await?.completed_ids())
    }

    //
    // ─── FAIL-SOFT API ─────────────────────────────────────────────────────────
    //

    /// Full progress map, empty on any failure.
    pub async fn get_all(&self) -> ProgressMap {
        soften("loading progress", self.try_get_all().await).unwrap_or_default()
    }

    pub async fn get_module_progress(&self, module_id: &ModuleId) -> Option<ProgressRecord> {
        soften(
            "loading module progress",
            self.try_get_module_progress(module_id).await,
        )
        .flatten()
    }

    /// Returns `false` if the progress could not be saved.
    pub async fn save_module_progress(
        &self,
        module_id: &ModuleId,
        current_card_index: u32,
        total_cards: u32,
        completed: bool,
    ) -> bool {
        soften(
            "saving progress",
            self.try_save_module_progress(module_id, current_card_index, total_cards, completed)
                .await,
        )
        .is_some()
    }

    pub async fn complete_module(&self, module_id: &ModuleId, total_cards: u32) -> bool {
        soften(
            "completing module",
            self.try_complete_module(module_id, total_cards).await,
        )
        .is_some()
    }

    pub async fn reset_module_progress(&self, module_id: &ModuleId) -> bool {
        soften(
            "resetting progress",
            self.try_reset_module_progress(module_id).await,
        )
        .is_some()
    }

    pub async fn clear_all_progress(&self) -> bool {
        soften("clearing progress", self.try_clear_all_progress().await).is_some()
    }

    pub async fn get_in_progress_modules(&self) -> Vec<ModuleId> {
        self.get_all().await.in_progress_ids()
    }

    pub async fn get_completed_modules(&self) -> Vec<ModuleId> {
        self.get_all().await.completed_ids()
    }

    /// Saved progress for the given modules, skipping ones without any.
    /// Reads the blob once.
    pub async fn progress_for_modules(
        &self,
        module_ids: &[ModuleId],
    ) -> BTreeMap<ModuleId, ProgressRecord> {
        let map = self.get_all().await;
        module_ids
            .iter()
            .filter_map(|id| map.get(id).map(|record| (id.clone(), record.clone())))
            .collect()
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    /// Stored blob for a read-modify-write. Entries that fail validation are
    /// kept as stored. An unparseable blob is replaced by an empty one; a
    /// failed read aborts the write.
    async fn load_for_write(&self) -> Result<ProgressBlob, ProgressStoreError> {
        let Some(raw) = self.kv.get(&self.key).await? else {
            return Ok(ProgressBlob::new());
        };
        match ProgressBlob::parse(&raw) {
            Ok(blob) => Ok(blob),
            Err(err) => {
                log::warn!("progress blob unreadable, starting from empty: {err}");
                Ok(ProgressBlob::new())
            }
        }
    }

    async fn write(&self, blob: &ProgressBlob) -> Result<(), ProgressStoreError> {
        let raw = blob.encode()?;
        self.kv.set(&self.key, &raw).await?;
        Ok(())
    }
}

fn soften<T>(action: &str, result: Result<T, ProgressStoreError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("error {action}: {err}");
            None
        }
    }
}
