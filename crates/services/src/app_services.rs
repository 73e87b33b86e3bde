use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::progress_store::ProgressStore;
use crate::queue_store::QueueStore;
use crate::study_service::StudyService;

/// Assembles app-facing services over one key-value backend.
#[derive(Clone)]
pub struct AppServices {
    progress: Arc<ProgressStore>,
    queue: Arc<QueueStore>,
    study: Arc<StudyService>,
}

impl AppServices {
    /// Build services over an already opened storage backend.
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let progress = Arc::new(ProgressStore::new(clock, Arc::clone(&storage.kv)));
        let queue = Arc::new(QueueStore::new(clock, Arc::clone(&storage.kv)));
        let study = Arc::new(StudyService::new(Arc::clone(&progress)));
        Self {
            progress,
            queue,
            study,
        }
    }

    /// Build services backed by process memory. Nothing survives a restart.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::from_storage(&Storage::in_memory(), clock)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn queue(&self) -> Arc<QueueStore> {
        Arc::clone(&self.queue)
    }

    #[must_use]
    pub fn study(&self) -> Arc<StudyService> {
        Arc::clone(&self.study)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_core::model::{ModuleId, TopicId, TopicSummary};
    use spark_core::time::fixed_clock;

    #[tokio::test]
    async fn stores_share_one_backend_without_collisions() {
        let services = AppServices::in_memory(fixed_clock());
        let id = ModuleId::try_new("m1").unwrap();
        assert!(services.progress().save_module_progress(&id, 1, 3, false).await);

        let added = services
            .queue()
            .add_to_queue(TopicSummary {
                id: TopicId::try_new("t1").unwrap(),
                title: "Topic".into(),
                icon: None,
                color: None,
                articles_count: 0,
            })
            .await;
        assert!(added.success);

        assert_eq!(services.progress().get_all().await.len(), 1);
        assert_eq!(services.queue().get_queue().await.len(), 1);
    }
}
