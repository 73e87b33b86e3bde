#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_store;
pub mod queue_store;
pub mod study_service;

pub use spark_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, ProgressStoreError, QueueAddError};
pub use progress_store::ProgressStore;
pub use queue_store::{AddToQueueResult, QueueStore};
pub use study_service::{StudyService, StudySession, StudyStep};
