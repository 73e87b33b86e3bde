mod card;
mod ids;
mod module;
mod progress;
mod queue;

pub use ids::{IdError, ModuleId, TopicId};

pub use card::{
    CardKind, CardRenderer, ComparisonSide, LearningCard, QuizOutcome, Stat, TimelineEvent,
};
pub use module::LearningModule;
pub use progress::{ProgressError, ProgressMap, ProgressRecord, progress_percentage};
pub use queue::{
    MAX_QUEUE_SIZE, NEAR_LIMIT_THRESHOLD, Queue, QueueInsert, QueueItem, QueueRejection,
    QueueStatus, TopicSummary,
};
