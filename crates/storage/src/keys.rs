//! Namespaced keys under which each store keeps its single blob.

pub const PROGRESS_KEY: &str = "@spark_learning_progress";
pub const QUEUE_KEY: &str = "@spark_learning_queue";
