//! Umbrella error for the domain layer.

use thiserror::Error;

use crate::model::{IdError, ProgressError, QueueRejection};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Queue(#[from] QueueRejection),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModuleId;

    #[test]
    fn domain_errors_convert_with_their_messages() {
        let err: Error = ModuleId::try_new("  ").unwrap_err().into();
        assert!(matches!(err, Error::Id(_)));

        let err = Error::from(QueueRejection::Full);
        assert_eq!(err.to_string(), "Queue is full (max 15 topics)");
    }
}
