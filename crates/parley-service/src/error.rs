use parley_persist::PersistError;
use thiserror::Error;

/// Error taxonomy surfaced to callers of the services
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed, missing or out-of-range input
    #[error("{0}")]
    InvalidInput(String),

    /// A referenced user, thread or message does not exist
    #[error("{0}")]
    NotFound(String),

    /// The write would break a data invariant
    #[error("{0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Internal(#[source] PersistError),
}

impl From<PersistError> for ServiceError {
    fn from(err: PersistError) -> Self {
        match err {
            PersistError::UserNotFound(id) => ServiceError::NotFound(format!("User {} not found.", id)),
            PersistError::ThreadNotFound(id) => ServiceError::NotFound(format!("Thread {} not found.", id)),
            PersistError::MessageNotFound(id) => ServiceError::NotFound(format!("Message {} not found.", id)),
            PersistError::Invariant(msg) | PersistError::Duplicate(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Internal(other),
        }
    }
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_mapping() {
        let err: ServiceError = PersistError::ThreadNotFound(7).into();
        assert!(matches!(err, ServiceError::NotFound(ref msg) if msg == "Thread 7 not found."));
    }

    #[test]
    fn test_invariant_maps_to_conflict() {
        let err: ServiceError = PersistError::Invariant("too many".to_string()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_unrecognized_is_internal() {
        let err: ServiceError = PersistError::Connection("refused".to_string()).into();
        assert!(matches!(err, ServiceError::Internal(_)));
    }
}
