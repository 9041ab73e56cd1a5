use thiserror::Error;

use crate::models::{MessageId, ThreadId, UserId};

#[derive(Error, Debug)]
pub enum PersistError {
    #[cfg(feature = "mongodb")]
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[cfg(feature = "mongodb")]
    #[error("BSON serialization error: {0}")]
    BsonSerialization(#[from] bson::ser::Error),

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Thread not found: {0}")]
    ThreadNotFound(ThreadId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, PersistError>;
