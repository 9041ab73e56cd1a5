use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};
use crate::models::{ThreadId, UserId};

pub type MessageId = i64;

/// Maximum message length, counted in characters.
pub const MAX_MESSAGE_LENGTH: usize = 1024;

/// Database-agnostic message model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub thread: ThreadId,
    pub text: String,
    pub created: DateTime<Utc>,
    pub is_read: bool,
}

/// A message that has not been assigned an id yet
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender: UserId,
    pub thread: ThreadId,
    pub text: String,
    pub created: DateTime<Utc>,
}

impl NewMessage {
    pub fn new(sender: UserId, thread: ThreadId, text: impl Into<String>) -> Self {
        Self {
            sender,
            thread,
            text: text.into(),
            created: Utc::now(),
        }
    }

    pub fn into_message(self, id: MessageId) -> Message {
        Message {
            id,
            sender: self.sender,
            thread: self.thread,
            text: self.text,
            created: self.created,
            is_read: false,
        }
    }
}

/// Write-time check of the text length bound.
pub fn check_text(text: &str) -> Result<()> {
    let length = text.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(PersistError::Invariant(format!(
            "Message text has {} characters, maximum is {}",
            length, MAX_MESSAGE_LENGTH
        )));
    }
    Ok(())
}
