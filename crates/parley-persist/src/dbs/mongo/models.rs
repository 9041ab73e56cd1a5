use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{pair_key, Message, MessageId, Thread, ThreadId, User, UserId};

/// MongoDB-specific User model (integer `_id`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoUser {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
}

/// MongoDB-specific Thread model
///
/// `pair_key` carries a unique index so two threads can never share a
/// participant set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub id: ThreadId,
    pub participants: Vec<UserId>,
    pub pair_key: String,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// MongoDB-specific Message model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMessage {
    #[serde(rename = "_id")]
    pub id: MessageId,
    pub sender: UserId,
    pub thread_id: ThreadId,
    pub text: String,
    pub created: DateTime<Utc>,
    pub is_read: bool,
}

/// Per-collection id sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCounter {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<MongoUser> for User {
    fn from(user: MongoUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

impl From<Thread> for MongoThread {
    fn from(thread: Thread) -> Self {
        Self {
            pair_key: pair_key(&thread.participants),
            id: thread.id,
            participants: thread.participants,
            created: thread.created,
            updated: thread.updated,
        }
    }
}

impl From<MongoThread> for Thread {
    fn from(thread: MongoThread) -> Self {
        Self {
            id: thread.id,
            participants: thread.participants,
            created: thread.created,
            updated: thread.updated,
        }
    }
}

impl From<Message> for MongoMessage {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id,
            sender: msg.sender,
            thread_id: msg.thread,
            text: msg.text,
            created: msg.created,
            is_read: msg.is_read,
        }
    }
}

impl From<MongoMessage> for Message {
    fn from(msg: MongoMessage) -> Self {
        Self {
            id: msg.id,
            sender: msg.sender,
            thread: msg.thread_id,
            text: msg.text,
            created: msg.created,
            is_read: msg.is_read,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_conversion_derives_pair_key() {
        let thread = Thread {
            id: 4,
            participants: vec![2, 11],
            created: Utc::now(),
            updated: Utc::now(),
        };
        let mongo: MongoThread = thread.clone().into();
        assert_eq!(mongo.pair_key, "2:11");
        assert_eq!(Thread::from(mongo), thread);
    }

    #[test]
    fn test_message_thread_field_renamed() {
        let message = Message {
            id: 1,
            sender: 2,
            thread: 3,
            text: "hi".to_string(),
            created: Utc::now(),
            is_read: false,
        };
        let doc = bson::to_document(&MongoMessage::from(message)).unwrap();
        assert_eq!(doc.get_i64("thread_id").unwrap(), 3);
        assert_eq!(doc.get_i64("_id").unwrap(), 1);
    }
}
