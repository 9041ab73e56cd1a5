use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::error::{PersistError, Result};
use crate::models::{
    check_participants, check_text, normalize_participants, Message, MessageId, NewMessage,
    NewThread, Thread, ThreadId, User, UserId,
};
use crate::pagination::{Page, PageRequest};
use crate::trait_client::PersistenceClient;

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    threads: BTreeMap<ThreadId, Thread>,
    messages: BTreeMap<MessageId, Message>,
    last_user_id: UserId,
    last_thread_id: ThreadId,
    last_message_id: MessageId,
}

impl Tables {
    fn require_users(&self, ids: &[UserId]) -> Result<()> {
        match ids.iter().find(|id| !self.users.contains_key(id)) {
            Some(missing) => Err(PersistError::UserNotFound(*missing)),
            None => Ok(()),
        }
    }

    fn thread_with_participants(&self, participants: &[UserId]) -> Option<&Thread> {
        self.threads.values().find(|t| t.participants == participants)
    }

    fn remove_thread(&mut self, thread_id: ThreadId) -> Option<Thread> {
        let removed = self.threads.remove(&thread_id)?;
        self.messages.retain(|_, m| m.thread != thread_id);
        Some(removed)
    }

    /// Move every message of `from` into `into`, then drop `from`
    fn merge_thread(&mut self, from: ThreadId, into: ThreadId, now: DateTime<Utc>) {
        for message in self.messages.values_mut().filter(|m| m.thread == from) {
            message.thread = into;
        }
        self.threads.remove(&from);
        if let Some(survivor) = self.threads.get_mut(&into) {
            survivor.updated = now;
        }
    }
}

/// Process-local store. Each operation holds the lock for its whole
/// duration, so every call is atomic.
#[derive(Default)]
pub struct InMemoryPersistenceClient {
    tables: RwLock<Tables>,
}

impl InMemoryPersistenceClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PersistenceClient for InMemoryPersistenceClient {
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(PersistError::Duplicate(format!("username {}", username)));
        }
        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: username.to_string(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn delete_user(&self, user_id: UserId) -> Result<()> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&user_id).is_none() {
            return Err(PersistError::UserNotFound(user_id));
        }
        tables.messages.retain(|_, m| m.sender != user_id);

        let now = Utc::now();
        let affected: Vec<ThreadId> = tables
            .threads
            .values()
            .filter(|t| t.has_participant(user_id))
            .map(|t| t.id)
            .collect();
        for thread_id in affected {
            let Some(thread) = tables.threads.get(&thread_id) else {
                continue;
            };
            let remaining: Vec<UserId> = thread
                .participants
                .iter()
                .copied()
                .filter(|id| *id != user_id)
                .collect();
            if remaining.is_empty() {
                tables.remove_thread(thread_id);
                continue;
            }
            match tables.thread_with_participants(&remaining).map(|t| t.id) {
                Some(survivor) => tables.merge_thread(thread_id, survivor, now),
                None => {
                    if let Some(thread) = tables.threads.get_mut(&thread_id) {
                        thread.participants = remaining;
                        thread.updated = now;
                    }
                }
            }
        }
        Ok(())
    }

    async fn insert_thread(&self, thread: NewThread) -> Result<Thread> {
        let mut tables = self.tables.write().await;
        let thread = NewThread {
            participants: normalize_participants(thread.participants),
            ..thread
        };
        check_participants(&thread.participants)?;
        tables.require_users(&thread.participants)?;
        if let Some(existing) = tables.thread_with_participants(&thread.participants) {
            return Err(PersistError::Duplicate(format!(
                "thread {} already has participants {}",
                existing.id,
                existing.pair_key()
            )));
        }

        tables.last_thread_id += 1;
        let thread = thread.into_thread(tables.last_thread_id);
        tables.threads.insert(thread.id, thread.clone());
        Ok(thread)
    }

    async fn get_thread(&self, thread_id: ThreadId) -> Result<Option<Thread>> {
        Ok(self.tables.read().await.threads.get(&thread_id).cloned())
    }

    async fn find_thread_overlapping(&self, participants: &[UserId]) -> Result<Option<Thread>> {
        let tables = self.tables.read().await;
        Ok(tables
            .threads
            .values()
            .find(|t| participants.iter().any(|id| t.has_participant(*id)))
            .cloned())
    }

    async fn find_thread_by_participants(&self, participants: &[UserId]) -> Result<Option<Thread>> {
        let wanted = normalize_participants(participants.iter().copied());
        Ok(self.tables.read().await.thread_with_participants(&wanted).cloned())
    }

    async fn list_threads(&self, page: PageRequest) -> Result<Page<Thread>> {
        let tables = self.tables.read().await;
        Ok(page.apply(tables.threads.values().cloned()))
    }

    async fn list_threads_for_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<Thread>> {
        let tables = self.tables.read().await;
        Ok(page.apply(
            tables
                .threads
                .values()
                .filter(|t| t.has_participant(user_id))
                .cloned(),
        ))
    }

    async fn update_participants(
        &self,
        thread_id: ThreadId,
        participants: Vec<UserId>,
        updated: DateTime<Utc>,
    ) -> Result<Thread> {
        let mut tables = self.tables.write().await;
        let participants = normalize_participants(participants);
        check_participants(&participants)?;
        if !tables.threads.contains_key(&thread_id) {
            return Err(PersistError::ThreadNotFound(thread_id));
        }
        tables.require_users(&participants)?;
        if let Some(other) = tables.thread_with_participants(&participants) {
            if other.id != thread_id {
                return Err(PersistError::Duplicate(format!(
                    "thread {} already has participants {}",
                    other.id,
                    other.pair_key()
                )));
            }
        }

        let thread = tables
            .threads
            .get_mut(&thread_id)
            .ok_or(PersistError::ThreadNotFound(thread_id))?;
        thread.participants = participants;
        thread.updated = updated;
        Ok(thread.clone())
    }

    async fn delete_thread(&self, thread_id: ThreadId) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables
            .remove_thread(thread_id)
            .map(|_| ())
            .ok_or(PersistError::ThreadNotFound(thread_id))
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        let mut tables = self.tables.write().await;
        check_text(&message.text)?;
        if !tables.threads.contains_key(&message.thread) {
            return Err(PersistError::ThreadNotFound(message.thread));
        }
        tables.require_users(&[message.sender])?;

        tables.last_message_id += 1;
        let message = message.into_message(tables.last_message_id);
        tables.messages.insert(message.id, message.clone());
        Ok(message)
    }

    async fn get_message(&self, message_id: MessageId) -> Result<Option<Message>> {
        Ok(self.tables.read().await.messages.get(&message_id).cloned())
    }

    async fn list_messages(&self, page: PageRequest) -> Result<Page<Message>> {
        let tables = self.tables.read().await;
        Ok(page.apply(tables.messages.values().cloned()))
    }

    async fn list_messages_for_thread(&self, thread_id: ThreadId, page: PageRequest) -> Result<Page<Message>> {
        let tables = self.tables.read().await;
        Ok(page.apply(
            tables
                .messages
                .values()
                .filter(|m| m.thread == thread_id)
                .cloned(),
        ))
    }

    async fn count_unread_for_user(&self, user_id: UserId) -> Result<u64> {
        let tables = self.tables.read().await;
        let count = tables
            .messages
            .values()
            .filter(|m| !m.is_read)
            .filter(|m| {
                tables
                    .threads
                    .get(&m.thread)
                    .is_some_and(|t| t.has_participant(user_id))
            })
            .count();
        Ok(count as u64)
    }

    async fn mark_read(&self, message_id: MessageId) -> Result<Message> {
        let mut tables = self.tables.write().await;
        let message = tables
            .messages
            .get_mut(&message_id)
            .ok_or(PersistError::MessageNotFound(message_id))?;
        message.is_read = true;
        Ok(message.clone())
    }
}
