use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{bson::doc, Client};

use crate::dbs::mongo::models::{MongoMessage, MongoThread, MongoUser};
use crate::dbs::mongo::repositories::{
    is_duplicate_key, MongoCounterRepository, MongoMessageRepository, MongoThreadRepository,
    MongoUserRepository,
};
use crate::error::{PersistError, Result};
use crate::models::{
    check_participants, check_text, normalize_participants, pair_key, Message, MessageId,
    NewMessage, NewThread, Thread, ThreadId, User, UserId,
};
use crate::pagination::{Page, PageRequest};
use crate::trait_client::PersistenceClient;

pub struct MongoPersistenceClient {
    client: Client,
    database: String,
    counter_repo: MongoCounterRepository,
    user_repo: MongoUserRepository,
    thread_repo: MongoThreadRepository,
    message_repo: MongoMessageRepository,
}

impl MongoPersistenceClient {
    /// Connect to MongoDB, create client and make sure indexes exist
    pub async fn connect(mongodb_uri: &str, database: &str) -> Result<Self> {
        let client = Client::with_uri_str(mongodb_uri)
            .await
            .map_err(|e| PersistError::Connection(e.to_string()))?;

        let persist = Self {
            counter_repo: MongoCounterRepository::new(&client, database),
            user_repo: MongoUserRepository::new(&client, database),
            thread_repo: MongoThreadRepository::new(&client, database),
            message_repo: MongoMessageRepository::new(&client, database),
            database: database.to_string(),
            client,
        };
        persist.ensure_indexes().await?;
        tracing::info!(database = %database, "MongoDB persistence ready");
        Ok(persist)
    }

    async fn ensure_indexes(&self) -> Result<()> {
        self.user_repo.ensure_indexes().await?;
        self.thread_repo.ensure_indexes().await?;
        self.message_repo.ensure_indexes().await?;
        Ok(())
    }

    async fn require_users(&self, user_ids: &[UserId]) -> Result<()> {
        let found = self.user_repo.count_existing(user_ids).await?;
        if found == user_ids.len() as u64 {
            return Ok(());
        }
        for &user_id in user_ids {
            if self.user_repo.get_user(user_id).await?.is_none() {
                return Err(PersistError::UserNotFound(user_id));
            }
        }
        Ok(())
    }

    async fn remove_thread(&self, thread_id: ThreadId) -> Result<bool> {
        if !self.thread_repo.delete_thread(thread_id).await? {
            return Ok(false);
        }
        let removed = self.message_repo.delete_for_thread(thread_id).await?;
        tracing::debug!(thread_id, removed_messages = removed, "Thread deleted");
        Ok(true)
    }

    async fn merge_thread(&self, from: ThreadId, into: ThreadId, now: DateTime<Utc>) -> Result<()> {
        let moved = self.message_repo.move_to_thread(from, into).await?;
        self.thread_repo.delete_thread(from).await?;
        self.thread_repo.touch(into, now).await?;
        tracing::debug!(from, into, moved_messages = moved, "Thread merged");
        Ok(())
    }
}

fn duplicate_thread(err: mongodb::error::Error, participants: &[UserId]) -> PersistError {
    if is_duplicate_key(&err) {
        PersistError::Duplicate(format!("thread with participants {}", pair_key(participants)))
    } else {
        PersistError::Database(err)
    }
}

#[async_trait]
impl PersistenceClient for MongoPersistenceClient {
    async fn ping(&self) -> Result<()> {
        self.client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn create_user(&self, username: &str) -> Result<User> {
        let user = MongoUser {
            id: self.counter_repo.next_id("users").await?,
            username: username.to_string(),
        };
        match self.user_repo.insert_user(&user).await {
            Err(PersistError::Database(e)) if is_duplicate_key(&e) => {
                Err(PersistError::Duplicate(format!("username {}", username)))
            }
            Err(e) => Err(e),
            Ok(()) => Ok(user.into()),
        }
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.user_repo.get_user(user_id).await?.map(Into::into))
    }

    async fn delete_user(&self, user_id: UserId) -> Result<()> {
        if !self.user_repo.delete_user(user_id).await? {
            return Err(PersistError::UserNotFound(user_id));
        }
        self.message_repo.delete_for_sender(user_id).await?;

        let now = Utc::now();
        for thread in self.thread_repo.find_for_user(user_id).await? {
            let remaining: Vec<UserId> = thread
                .participants
                .iter()
                .copied()
                .filter(|id| *id != user_id)
                .collect();
            if remaining.is_empty() {
                self.remove_thread(thread.id).await?;
                continue;
            }
            match self.thread_repo.find_by_pair_key(&pair_key(&remaining)).await? {
                Some(survivor) => self.merge_thread(thread.id, survivor.id, now).await?,
                None => {
                    self.thread_repo
                        .set_participants(thread.id, &remaining, now)
                        .await
                        .map_err(|e| match e {
                            PersistError::Database(e) => duplicate_thread(e, &remaining),
                            other => other,
                        })?;
                }
            }
        }
        Ok(())
    }

    async fn insert_thread(&self, thread: NewThread) -> Result<Thread> {
        let participants = normalize_participants(thread.participants);
        check_participants(&participants)?;
        self.require_users(&participants).await?;

        let thread = NewThread {
            participants,
            created: thread.created,
        }
        .into_thread(self.counter_repo.next_id("threads").await?);
        let document = MongoThread::from(thread.clone());
        match self.thread_repo.insert_thread(&document).await {
            Err(PersistError::Database(e)) => Err(duplicate_thread(e, &thread.participants)),
            Err(e) => Err(e),
            Ok(()) => Ok(thread),
        }
    }

    async fn get_thread(&self, thread_id: ThreadId) -> Result<Option<Thread>> {
        Ok(self.thread_repo.get_thread(thread_id).await?.map(Into::into))
    }

    async fn find_thread_overlapping(&self, participants: &[UserId]) -> Result<Option<Thread>> {
        Ok(self.thread_repo.find_overlapping(participants).await?.map(Into::into))
    }

    async fn find_thread_by_participants(&self, participants: &[UserId]) -> Result<Option<Thread>> {
        let key = pair_key(participants);
        Ok(self.thread_repo.find_by_pair_key(&key).await?.map(Into::into))
    }

    async fn list_threads(&self, page: PageRequest) -> Result<Page<Thread>> {
        Ok(self.thread_repo.list_all(page).await?.map(Into::into))
    }

    async fn list_threads_for_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<Thread>> {
        Ok(self.thread_repo.list_for_user(user_id, page).await?.map(Into::into))
    }

    async fn update_participants(
        &self,
        thread_id: ThreadId,
        participants: Vec<UserId>,
        updated: DateTime<Utc>,
    ) -> Result<Thread> {
        let participants = normalize_participants(participants);
        check_participants(&participants)?;
        if self.thread_repo.get_thread(thread_id).await?.is_none() {
            return Err(PersistError::ThreadNotFound(thread_id));
        }
        self.require_users(&participants).await?;

        match self.thread_repo.set_participants(thread_id, &participants, updated).await {
            Err(PersistError::Database(e)) => Err(duplicate_thread(e, &participants)),
            Err(e) => Err(e),
            Ok(None) => Err(PersistError::ThreadNotFound(thread_id)),
            Ok(Some(thread)) => Ok(thread.into()),
        }
    }

    async fn delete_thread(&self, thread_id: ThreadId) -> Result<()> {
        if self.remove_thread(thread_id).await? {
            Ok(())
        } else {
            Err(PersistError::ThreadNotFound(thread_id))
        }
    }

    async fn insert_message(&self, message: NewMessage) -> Result<Message> {
        check_text(&message.text)?;
        if self.thread_repo.get_thread(message.thread).await?.is_none() {
            return Err(PersistError::ThreadNotFound(message.thread));
        }
        self.require_users(&[message.sender]).await?;

        let message = message.into_message(self.counter_repo.next_id("messages").await?);
        self.message_repo
            .save_message(&MongoMessage::from(message.clone()))
            .await?;
        Ok(message)
    }

    async fn get_message(&self, message_id: MessageId) -> Result<Option<Message>> {
        Ok(self.message_repo.get_message(message_id).await?.map(Into::into))
    }

    async fn list_messages(&self, page: PageRequest) -> Result<Page<Message>> {
        Ok(self.message_repo.list_all(page).await?.map(Into::into))
    }

    async fn list_messages_for_thread(&self, thread_id: ThreadId, page: PageRequest) -> Result<Page<Message>> {
        Ok(self
            .message_repo
            .get_messages_paginated(thread_id, page)
            .await?
            .map(Into::into))
    }

    async fn count_unread_for_user(&self, user_id: UserId) -> Result<u64> {
        let thread_ids: Vec<ThreadId> = self
            .thread_repo
            .find_for_user(user_id)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        self.message_repo.count_unread(&thread_ids).await
    }

    async fn mark_read(&self, message_id: MessageId) -> Result<Message> {
        self.message_repo
            .mark_read(message_id)
            .await?
            .map(Into::into)
            .ok_or(PersistError::MessageNotFound(message_id))
    }
}
