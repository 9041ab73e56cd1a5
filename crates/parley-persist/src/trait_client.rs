use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{Message, MessageId, NewMessage, NewThread, Thread, ThreadId, User, UserId};
use crate::pagination::{Page, PageRequest};

/// Trait for database persistence operations
///
/// Every method is one atomic logical operation. Implementations re-check the
/// participant-count and text-length invariants on write and keep references
/// between users, threads and messages intact.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    /// Cheap round trip used by health checks
    async fn ping(&self) -> Result<()>;

    async fn create_user(&self, username: &str) -> Result<User>;

    async fn get_user(&self, user_id: UserId) -> Result<Option<User>>;

    /// Delete a user, the messages they sent and their thread memberships.
    /// Threads left without participants are deleted with their messages. A
    /// thread whose remaining participant set already belongs to another
    /// thread is merged into that thread: its messages move over and it is
    /// deleted.
    async fn delete_user(&self, user_id: UserId) -> Result<()>;

    /// Insert a thread. Fails with `Duplicate` if a thread with the same
    /// participant set already exists.
    async fn insert_thread(&self, thread: NewThread) -> Result<Thread>;

    async fn get_thread(&self, thread_id: ThreadId) -> Result<Option<Thread>>;

    /// Lowest-id thread containing at least one of `participants`
    async fn find_thread_overlapping(&self, participants: &[UserId]) -> Result<Option<Thread>>;

    /// Thread whose participant set equals `participants` (order-insensitive)
    async fn find_thread_by_participants(&self, participants: &[UserId]) -> Result<Option<Thread>>;

    /// Every thread, id ascending
    async fn list_threads(&self, page: PageRequest) -> Result<Page<Thread>>;

    /// Threads containing `user_id`, id ascending
    async fn list_threads_for_user(&self, user_id: UserId, page: PageRequest) -> Result<Page<Thread>>;

    /// Replace the participant set and stamp `updated`
    async fn update_participants(
        &self,
        thread_id: ThreadId,
        participants: Vec<UserId>,
        updated: DateTime<Utc>,
    ) -> Result<Thread>;

    /// Delete a thread and its messages
    async fn delete_thread(&self, thread_id: ThreadId) -> Result<()>;

    async fn insert_message(&self, message: NewMessage) -> Result<Message>;

    async fn get_message(&self, message_id: MessageId) -> Result<Option<Message>>;

    /// Every message, id ascending
    async fn list_messages(&self, page: PageRequest) -> Result<Page<Message>>;

    /// Messages in a thread, id ascending
    async fn list_messages_for_thread(&self, thread_id: ThreadId, page: PageRequest) -> Result<Page<Message>>;

    /// Unread messages across every thread `user_id` participates in
    async fn count_unread_for_user(&self, user_id: UserId) -> Result<u64>;

    /// Set `is_read` and return the stored record
    async fn mark_read(&self, message_id: MessageId) -> Result<Message>;
}
