use std::sync::Arc;

use parley_persist::{
    Message, MessageId, NewMessage, Page, PageRequest, PersistenceClient, ThreadId, UserId,
    MAX_MESSAGE_LENGTH,
};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Optional checks on message creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessagePolicy {
    /// Reject senders that are not participants of the target thread
    #[serde(default)]
    pub require_sender_participant: bool,
}

#[derive(Clone)]
pub struct MessageService {
    persist: Arc<dyn PersistenceClient>,
    policy: MessagePolicy,
}

impl MessageService {
    pub fn new(persist: Arc<dyn PersistenceClient>, policy: MessagePolicy) -> Self {
        Self { persist, policy }
    }

    /// Every message, oldest first
    pub async fn list(&self, page: PageRequest) -> ServiceResult<Page<Message>> {
        Ok(self.persist.list_messages(page).await?)
    }

    pub async fn list_for_thread(&self, thread_id: ThreadId, page: PageRequest) -> ServiceResult<Page<Message>> {
        if self.persist.get_thread(thread_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Thread {} not found.", thread_id)));
        }
        Ok(self.persist.list_messages_for_thread(thread_id, page).await?)
    }

    /// Unread messages in every thread the user participates in, including
    /// ones the user sent.
    pub async fn unread_count_for_user(&self, user_id: UserId) -> ServiceResult<u64> {
        if self.persist.get_user(user_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("User {} not found.", user_id)));
        }
        Ok(self.persist.count_unread_for_user(user_id).await?)
    }

    /// Idempotent: an already read message is returned unchanged.
    pub async fn mark_as_read(&self, message_id: MessageId) -> ServiceResult<Message> {
        let message = self.persist.mark_read(message_id).await?;
        tracing::debug!(message_id, "Message marked as read");
        Ok(message)
    }

    pub async fn get(&self, message_id: MessageId) -> ServiceResult<Message> {
        self.persist
            .get_message(message_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Message {} not found.", message_id)))
    }

    pub async fn create(&self, sender_id: UserId, thread_id: ThreadId, text: &str) -> ServiceResult<Message> {
        let text = validate_text(text)?;

        if self.persist.get_user(sender_id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("User {} not found.", sender_id)));
        }
        let thread = self
            .persist
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Thread {} not found.", thread_id)))?;
        if self.policy.require_sender_participant && !thread.has_participant(sender_id) {
            return Err(ServiceError::InvalidInput(format!(
                "User {} is not a participant of thread {}.",
                sender_id, thread_id
            )));
        }

        let message = self
            .persist
            .insert_message(NewMessage::new(sender_id, thread_id, text))
            .await?;
        tracing::info!(message_id = message.id, thread_id, sender_id, "Message created");
        Ok(message)
    }
}

/// Trim surrounding whitespace, then require non-blank text within the
/// length bound.
fn validate_text(text: &str) -> ServiceResult<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::InvalidInput("text may not be blank.".to_string()));
    }
    let length = text.chars().count();
    if length > MAX_MESSAGE_LENGTH {
        return Err(ServiceError::InvalidInput(format!(
            "Ensure text has no more than {} characters (it has {}).",
            MAX_MESSAGE_LENGTH, length
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_text_trims() {
        assert_eq!(validate_text("  hi \n").unwrap(), "hi");
    }

    #[test]
    fn test_validate_text_rejects_blank() {
        assert!(matches!(validate_text("   "), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_text_length_bound() {
        let exact = "a".repeat(MAX_MESSAGE_LENGTH);
        assert!(validate_text(&exact).is_ok());
        let over = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(matches!(validate_text(&over), Err(ServiceError::InvalidInput(_))));
    }
}
