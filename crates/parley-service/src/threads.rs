use std::sync::Arc;

use chrono::Utc;
use parley_persist::models::normalize_participants;
use parley_persist::{
    NewThread, Page, PageRequest, PersistError, PersistenceClient, Thread, ThreadId, UserId,
    MAX_PARTICIPANTS, MIN_PARTICIPANTS,
};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Number of ids a thread-creation request must carry
pub const REQUIRED_PARTICIPANTS: usize = 2;

/// Which existing thread, if any, a creation request resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupPolicy {
    /// Any thread sharing at least one participant
    #[default]
    Overlap,
    /// Only a thread with exactly the requested participant set
    ExactPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    FoundExisting,
}

#[derive(Clone)]
pub struct ThreadService {
    persist: Arc<dyn PersistenceClient>,
    dedup: DedupPolicy,
}

impl ThreadService {
    pub fn new(persist: Arc<dyn PersistenceClient>, dedup: DedupPolicy) -> Self {
        Self { persist, dedup }
    }

    /// Every thread, oldest first
    pub async fn list(&self, page: PageRequest) -> ServiceResult<Page<Thread>> {
        Ok(self.persist.list_threads(page).await?)
    }

    /// Threads the user participates in, oldest first
    pub async fn list_for_user(&self, user_id: UserId, page: PageRequest) -> ServiceResult<Page<Thread>> {
        self.require_user(user_id).await?;
        Ok(self.persist.list_threads_for_user(user_id, page).await?)
    }

    /// Create a thread between two users or return the one they already share.
    ///
    /// Which thread counts as "already shared" depends on the [`DedupPolicy`].
    pub async fn create(&self, participant_ids: &[UserId]) -> ServiceResult<(Thread, CreateOutcome)> {
        if participant_ids.len() != REQUIRED_PARTICIPANTS {
            return Err(ServiceError::InvalidInput(format!(
                "A thread must have exactly {} participants.",
                REQUIRED_PARTICIPANTS
            )));
        }
        for &user_id in participant_ids {
            self.require_user(user_id).await?;
        }

        if let Some(existing) = self.find_existing(participant_ids).await? {
            tracing::debug!(thread_id = existing.id, policy = ?self.dedup, "Returning existing thread");
            return Ok((existing, CreateOutcome::FoundExisting));
        }

        match self.persist.insert_thread(NewThread::new(participant_ids.iter().copied())).await {
            Ok(thread) => {
                tracing::info!(thread_id = thread.id, participants = ?thread.participants, "Thread created");
                Ok((thread, CreateOutcome::Created))
            }
            // A concurrent request inserted the same pair first
            Err(PersistError::Duplicate(_)) => {
                let winner = self
                    .persist
                    .find_thread_by_participants(participant_ids)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Internal(PersistError::Internal(
                            "duplicate thread reported but not found".to_string(),
                        ))
                    })?;
                Ok((winner, CreateOutcome::FoundExisting))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get(&self, thread_id: ThreadId) -> ServiceResult<Thread> {
        self.persist
            .get_thread(thread_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Thread {} not found.", thread_id)))
    }

    /// Replace the participant set of an existing thread
    pub async fn set_participants(&self, thread_id: ThreadId, participant_ids: &[UserId]) -> ServiceResult<Thread> {
        let participants = normalize_participants(participant_ids.iter().copied());
        if participants.len() < MIN_PARTICIPANTS {
            return Err(ServiceError::InvalidInput(
                "A thread must have at least 1 participant.".to_string(),
            ));
        }
        if participants.len() > MAX_PARTICIPANTS {
            return Err(ServiceError::Conflict(format!(
                "A thread cannot have more than {} participants.",
                MAX_PARTICIPANTS
            )));
        }
        self.get(thread_id).await?;
        for &user_id in &participants {
            self.require_user(user_id).await?;
        }

        let thread = self
            .persist
            .update_participants(thread_id, participants, Utc::now())
            .await?;
        tracing::info!(thread_id, participants = ?thread.participants, "Thread participants replaced");
        Ok(thread)
    }

    /// Delete a thread together with its messages
    pub async fn delete(&self, thread_id: ThreadId) -> ServiceResult<()> {
        self.persist.delete_thread(thread_id).await?;
        tracing::info!(thread_id, "Thread deleted");
        Ok(())
    }

    async fn find_existing(&self, participant_ids: &[UserId]) -> ServiceResult<Option<Thread>> {
        let found = match self.dedup {
            DedupPolicy::Overlap => self.persist.find_thread_overlapping(participant_ids).await?,
            DedupPolicy::ExactPair => self.persist.find_thread_by_participants(participant_ids).await?,
        };
        Ok(found)
    }

    /// `NotFound` unless the user exists
    pub async fn require_user(&self, user_id: UserId) -> ServiceResult<()> {
        match self.persist.get_user(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::NotFound(format!("User {} not found.", user_id))),
        }
    }
}
