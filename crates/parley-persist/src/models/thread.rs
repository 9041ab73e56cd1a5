use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PersistError, Result};
use crate::models::UserId;

pub type ThreadId = i64;

pub const MIN_PARTICIPANTS: usize = 1;
pub const MAX_PARTICIPANTS: usize = 2;

/// Database-agnostic thread model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    pub id: ThreadId,
    /// Sorted ascending, no duplicates.
    pub participants: Vec<UserId>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Thread {
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.participants.binary_search(&user_id).is_ok()
    }

    pub fn pair_key(&self) -> String {
        pair_key(&self.participants)
    }
}

/// A thread that has not been assigned an id yet
#[derive(Debug, Clone)]
pub struct NewThread {
    pub participants: Vec<UserId>,
    pub created: DateTime<Utc>,
}

impl NewThread {
    pub fn new(participants: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            participants: normalize_participants(participants),
            created: Utc::now(),
        }
    }

    /// `updated` starts equal to `created`.
    pub fn into_thread(self, id: ThreadId) -> Thread {
        Thread {
            id,
            participants: self.participants,
            created: self.created,
            updated: self.created,
        }
    }
}

/// Sort and dedup a participant list.
pub fn normalize_participants(participants: impl IntoIterator<Item = UserId>) -> Vec<UserId> {
    let mut ids: Vec<UserId> = participants.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Key identifying a participant set regardless of input order, e.g. `"3:7"`.
pub fn pair_key(participants: &[UserId]) -> String {
    normalize_participants(participants.iter().copied())
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(":")
}

/// Write-time check of the participant-count invariant.
pub fn check_participants(participants: &[UserId]) -> Result<()> {
    let count = normalize_participants(participants.iter().copied()).len();
    if count < MIN_PARTICIPANTS {
        return Err(PersistError::Invariant(
            "A thread must have at least 1 participant".to_string(),
        ));
    }
    if count > MAX_PARTICIPANTS {
        return Err(PersistError::Invariant(format!(
            "A thread cannot have more than {} participants",
            MAX_PARTICIPANTS
        )));
    }
    Ok(())
}
