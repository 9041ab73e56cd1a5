use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// Externally owned identity. Threads and messages reference it by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}
