//! # Parley
//!
//! Two-party direct messaging backend.
//!
//! Users talk in threads of at most two participants. Messages are posted into
//! threads and carry a read flag.
//!
//! ## Overview
//!
//! - **Persistence** ([`PersistenceClient`]): MongoDB or in-memory storage with
//!   limit/offset pagination
//! - **Threads** ([`ThreadService`]): creation with deduplication, participant
//!   limits, per-user listing
//! - **Messages** ([`MessageService`]): posting, per-thread listing, unread
//!   counts, mark-as-read
//!
//! ## Quick Start
//!
//! ```rust
//! use parley::prelude::*;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), ServiceError> {
//! let store = Arc::new(InMemoryPersistenceClient::new());
//! let alice = store.create_user("alice").await?;
//! let bob = store.create_user("bob").await?;
//!
//! let threads = ThreadService::new(store.clone(), DedupPolicy::default());
//! let messages = MessageService::new(store.clone(), MessagePolicy::default());
//!
//! let (thread, outcome) = threads.create(&[alice.id, bob.id]).await?;
//! assert_eq!(outcome, CreateOutcome::Created);
//!
//! messages.create(alice.id, thread.id, "hi").await?;
//! assert_eq!(messages.unread_count_for_user(bob.id).await?, 1);
//! # Ok(())
//! # }
//! ```

pub mod prelude;

pub use parley_persist::{
    InMemoryPersistenceClient, Message, NewMessage, NewThread, Page, PageRequest, PersistError,
    PersistenceClient, Thread, User, MessageId, ThreadId, UserId,
};
#[cfg(feature = "mongodb")]
pub use parley_persist::MongoPersistenceClient;
pub use parley_service::{
    CreateOutcome, DedupPolicy, MessagePolicy, MessageService, ServiceError, ServiceResult,
    ThreadService,
};

pub use parley_persist as persist;
pub use parley_service as service;
