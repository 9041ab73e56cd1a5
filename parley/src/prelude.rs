//! Prelude module for convenient imports
//!
//! ```rust
//! use parley::prelude::*;
//! ```

pub use crate::{
    CreateOutcome, DedupPolicy, InMemoryPersistenceClient, Message, MessagePolicy,
    MessageService, Page, PageRequest, PersistenceClient, ServiceError, Thread, ThreadService,
    User,
};
#[cfg(feature = "mongodb")]
pub use crate::MongoPersistenceClient;
