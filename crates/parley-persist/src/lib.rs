pub mod models;
pub mod pagination;
pub mod trait_client;
pub mod dbs;
pub mod error;

pub use models::{Message, NewMessage, NewThread, Thread, User, MessageId, ThreadId, UserId};
pub use models::{MAX_MESSAGE_LENGTH, MAX_PARTICIPANTS, MIN_PARTICIPANTS};
pub use pagination::{Page, PageRequest};
pub use trait_client::PersistenceClient;
pub use dbs::memory::InMemoryPersistenceClient;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoPersistenceClient;
pub use error::{PersistError, Result};
