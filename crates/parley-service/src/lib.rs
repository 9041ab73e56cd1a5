pub mod error;
pub mod messages;
pub mod threads;

pub use error::{ServiceError, ServiceResult};
pub use messages::{MessagePolicy, MessageService};
pub use threads::{CreateOutcome, DedupPolicy, ThreadService, REQUIRED_PARTICIPANTS};
