mod message;
mod thread;
mod user;

pub use message::{check_text, Message, MessageId, NewMessage, MAX_MESSAGE_LENGTH};
pub use thread::{
    check_participants, normalize_participants, pair_key, NewThread, Thread, ThreadId,
    MAX_PARTICIPANTS, MIN_PARTICIPANTS,
};
pub use user::{User, UserId};
