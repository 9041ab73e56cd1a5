pub mod counter;
pub mod message;
pub mod thread;
pub mod user;

pub use counter::MongoCounterRepository;
pub use message::MongoMessageRepository;
pub use thread::MongoThreadRepository;
pub use user::MongoUserRepository;

/// Server error code for a unique index violation
const DUPLICATE_KEY: i32 = 11000;

/// Unique index violations surface as write errors from inserts and as
/// command errors from `find_one_and_update`.
pub(crate) fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};

    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;
    use mongodb::error::{CommandError, Error, ErrorKind};

    fn command_error(code: i32) -> Error {
        let command: CommandError = mongodb::bson::from_document(doc! {
            "code": code,
            "codeName": "DuplicateKey",
            "errmsg": "E11000 duplicate key error collection: parley.threads index: pair_key_1",
        })
        .unwrap();
        Error::from(ErrorKind::Command(command))
    }

    #[test]
    fn test_command_error_duplicate_key() {
        assert!(is_duplicate_key(&command_error(DUPLICATE_KEY)));
    }

    #[test]
    fn test_other_command_error_is_not_duplicate() {
        assert!(!is_duplicate_key(&command_error(2)));
    }
}
