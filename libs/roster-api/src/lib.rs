pub mod error;
pub mod record;
pub mod store;

pub use error::{ErrorKind, PersistenceError, SaveError, ValidationError};
pub use record::{StudentPayload, StudentRecord};
pub use store::{StoreFuture, StudentStore};
