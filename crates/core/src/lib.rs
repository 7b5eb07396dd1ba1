//! XM client core: credential storage and logging setup

pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod storage;
pub mod user;

pub use error::{StorageError, UserError};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use user::{StoredUser, USER_STORAGE_KEY};
