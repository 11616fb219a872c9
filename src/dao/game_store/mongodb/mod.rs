mod config;
mod connection;
mod error;
mod models;
pub mod store;

pub use config::{MongoConfig, MongoPoolSettings};
pub use error::MongoDaoError;
pub use store::MongoGameStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateId { id } => StorageError::Conflict { id },
            MongoDaoError::IdOutOfRange { id } => StorageError::IdOutOfRange { id },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
