use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Result alias for MongoDB game store calls.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures of the MongoDB game store, mapped onto `StorageError` by the parent module.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// `MONGO_URI` is not set.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// `MONGO_URI` could not be parsed.
    #[error("failed to parse MongoDB connection URI")]
    InvalidUri {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver rejected the client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered the startup ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A supervisor health ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The unique id index could not be created.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection name.
        collection: &'static str,
        /// Indexed field.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The id cannot be stored as int64.
    #[error("game id `{id}` does not fit in a BSON int64")]
    IdOutOfRange {
        /// Game id involved.
        id: u64,
    },
    /// A stored document carries an id no game could have been given.
    #[error("stored game id `{id}` is negative")]
    NegativeId {
        /// Game id involved.
        id: i64,
    },
    /// The unique index rejected an insert.
    #[error("game `{id}` already exists")]
    DuplicateId {
        /// Game id involved.
        id: u64,
    },
    /// Reading the highest id failed.
    #[error("failed to look up the highest game id")]
    FindMax {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Reading a game failed.
    #[error("failed to load game `{id}`")]
    LoadGame {
        /// Game id involved.
        id: u64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting a game failed for a reason other than a duplicate id.
    #[error("failed to insert game `{id}`")]
    InsertGame {
        /// Game id involved.
        id: u64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Replacing a game failed.
    #[error("failed to update game `{id}`")]
    UpdateGame {
        /// Game id involved.
        id: u64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Deleting a game failed.
    #[error("failed to delete game `{id}`")]
    DeleteGame {
        /// Game id involved.
        id: u64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

/// Whether the driver error is a unique index violation.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        _ => false,
    }
}
