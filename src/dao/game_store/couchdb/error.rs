//! Failures of the CouchDB game store, mapped onto `StorageError` by the parent module.

use reqwest::StatusCode;
use thiserror::Error;

/// Result alias for CouchDB game store calls.
pub type CouchResult<T> = Result<T, CouchDaoError>;

/// Everything that can go wrong while reading or writing game documents over HTTP.
#[derive(Debug, Error)]
pub enum CouchDaoError {
    /// `COUCH_BASE_URL` is not set.
    #[error("environment variable `{var}` is required for the couch backend")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// The pooled HTTP client could not be built.
    #[error("failed to build the CouchDB HTTP client")]
    ClientBuilder {
        /// Builder failure.
        #[source]
        source: reqwest::Error,
    },
    /// Checking whether the game database exists failed in transport.
    #[error("could not reach game database `{database}`")]
    DatabaseQuery {
        /// Database name.
        database: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// Creating the missing game database failed in transport.
    #[error("could not create game database `{database}`")]
    DatabaseCreate {
        /// Database name.
        database: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The server answered a database-level call with an unusable status.
    #[error("game database `{database}` answered {status}")]
    DatabaseStatus {
        /// Database name.
        database: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// A game document request never got an answer.
    #[error("request for `{path}` was not delivered")]
    RequestSend {
        /// Document path or endpoint.
        path: String,
        /// Transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// A game document request got a status the store does not handle.
    /// Also raised when a revision stays stale after every retry.
    #[error("`{path}` answered {status}")]
    RequestStatus {
        /// Document path or endpoint.
        path: String,
        /// Status returned by CouchDB.
        status: StatusCode,
    },
    /// A response body was not JSON.
    #[error("unreadable response body from `{path}`")]
    DecodeResponse {
        /// Document path or endpoint.
        path: String,
        /// Body decoding failure.
        #[source]
        source: reqwest::Error,
    },
    /// An `_all_docs` row did not hold a game document.
    #[error("`{path}` does not hold a game document")]
    DeserializeValue {
        /// Document id of the row.
        path: String,
        /// Shape mismatch.
        #[source]
        source: serde_json::Error,
    },
    /// A PUT without revision hit an existing document: the id is taken.
    #[error("game `{id}` already exists")]
    DuplicateId {
        /// Contested game id.
        id: u64,
    },
    /// A document id does not follow the `game::<20 digits>` layout.
    #[error("`{doc_id}` is not a game document id")]
    InvalidDocId {
        /// Offending document id.
        doc_id: String,
    },
}
