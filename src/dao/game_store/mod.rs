#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::GameEntity;
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for game records.
///
/// Implementations translate each call into a single round-trip against the
/// backend and never interpret failures beyond tagging id conflicts.
pub trait GameStore: Send + Sync {
    /// Record with the numerically largest id, if any.
    fn find_max(&self) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Record stored under `id`. An id the backend cannot hold is simply absent.
    fn find_by_id(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>>;
    /// Insert a new record. Fails with [`StorageError::Conflict`] when the id is taken
    /// and [`StorageError::IdOutOfRange`] when the backend cannot key it.
    ///
    /// [`StorageError::Conflict`]: crate::dao::storage::StorageError::Conflict
    /// [`StorageError::IdOutOfRange`]: crate::dao::storage::StorageError::IdOutOfRange
    fn insert(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace the record matching `id`. Returns `false` when nothing matched.
    fn update(&self, id: u64, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove the record matching `id`. Returns `false` when nothing matched.
    fn delete(&self, id: u64) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap liveness probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Rebuild the backend connection in place.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
