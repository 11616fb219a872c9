use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        game_store::GameStore,
        models::GameEntity,
        storage::{StorageError, StorageResult},
    },
    dto::game::EndGameResult,
    error::ServiceError,
};

/// Store deadline used when the configuration does not set one.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);
/// Insert attempts used when the configuration does not set them.
pub const DEFAULT_ALLOCATION_ATTEMPTS: u32 = 16;

/// Tunables for [`GameLifecycle`].
#[derive(Debug, Clone, Copy)]
pub struct LifecycleSettings {
    /// Deadline applied to every store round-trip.
    pub store_timeout: Duration,
    /// Inserts attempted before id allocation gives up.
    pub allocation_attempts: u32,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            store_timeout: DEFAULT_STORE_TIMEOUT,
            allocation_attempts: DEFAULT_ALLOCATION_ATTEMPTS,
        }
    }
}

/// Owns id allocation and the live -> terminated transitions of game records.
///
/// Holds no mutable state of its own; uniqueness of ids under concurrent
/// creation rests on the store rejecting duplicate inserts with
/// [`StorageError::Conflict`], after which the next candidate id is tried.
#[derive(Clone)]
pub struct GameLifecycle {
    store: Arc<dyn GameStore>,
    settings: LifecycleSettings,
}

impl GameLifecycle {
    /// Lifecycle bound to `store`.
    pub fn new(store: Arc<dyn GameStore>, settings: LifecycleSettings) -> Self {
        Self { store, settings }
    }

    /// Allocate the next id and persist an empty live game under it.
    pub async fn create_game(&self) -> Result<GameEntity, ServiceError> {
        let attempts = self.settings.allocation_attempts.max(1);
        let mut candidate = self.next_candidate(None).await?;

        for attempt in 1..=attempts {
            let game = GameEntity::new_live(candidate);
            match self.bounded(self.store.insert(game.clone())).await? {
                Ok(()) => {
                    info!(id = candidate, attempt, "game created");
                    return Ok(game);
                }
                Err(StorageError::Conflict { id }) => {
                    debug!(id, attempt, "game id already taken; trying next candidate");
                    candidate = self.next_candidate(Some(candidate)).await?;
                }
                Err(err @ StorageError::IdOutOfRange { .. }) => {
                    warn!(id = candidate, "store cannot hold the next game id");
                    return Err(ServiceError::allocation("game id space exhausted", Some(err)));
                }
                Err(err) => {
                    warn!(id = candidate, error = %err, "failed to insert new game");
                    return Err(ServiceError::StoreWrite(err));
                }
            }
        }

        warn!(attempts, "game id allocation exhausted its attempts");
        Err(ServiceError::allocation(
            format!("id still contested after {attempts} attempts"),
            None,
        ))
    }

    /// Replace the stored record for `record.id` with the submitted move list and turn.
    pub async fn record_turn(&self, record: GameEntity) -> Result<GameEntity, ServiceError> {
        let id = record.id;
        let record = GameEntity {
            is_game_live: true,
            ..record
        };

        match self.bounded(self.store.update(id, record.clone())).await? {
            Ok(true) => {
                info!(id, current_turn = %record.current_turn, "turn recorded");
                Ok(record)
            }
            Ok(false) => {
                warn!(id, "turn submitted for unknown game");
                Err(ServiceError::NotFound(id))
            }
            Err(err) => {
                warn!(id, error = %err, "failed to record turn");
                Err(ServiceError::StoreWrite(err))
            }
        }
    }

    /// Current record of a live game.
    pub async fn get_game(&self, id: u64) -> Result<GameEntity, ServiceError> {
        match self.bounded(self.store.find_by_id(id)).await? {
            Ok(Some(game)) => Ok(game),
            Ok(None) => Err(ServiceError::NotFound(id)),
            Err(err) => Err(ServiceError::Unavailable(err)),
        }
    }

    /// Terminate a game by removing its record. A second call reports `NotFound`.
    pub async fn end_game(
        &self,
        id: u64,
        ending_player: String,
        is_quit: bool,
    ) -> Result<EndGameResult, ServiceError> {
        if ending_player.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "ending player must not be empty".into(),
            ));
        }

        match self.bounded(self.store.delete(id)).await? {
            Ok(true) => {
                info!(id, ending_player = %ending_player, is_quit, "game terminated");
                Ok(EndGameResult::ended(ending_player, is_quit))
            }
            Ok(false) => {
                warn!(id, is_quit, "termination requested for unknown game");
                Err(ServiceError::NotFound(id))
            }
            Err(err) => {
                warn!(id, error = %err, "failed to terminate game");
                Err(ServiceError::StoreWrite(err))
            }
        }
    }

    /// Derive the next id from the stored maximum, never going back below `after + 1`.
    async fn next_candidate(&self, after: Option<u64>) -> Result<u64, ServiceError> {
        let max = match self.bounded(self.store.find_max()).await? {
            Ok(max) => max.map(|game| game.id),
            Err(err) => {
                warn!(error = %err, "failed to read highest game id");
                return Err(ServiceError::allocation(
                    "highest game id lookup failed",
                    Some(err),
                ));
            }
        };

        let floor = max.max(after).unwrap_or(0);
        floor
            .checked_add(1)
            .ok_or_else(|| ServiceError::allocation("game id space exhausted", None))
    }

    /// Run a store call under the configured deadline.
    async fn bounded<T>(
        &self,
        call: BoxFuture<'static, StorageResult<T>>,
    ) -> Result<StorageResult<T>, ServiceError> {
        timeout(self.settings.store_timeout, call).await.map_err(|_| {
            warn!(
                timeout_ms = self.settings.store_timeout.as_millis() as u64,
                "storage call timed out"
            );
            ServiceError::Timeout
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashSet,
        sync::atomic::{AtomicU32, Ordering},
    };

    use super::*;
    use crate::dao::game_store::memory::InMemoryGameStore;

    fn lifecycle(store: InMemoryGameStore) -> GameLifecycle {
        GameLifecycle::new(Arc::new(store), LifecycleSettings::default())
    }

    fn seeded(ids: impl IntoIterator<Item = u64>) -> InMemoryGameStore {
        InMemoryGameStore::with_games(ids.into_iter().map(GameEntity::new_live))
    }

    fn io_error() -> StorageError {
        StorageError::unavailable("boom".into(), std::io::Error::other("boom"))
    }

    /// Wraps a store and injects faults into selected calls.
    struct FaultyStore {
        inner: InMemoryGameStore,
        conflicts_left: AtomicU32,
        fail_find_max: bool,
        fail_reads: bool,
        fail_writes: bool,
        max_storable_id: Option<u64>,
        delay: Option<Duration>,
    }

    impl FaultyStore {
        fn new(inner: InMemoryGameStore) -> Self {
            Self {
                inner,
                conflicts_left: AtomicU32::new(0),
                fail_find_max: false,
                fail_reads: false,
                fail_writes: false,
                max_storable_id: None,
                delay: None,
            }
        }
    }

    impl GameStore for FaultyStore {
        fn find_max(&self) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            if self.fail_find_max {
                return Box::pin(async { Err(io_error()) });
            }
            let call = self.inner.find_max();
            let delay = self.delay;
            Box::pin(async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                call.await
            })
        }

        fn find_by_id(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
            if self.fail_reads {
                return Box::pin(async { Err(io_error()) });
            }
            self.inner.find_by_id(id)
        }

        fn insert(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
            if self.fail_writes {
                return Box::pin(async { Err(io_error()) });
            }
            if self.max_storable_id.is_some_and(|max| game.id > max) {
                let id = game.id;
                return Box::pin(async move { Err(StorageError::IdOutOfRange { id }) });
            }
            let conflicted = self
                .conflicts_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok();
            if conflicted {
                let id = game.id;
                return Box::pin(async move { Err(StorageError::Conflict { id }) });
            }
            self.inner.insert(game)
        }

        fn update(&self, id: u64, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
            if self.fail_writes {
                return Box::pin(async { Err(io_error()) });
            }
            self.inner.update(id, game)
        }

        fn delete(&self, id: u64) -> BoxFuture<'static, StorageResult<bool>> {
            if self.fail_writes {
                return Box::pin(async { Err(io_error()) });
            }
            self.inner.delete(id)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }

        fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.try_reconnect()
        }
    }

    #[tokio::test]
    async fn create_on_empty_store_starts_at_one() {
        let games = lifecycle(InMemoryGameStore::new());
        let game = games.create_game().await.unwrap();
        assert_eq!(game, GameEntity::new_live(1));
        assert!(game.pgn.is_empty());
        assert!(game.is_game_live);
    }

    #[tokio::test]
    async fn create_continues_from_stored_maximum() {
        let games = lifecycle(seeded([3, 17, 5]));
        assert_eq!(games.create_game().await.unwrap().id, 18);
    }

    #[tokio::test]
    async fn serial_creations_are_strictly_increasing() {
        let games = lifecycle(InMemoryGameStore::new());
        let mut ids = Vec::new();
        for _ in 0..5 {
            ids.push(games.create_game().await.unwrap().id);
        }
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn ids_are_not_reused_below_the_maximum() {
        let store = seeded([1, 2, 3]);
        let games = lifecycle(store.clone());
        games.end_game(2, "alice".into(), false).await.unwrap();
        assert_eq!(games.create_game().await.unwrap().id, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creations_allocate_distinct_ids() {
        const CALLERS: u64 = 24;
        const SEEDED_MAX: u64 = 41;

        let store = seeded([7, SEEDED_MAX]);
        let games = GameLifecycle::new(
            Arc::new(store.clone()),
            LifecycleSettings {
                allocation_attempts: CALLERS as u32,
                ..LifecycleSettings::default()
            },
        );

        let handles = (0..CALLERS)
            .map(|_| {
                let games = games.clone();
                tokio::spawn(async move { games.create_game().await })
            })
            .collect::<Vec<_>>();

        let mut ids = HashSet::new();
        for handle in futures::future::join_all(handles).await {
            let game = handle.unwrap().unwrap();
            assert!(ids.insert(game.id), "duplicate id {}", game.id);
        }

        let expected = (SEEDED_MAX + 1..=SEEDED_MAX + CALLERS).collect::<HashSet<_>>();
        assert_eq!(ids, expected);
        assert_eq!(store.len().await, CALLERS as usize + 2);
    }

    #[tokio::test]
    async fn conflicting_insert_moves_to_next_candidate() {
        let store = FaultyStore::new(seeded([9]));
        store.conflicts_left.store(2, Ordering::SeqCst);
        let games = GameLifecycle::new(Arc::new(store), LifecycleSettings::default());

        assert_eq!(games.create_game().await.unwrap().id, 12);
    }

    #[tokio::test]
    async fn allocation_fails_after_exhausting_attempts() {
        let store = FaultyStore::new(InMemoryGameStore::new());
        store.conflicts_left.store(u32::MAX, Ordering::SeqCst);
        let games = GameLifecycle::new(
            Arc::new(store),
            LifecycleSettings {
                allocation_attempts: 3,
                ..LifecycleSettings::default()
            },
        );

        let err = games.create_game().await.unwrap_err();
        assert!(matches!(err, ServiceError::AllocationFailed { .. }));
    }

    #[tokio::test]
    async fn failed_max_lookup_is_an_allocation_failure() {
        let mut store = FaultyStore::new(InMemoryGameStore::new());
        store.fail_find_max = true;
        let games = GameLifecycle::new(Arc::new(store), LifecycleSettings::default());

        let err = games.create_game().await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AllocationFailed {
                source: Some(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn failed_insert_is_a_write_error() {
        let mut store = FaultyStore::new(InMemoryGameStore::new());
        store.fail_writes = true;
        let games = GameLifecycle::new(Arc::new(store), LifecycleSettings::default());

        let err = games.create_game().await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreWrite(_)));
    }

    #[tokio::test]
    async fn id_space_exhaustion_is_reported() {
        let games = lifecycle(seeded([u64::MAX]));
        let err = games.create_game().await.unwrap_err();
        assert!(matches!(err, ServiceError::AllocationFailed { .. }));
    }

    #[tokio::test]
    async fn store_id_ceiling_is_an_allocation_failure() {
        let mut store = FaultyStore::new(seeded([i64::MAX as u64]));
        store.max_storable_id = Some(i64::MAX as u64);
        let games = GameLifecycle::new(Arc::new(store), LifecycleSettings::default());

        let err = games.create_game().await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AllocationFailed {
                source: Some(StorageError::IdOutOfRange { .. }),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn slow_store_calls_time_out() {
        let mut store = FaultyStore::new(InMemoryGameStore::new());
        store.delay = Some(Duration::from_millis(500));
        let games = GameLifecycle::new(
            Arc::new(store),
            LifecycleSettings {
                store_timeout: Duration::from_millis(20),
                ..LifecycleSettings::default()
            },
        );

        let err = games.create_game().await.unwrap_err();
        assert!(matches!(err, ServiceError::Timeout));
    }

    #[tokio::test]
    async fn get_returns_created_record() {
        let games = lifecycle(InMemoryGameStore::new());
        let created = games.create_game().await.unwrap();
        assert_eq!(games.get_game(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn get_unknown_game_is_not_found() {
        let games = lifecycle(seeded([1]));
        let err = games.get_game(99).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(99)));
    }

    #[tokio::test]
    async fn failed_lookup_is_unavailable() {
        let mut store = FaultyStore::new(seeded([1]));
        store.fail_reads = true;
        let games = GameLifecycle::new(Arc::new(store), LifecycleSettings::default());

        let err = games.get_game(1).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));
    }

    #[tokio::test]
    async fn recorded_turn_replaces_pgn_and_turn() {
        let games = lifecycle(InMemoryGameStore::new());
        let created = games.create_game().await.unwrap();

        games
            .record_turn(GameEntity {
                id: created.id,
                pgn: "1.e4".into(),
                current_turn: "black".into(),
                is_game_live: false,
            })
            .await
            .unwrap();

        let stored = games.get_game(created.id).await.unwrap();
        assert_eq!(stored.id, created.id);
        assert_eq!(stored.pgn, "1.e4");
        assert_eq!(stored.current_turn, "black");
        assert!(stored.is_game_live);
    }

    #[tokio::test]
    async fn turn_for_unknown_game_is_not_found() {
        let store = InMemoryGameStore::new();
        let games = lifecycle(store.clone());
        let err = games
            .record_turn(GameEntity::new_live(5))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(5)));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn failed_update_is_a_write_error() {
        let mut store = FaultyStore::new(seeded([1]));
        store.fail_writes = true;
        let games = GameLifecycle::new(Arc::new(store), LifecycleSettings::default());

        let err = games.record_turn(GameEntity::new_live(1)).await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreWrite(_)));
    }

    #[tokio::test]
    async fn end_game_removes_record() {
        let games = lifecycle(InMemoryGameStore::new());
        let created = games.create_game().await.unwrap();

        let result = games
            .end_game(created.id, "alice".into(), false)
            .await
            .unwrap();
        assert!(result.success);
        assert!(!result.is_quit);
        assert_eq!(result.ending_player, "alice");
        assert!(result.failure_message.is_empty());

        let err = games.get_game(created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn failed_delete_is_a_write_error() {
        let mut store = FaultyStore::new(seeded([4]));
        store.fail_writes = true;
        let games = GameLifecycle::new(Arc::new(store), LifecycleSettings::default());

        let err = games.end_game(4, "alice".into(), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::StoreWrite(_)));
    }

    #[tokio::test]
    async fn quit_reports_quit_flag() {
        let games = lifecycle(seeded([3]));
        let result = games.end_game(3, "bob".into(), true).await.unwrap();
        assert!(result.is_quit);
    }

    #[tokio::test]
    async fn ending_twice_reports_not_found() {
        let games = lifecycle(seeded([3]));
        games.end_game(3, "bob".into(), true).await.unwrap();

        let err = games.end_game(3, "bob".into(), true).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(3)));
        assert!(matches!(
            games.get_game(3).await.unwrap_err(),
            ServiceError::NotFound(3)
        ));
    }

    #[tokio::test]
    async fn terminated_game_rejects_turns() {
        let games = lifecycle(seeded([2]));
        games.end_game(2, "alice".into(), false).await.unwrap();

        let err = games.record_turn(GameEntity::new_live(2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(2)));
    }

    #[tokio::test]
    async fn blank_ending_player_is_rejected() {
        let store = seeded([2]);
        let games = lifecycle(store.clone());
        let err = games.end_game(2, "  ".into(), false).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(store.len().await, 1);
    }
}
