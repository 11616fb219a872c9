//! Process-local game store used by tests and the `memory` backend.

use std::{collections::BTreeMap, sync::Arc};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    game_store::GameStore,
    models::GameEntity,
    storage::{StorageError, StorageResult},
};

/// Ordered map of games guarded by an async lock.
#[derive(Clone, Default)]
pub struct InMemoryGameStore {
    games: Arc<RwLock<BTreeMap<u64, GameEntity>>>,
}

impl InMemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `games`.
    pub fn with_games(games: impl IntoIterator<Item = GameEntity>) -> Self {
        let games = games.into_iter().map(|game| (game.id, game)).collect();
        Self {
            games: Arc::new(RwLock::new(games)),
        }
    }

    /// Number of stored games.
    pub async fn len(&self) -> usize {
        self.games.read().await.len()
    }
}

impl GameStore for InMemoryGameStore {
    fn find_max(&self) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let games = self.games.clone();
        Box::pin(async move {
            let guard = games.read().await;
            Ok(guard.last_key_value().map(|(_, game)| game.clone()))
        })
    }

    fn find_by_id(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let games = self.games.clone();
        Box::pin(async move { Ok(games.read().await.get(&id).cloned()) })
    }

    fn insert(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let games = self.games.clone();
        Box::pin(async move {
            let mut guard = games.write().await;
            if guard.contains_key(&game.id) {
                return Err(StorageError::Conflict { id: game.id });
            }
            guard.insert(game.id, game);
            Ok(())
        })
    }

    fn update(&self, id: u64, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let games = self.games.clone();
        Box::pin(async move {
            let mut guard = games.write().await;
            match guard.get_mut(&id) {
                Some(slot) => {
                    *slot = game;
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn delete(&self, id: u64) -> BoxFuture<'static, StorageResult<bool>> {
        let games = self.games.clone();
        Box::pin(async move { Ok(games.write().await.remove(&id).is_some()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
