use std::sync::Arc;

use futures::future::BoxFuture;
use mongodb::{Collection, Database, IndexModel, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoGameDocument, doc_id},
};
use crate::dao::{game_store::GameStore, models::GameEntity, storage::StorageResult};

const GAME_COLLECTION_NAME: &str = "savedGames";

/// MongoDB-backed store sharing one pooled client across requests.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let database =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let database = establish_connection(&config.options, &config.database_name).await?;
        let store = Self::from_database(database, config);
        store.ensure_indexes().await?;
        Ok(store)
    }

    fn from_database(database: Database, config: MongoConfig) -> Self {
        Self {
            inner: Arc::new(MongoInner {
                state: RwLock::new(MongoState { database }),
                config,
            }),
        }
    }

    /// The unique index on `id` is what turns a racing insert into a duplicate-key error.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let collection = self.collection().await;
        let index = IndexModel::builder()
            .keys(doc! {"id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("game_id_unique_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: GAME_COLLECTION_NAME,
                index: "id",
                source,
            })?;

        Ok(())
    }

    async fn collection(&self) -> Collection<MongoGameDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoGameDocument>(GAME_COLLECTION_NAME)
    }

    async fn find_max(&self) -> MongoResult<Option<GameEntity>> {
        let collection = self.collection().await;
        let document = collection
            .find_one(doc! {})
            .sort(doc! {"id": -1})
            .await
            .map_err(|source| MongoDaoError::FindMax { source })?;

        document.map(GameEntity::try_from).transpose()
    }

    async fn find_by_id(&self, id: u64) -> MongoResult<Option<GameEntity>> {
        // No stored document can carry an id beyond int64.
        let Ok(filter) = doc_id(id) else {
            return Ok(None);
        };
        let collection = self.collection().await;
        let document = collection
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::LoadGame { id, source })?;

        document.map(GameEntity::try_from).transpose()
    }

    async fn insert(&self, game: GameEntity) -> MongoResult<()> {
        let id = game.id;
        let document = MongoGameDocument::try_from(game)?;
        let collection = self.collection().await;

        match collection.insert_one(&document).await {
            Ok(_) => Ok(()),
            Err(source) if is_duplicate_key(&source) => Err(MongoDaoError::DuplicateId { id }),
            Err(source) => Err(MongoDaoError::InsertGame { id, source }),
        }
    }

    async fn update(&self, id: u64, game: GameEntity) -> MongoResult<bool> {
        let Ok(filter) = doc_id(id) else {
            return Ok(false);
        };
        let document = MongoGameDocument::try_from(game)?;
        let collection = self.collection().await;
        let result = collection
            .replace_one(filter, &document)
            .await
            .map_err(|source| MongoDaoError::UpdateGame { id, source })?;

        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: u64) -> MongoResult<bool> {
        let Ok(filter) = doc_id(id) else {
            return Ok(false);
        };
        let collection = self.collection().await;
        let result = collection
            .delete_one(filter)
            .await
            .map_err(|source| MongoDaoError::DeleteGame { id, source })?;

        Ok(result.deleted_count > 0)
    }
}

impl GameStore for MongoGameStore {
    fn find_max(&self) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_max().await.map_err(Into::into) })
    }

    fn find_by_id(&self, id: u64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_by_id(id).await.map_err(Into::into) })
    }

    fn insert(&self, game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert(game).await.map_err(Into::into) })
    }

    fn update(&self, id: u64, game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.update(id, game).await.map_err(Into::into) })
    }

    fn delete(&self, id: u64) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete(id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
