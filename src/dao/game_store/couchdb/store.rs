use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::from_value;
use tracing::debug;

use crate::dao::{game_store::GameStore, models::GameEntity, storage::StorageResult};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{AllDocsResponse, CouchGameDocument, END_SUFFIX, GAME_PREFIX, RevisionOnly, game_doc_id},
};

/// Attempts made when a revision changes between reading and writing a document.
const MAX_REVISION_RETRIES: u32 = 3;

/// CouchDB-backed store talking to the HTTP API through a pooled `reqwest` client.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

/// Outcome of a write that carries a revision.
enum RevisionedWrite {
    Done,
    Missing,
    Stale,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn with_auth(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.database, path);
        self.with_auth(self.client.request(method, url))
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .with_auth(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412 means another instance created it first.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED
                {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<StatusCode>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        Ok(response.status())
    }

    async fn find_max(&self) -> CouchResult<Option<GameEntity>> {
        const ALL_DOCS: &str = "_all_docs";
        // Descending scans start from the high end of the key range.
        let query = [
            ("include_docs", "true".to_string()),
            ("descending", "true".to_string()),
            ("limit", "1".to_string()),
            ("startkey", format!("\"{}{}\"", GAME_PREFIX, END_SUFFIX)),
            ("endkey", format!("\"{}\"", GAME_PREFIX)),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let Some(row) = payload.rows.into_iter().next() else {
            return Ok(None);
        };
        let Some(doc) = row.doc else {
            return Err(CouchDaoError::InvalidDocId { doc_id: row.id });
        };

        let document = from_value::<CouchGameDocument>(doc).map_err(|source| {
            CouchDaoError::DeserializeValue {
                path: row.id,
                source,
            }
        })?;
        GameEntity::try_from(document).map(Some)
    }

    async fn find_by_id(&self, id: u64) -> CouchResult<Option<GameEntity>> {
        let doc_id = game_doc_id(id);
        self.get_document::<CouchGameDocument>(&doc_id)
            .await?
            .map(GameEntity::try_from)
            .transpose()
    }

    async fn insert(&self, game: GameEntity) -> CouchResult<()> {
        let id = game.id;
        let doc_id = game_doc_id(id);
        let document = CouchGameDocument::from((game, None));

        let status = self.put_document(&doc_id, &document).await?;
        match status {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(CouchDaoError::DuplicateId { id }),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id,
                status,
            }),
        }
    }

    async fn current_revision(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self
            .get_document::<RevisionOnly>(doc_id)
            .await?
            .map(|doc| doc.rev))
    }

    async fn replace_once(&self, doc_id: &str, game: &GameEntity) -> CouchResult<RevisionedWrite> {
        let Some(rev) = self.current_revision(doc_id).await? else {
            return Ok(RevisionedWrite::Missing);
        };
        let document = CouchGameDocument::from((game.clone(), Some(rev)));

        match self.put_document(doc_id, &document).await? {
            status if status.is_success() => Ok(RevisionedWrite::Done),
            StatusCode::CONFLICT => Ok(RevisionedWrite::Stale),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    async fn delete_once(&self, doc_id: &str) -> CouchResult<RevisionedWrite> {
        let Some(rev) = self.current_revision(doc_id).await? else {
            return Ok(RevisionedWrite::Missing);
        };

        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            status if status.is_success() => Ok(RevisionedWrite::Done),
            StatusCode::NOT_FOUND => Ok(RevisionedWrite::Missing),
            StatusCode::CONFLICT => Ok(RevisionedWrite::Stale),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    /// Full replace with last-write-wins semantics: a stale revision is re-read and retried.
    async fn update(&self, id: u64, game: GameEntity) -> CouchResult<bool> {
        let doc_id = game_doc_id(id);
        for attempt in 1..=MAX_REVISION_RETRIES {
            match self.replace_once(&doc_id, &game).await? {
                RevisionedWrite::Done => return Ok(true),
                RevisionedWrite::Missing => return Ok(false),
                RevisionedWrite::Stale => debug!(id, attempt, "stale revision on update"),
            }
        }
        Err(CouchDaoError::RequestStatus {
            path: doc_id,
            status: StatusCode::CONFLICT,
        })
    }

    async fn delete(&self, id: u64) -> CouchResult<bool> {
        let doc_id = game_doc_id(id);
        for attempt in 1..=MAX_REVISION_RETRIES {
            match self.delete_once(&doc_id).await? {
                RevisionedWrite::Done => return Ok(true),
                RevisionedWrite::Missing => return Ok(false),
                RevisionedWrite::Stale => debug!(id, attempt, "stale revision on delete"),
            }
        }
        Err(CouchDaoError::RequestStatus {
            path: doc_id,
            status: StatusCode::CONFLICT,
        })
    }

    async fn ping(&self) -> CouchResult<()> {
        let url = self.database_url();
        let response = self
            .with_auth(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: url.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: url,
                status: response.status(),
            })
        }
    }
}

impl GameStore for CouchGameStore {
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
        Box::pin(async move { store.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
