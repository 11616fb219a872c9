use std::sync::Arc;

use chess_live_back::{
    dao::{
        game_store::{GameStore, memory::InMemoryGameStore},
        models::GameEntity,
        storage::{StorageError, StorageResult},
    },
    routes,
    services::game_service::LifecycleSettings,
    state::{AppState, SharedState},
};
use futures::future::BoxFuture;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;

async fn serve(state: SharedState) -> String {
    let app = routes::router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    format!("http://{addr}")
}

/// Store whose every call fails as if the database had gone away.
struct BrokenStore;

fn broken<T: Send + 'static>() -> BoxFuture<'static, StorageResult<T>> {
    Box::pin(async {
        Err(StorageError::unavailable(
            "connection reset".into(),
            std::io::Error::other("connection reset"),
        ))
    })
}

impl GameStore for BrokenStore {
    fn find_max(&self) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        broken()
    }

    fn find_by_id(&self, _id: u64) -> BoxFuture<'static, StorageResult<Option<GameEntity>>> {
        broken()
    }

    fn insert(&self, _game: GameEntity) -> BoxFuture<'static, StorageResult<()>> {
        broken()
    }

    fn update(&self, _id: u64, _game: GameEntity) -> BoxFuture<'static, StorageResult<bool>> {
        broken()
    }

    fn delete(&self, _id: u64) -> BoxFuture<'static, StorageResult<bool>> {
        broken()
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        broken()
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        broken()
    }
}

async fn spawn_app(store: InMemoryGameStore) -> String {
    serve(AppState::with_store(
        Arc::new(store),
        LifecycleSettings::default(),
    ))
    .await
}

#[tokio::test]
async fn game_lifecycle_over_http() {
    let base = spawn_app(InMemoryGameStore::new()).await;
    let client = reqwest::Client::new();

    let created = client.get(format!("{base}/new")).send().await.unwrap();
    assert_eq!(created.status(), StatusCode::OK);
    assert_eq!(
        created.json::<Value>().await.unwrap(),
        json!({"id": 1, "pgn": "", "currentTurn": "", "isGameLive": true})
    );

    let second = client.post(format!("{base}/new")).send().await.unwrap();
    assert_eq!(second.json::<Value>().await.unwrap()["id"], 2);

    let ack = client
        .post(format!("{base}/live/1"))
        .json(&json!({"id": 1, "pgn": "1.e4", "currentTurn": "black"}))
        .send()
        .await
        .unwrap();
    assert_eq!(ack.status(), StatusCode::OK);
    let ack = ack.json::<Value>().await.unwrap();
    assert_eq!(ack["success"], true);
    assert_eq!(ack["matchedCount"], 1);

    let state = client.get(format!("{base}/live/1")).send().await.unwrap();
    assert_eq!(
        state.json::<Value>().await.unwrap(),
        json!({"id": 1, "pgn": "1.e4", "currentTurn": "black", "isGameLive": true})
    );

    let ended = client
        .delete(format!("{base}/end/1/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(ended.status(), StatusCode::OK);
    assert_eq!(
        ended.json::<Value>().await.unwrap(),
        json!({"success": true, "isQuit": false, "endingPlayer": "alice", "failureMessage": ""})
    );

    let gone = client.get(format!("{base}/live/1")).send().await.unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
    assert_eq!(gone.json::<Value>().await.unwrap()["success"], false);

    let quit = client
        .delete(format!("{base}/quit/2/bob"))
        .send()
        .await
        .unwrap();
    assert_eq!(quit.json::<Value>().await.unwrap()["isQuit"], true);
}

#[tokio::test]
async fn ending_a_terminated_game_is_not_found() {
    let base = spawn_app(InMemoryGameStore::with_games([GameEntity::new_live(5)])).await;
    let client = reqwest::Client::new();

    let first = client
        .delete(format!("{base}/quit/5/carol"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = client
        .delete(format!("{base}/quit/5/carol"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::NOT_FOUND);
    let body = second.json::<Value>().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["isQuit"], true);
    assert_eq!(body["endingPlayer"], "carol");
    assert!(!body["failureMessage"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn malformed_requests_are_bad_requests() {
    let base = spawn_app(InMemoryGameStore::with_games([GameEntity::new_live(1)])).await;
    let client = reqwest::Client::new();

    let bad_id = client.get(format!("{base}/live/abc")).send().await.unwrap();
    assert_eq!(bad_id.status(), StatusCode::BAD_REQUEST);
    assert_eq!(bad_id.json::<Value>().await.unwrap()["success"], false);

    let bad_body = client
        .post(format!("{base}/live/1"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(bad_body.status(), StatusCode::BAD_REQUEST);

    let mismatched = client
        .post(format!("{base}/live/1"))
        .json(&json!({"id": 2, "pgn": "", "currentTurn": "white"}))
        .send()
        .await
        .unwrap();
    assert_eq!(mismatched.status(), StatusCode::BAD_REQUEST);

    let bad_end = client
        .delete(format!("{base}/end/-1/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_end.status(), StatusCode::BAD_REQUEST);
    assert_eq!(bad_end.json::<Value>().await.unwrap()["success"], false);
}

#[tokio::test]
async fn turn_for_unknown_game_is_not_found() {
    let base = spawn_app(InMemoryGameStore::new()).await;
    let response = reqwest::Client::new()
        .post(format!("{base}/live/9"))
        .json(&json!({"pgn": "1.d4", "currentTurn": "black"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn degraded_mode_answers_service_unavailable() {
    let base = serve(AppState::new(LifecycleSettings::default())).await;
    let client = reqwest::Client::new();

    let created = client.get(format!("{base}/new")).send().await.unwrap();
    assert_eq!(created.status(), StatusCode::SERVICE_UNAVAILABLE);

    let health = client
        .get(format!("{base}/healthcheck"))
        .send()
        .await
        .unwrap();
    assert_eq!(health.json::<Value>().await.unwrap()["status"], "degraded");
}

#[tokio::test]
async fn ping_and_docs_are_served() {
    let base = spawn_app(InMemoryGameStore::new()).await;
    let client = reqwest::Client::new();

    let ping = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(ping.json::<Value>().await.unwrap(), json!("ping"));

    let doc = client
        .get(format!("{base}/api-doc/openapi.json"))
        .send()
        .await
        .unwrap();
    assert_eq!(doc.status(), StatusCode::OK);
    let doc = doc.json::<Value>().await.unwrap();
    assert!(doc["paths"].get("/live/{id}").is_some());
}

#[tokio::test]
async fn store_failures_are_classified() {
    let base = serve(AppState::with_store(
        Arc::new(BrokenStore),
        LifecycleSettings::default(),
    ))
    .await;
    let client = reqwest::Client::new();

    let ended = client
        .delete(format!("{base}/end/3/alice"))
        .send()
        .await
        .unwrap();
    assert_eq!(ended.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = ended.json::<Value>().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["isQuit"], false);
    assert_eq!(body["endingPlayer"], "alice");
    let message = body["failureMessage"].as_str().unwrap();
    assert!(!message.is_empty());
    assert!(!message.contains("connection reset"));

    let lookup = client.get(format!("{base}/live/3")).send().await.unwrap();
    assert_eq!(lookup.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(lookup.json::<Value>().await.unwrap()["success"], false);

    let created = client.post(format!("{base}/new")).send().await.unwrap();
    assert_eq!(created.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
