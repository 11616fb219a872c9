use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use tracing::debug;
use validator::Validate;

use crate::{
    dto::game::{EndGameResult, GameRecord, TurnRequest, WriteAck, validate_ending_player},
    error::AppError,
    state::SharedState,
};

/// Routes covering the whole life of a game record.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/new", get(create_game).post(create_game_post))
        .route("/live/{id}", get(get_game).post(record_turn))
        .route("/end/{id}/{ending_player}", delete(end_game))
        .route("/quit/{id}/{ending_player}", delete(quit_game))
}

/// Allocate a new id and persist an empty live game.
#[utoipa::path(
    get,
    path = "/new",
    tag = "game",
    responses(
        (status = 200, description = "Game created", body = GameRecord),
        (status = 500, description = "No game id could be allocated"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_game(State(state): State<SharedState>) -> Result<Json<GameRecord>, AppError> {
    let game = state.lifecycle().await?.create_game().await?;
    Ok(Json(game.into()))
}

/// Same as `GET /new`, for clients that create resources with POST.
#[utoipa::path(
    post,
    path = "/new",
    tag = "game",
    responses(
        (status = 200, description = "Game created", body = GameRecord),
        (status = 500, description = "No game id could be allocated"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_game_post(state: State<SharedState>) -> Result<Json<GameRecord>, AppError> {
    create_game(state).await
}

/// Store the board after a player's move, replacing the previous record.
#[utoipa::path(
    post,
    path = "/live/{id}",
    tag = "game",
    params(("id" = u64, Path, description = "Identifier of the live game")),
    request_body = TurnRequest,
    responses(
        (status = 200, description = "Turn recorded", body = WriteAck),
        (status = 400, description = "Malformed id or body"),
        (status = 404, description = "Unknown game"),
        (status = 500, description = "Storage write failed")
    )
)]
pub async fn record_turn(
    State(state): State<SharedState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<TurnRequest>, JsonRejection>,
) -> Result<Json<WriteAck>, AppError> {
    let id = parse_id(id)?;
    let Json(request) = payload.map_err(|rejection| {
        debug!(id, error = %rejection.body_text(), "rejected turn body");
        AppError::BadRequest("malformed turn body".into())
    })?;
    request.validate()?;

    let record = request.into_entity(id)?;
    let stored = state.lifecycle().await?.record_turn(record).await?;
    Ok(Json(WriteAck::replaced(stored.id)))
}

/// Return the current record of a live game.
#[utoipa::path(
    get,
    path = "/live/{id}",
    tag = "game",
    params(("id" = u64, Path, description = "Identifier of the live game")),
    responses(
        (status = 200, description = "Current game state", body = GameRecord),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Unknown or terminated game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<GameRecord>, AppError> {
    let id = parse_id(id)?;
    let game = state.lifecycle().await?.get_game(id).await?;
    Ok(Json(game.into()))
}

/// Finish a game normally and remove its record.
#[utoipa::path(
    delete,
    path = "/end/{id}/{ending_player}",
    tag = "game",
    params(
        ("id" = u64, Path, description = "Identifier of the live game"),
        ("ending_player" = String, Path, description = "Player that ended the game")
    ),
    responses(
        (status = 200, description = "Game ended", body = EndGameResult),
        (status = 400, description = "Malformed id or player", body = EndGameResult),
        (status = 404, description = "Unknown or already terminated game", body = EndGameResult),
        (status = 500, description = "Storage write failed", body = EndGameResult)
    )
)]
pub async fn end_game(
    State(state): State<SharedState>,
    Path((id, ending_player)): Path<(String, String)>,
) -> Result<Json<EndGameResult>, EndGameFailure> {
    terminate(&state, id, ending_player, false).await
}

/// Abandon a game and remove its record.
#[utoipa::path(
    delete,
    path = "/quit/{id}/{ending_player}",
    tag = "game",
    params(
        ("id" = u64, Path, description = "Identifier of the live game"),
        ("ending_player" = String, Path, description = "Player that quit")
    ),
    responses(
        (status = 200, description = "Game quit", body = EndGameResult),
        (status = 400, description = "Malformed id or player", body = EndGameResult),
        (status = 404, description = "Unknown or already terminated game", body = EndGameResult),
        (status = 500, description = "Storage write failed", body = EndGameResult)
    )
)]
pub async fn quit_game(
    State(state): State<SharedState>,
    Path((id, ending_player)): Path<(String, String)>,
) -> Result<Json<EndGameResult>, EndGameFailure> {
    terminate(&state, id, ending_player, true).await
}

async fn terminate(
    state: &SharedState,
    raw_id: String,
    ending_player: String,
    is_quit: bool,
) -> Result<Json<EndGameResult>, EndGameFailure> {
    let outcome = async {
        let id = raw_id
            .parse::<u64>()
            .map_err(|_| AppError::BadRequest(format!("invalid game id `{raw_id}`")))?;
        validate_ending_player(&ending_player)?;
        let result = state
            .lifecycle()
            .await?
            .end_game(id, ending_player.clone(), is_quit)
            .await?;
        Ok::<_, AppError>(result)
    }
    .await;

    outcome.map(Json).map_err(|error| EndGameFailure {
        error,
        ending_player,
        is_quit,
    })
}

fn parse_id(id: Result<Path<u64>, PathRejection>) -> Result<u64, AppError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        debug!(error = %rejection.body_text(), "rejected game id");
        AppError::BadRequest("game id must be an unsigned integer".into())
    })
}

/// Failed termination rendered in the same shape as a successful one.
pub struct EndGameFailure {
    error: AppError,
    ending_player: String,
    is_quit: bool,
}

impl IntoResponse for EndGameFailure {
    fn into_response(self) -> Response {
        let status = self.error.status();
        let body = EndGameResult::failed(self.ending_player, self.is_quit, self.error.to_string());
        (status, Json(body)).into_response()
    }
}
