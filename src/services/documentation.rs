use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the live chess game service.
#[openapi(
    paths(
        crate::routes::health::ping,
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::create_game_post,
        crate::routes::game::record_turn,
        crate::routes::game::get_game,
        crate::routes::game::end_game,
        crate::routes::game::quit_game,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::StoreHealth,
            crate::dto::game::GameRecord,
            crate::dto::game::TurnRequest,
            crate::dto::game::WriteAck,
            crate::dto::game::EndGameResult,
        )
    ),
    tags(
        (name = "health", description = "Liveness and health check endpoints"),
        (name = "game", description = "Live game records"),
    )
)]
pub struct ApiDoc;
