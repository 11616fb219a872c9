use tracing::warn;

use crate::{
    dto::health::{HealthResponse, StoreHealth},
    state::SharedState,
};

/// Ping the installed store and report whether the service can serve games.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.game_store().await {
        Some(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
                return StoreHealth::Degraded.into();
            }
        }
        None => warn!("storage unavailable (degraded mode)"),
    }

    let status = if state.is_degraded() {
        StoreHealth::Degraded
    } else {
        StoreHealth::Ok
    };
    status.into()
}
