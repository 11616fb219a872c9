use serde::Serialize;
use utoipa::ToSchema;

/// Reachability of the game store as seen by `/healthcheck`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreHealth {
    /// A store is installed and answered its last ping.
    Ok,
    /// No usable store; game routes answer 503 until one is back.
    Degraded,
}

/// Body of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Serialized as `"ok"` or `"degraded"`.
    pub status: StoreHealth,
}

impl From<StoreHealth> for HealthResponse {
    fn from(status: StoreHealth) -> Self {
        Self { status }
    }
}
