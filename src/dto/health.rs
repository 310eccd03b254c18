use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
///
/// Degraded means the session store is unreachable: snapshots and turn
/// actions answer 503 and every countdown is paused until it comes back.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" while the session store answers, "degraded" otherwise.
    pub status: String,
}

impl HealthResponse {
    /// The store is reachable and gameplay is available.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// The store is unreachable; gameplay is suspended.
    pub fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
        }
    }
}
