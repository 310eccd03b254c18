use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the health payload, pinging the session store on the way.
///
/// A failing ping is only logged here; flipping into degraded mode is the
/// storage supervisor's call, not the health endpoint's.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_game_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "session store ping failed");
            }
        }
        Err(_) => warn!("session store unavailable (degraded mode)"),
    }

    if state.is_degraded().await {
        HealthResponse::degraded()
    } else {
        HealthResponse::ok()
    }
}
