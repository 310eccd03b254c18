//! Keeps the MongoDB backend connected and drives degraded mode.
//!
//! While the store is down the application keeps serving reads of nothing
//! and rejects gameplay with a 503; turn countdowns are paused so nobody
//! loses a turn to an outage.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::{
    dao::game_store::mongodb::{MongoConfig, MongoGameStore},
    services::timer_service,
    state::SharedState,
};

const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const RECONNECT_ATTEMPTS: u32 = 3;
const RECONNECT_BACKOFF: Duration = Duration::from_secs(2);

/// Supervise the storage backend for the lifetime of the process.
pub async fn run(state: SharedState, config: MongoConfig) {
    loop {
        let store = match MongoGameStore::connect(config.clone()).await {
            Ok(store) => store,
            Err(err) => {
                error!(error = %err, "failed to connect to storage; retrying");
                sleep(RECONNECT_BACKOFF).await;
                continue;
            }
        };

        info!("storage backend connected");
        state.set_game_store(Arc::new(store)).await;
        if let Err(err) = timer_service::rearm_active_sessions(&state).await {
            warn!(error = %err, "failed to re-arm countdowns after storage came up");
        }

        supervise(&state).await;
        // The store was dropped; reconnect from scratch.
    }
}

/// Poll the installed store until it becomes unreachable, then clear it.
async fn supervise(state: &SharedState) {
    loop {
        sleep(HEALTH_POLL_INTERVAL).await;
        let Some(store) = state.game_store().await else {
            return;
        };
        if store.health_check().await.is_ok() {
            continue;
        }

        warn!("storage health check failed; attempting to reconnect");
        let mut recovered = false;
        for attempt in 1..=RECONNECT_ATTEMPTS {
            if store.try_reconnect().await.is_ok() && store.health_check().await.is_ok() {
                info!(attempt, "storage connection re-established");
                recovered = true;
                break;
            }
            sleep(RECONNECT_BACKOFF).await;
        }

        if !recovered {
            error!("storage unreachable; entering degraded mode");
            state.clear_game_store().await;
            return;
        }
    }
}
