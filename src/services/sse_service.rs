//! SSE subscriptions to per-session event streams.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio_stream::{StreamExt, wrappers::ReceiverStream};
use tracing::debug;
use uuid::Uuid;

use crate::{error::ServiceError, services::turn_service, state::SharedState};

const FORWARD_BUFFER: usize = 8;
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Open an SSE stream carrying one session's change events.
///
/// The broadcast receiver is drained by a forwarder task so a slow client
/// only lags its own stream; lagged events are skipped, and the next
/// snapshot resynchronizes the client.
pub async fn subscribe(
    state: &SharedState,
    session_id: Uuid,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let store = state.require_game_store().await?;
    // Unknown sessions get a 404 instead of a stream that never speaks.
    turn_service::load_session(&store, session_id).await?;

    let mut events = state.session_events().subscribe(session_id);
    let (tx, forwarded) = mpsc::channel(FORWARD_BUFFER);

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        // Client disconnected.
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!(%session_id, skipped, "slow subscriber skipped events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let stream = ReceiverStream::new(forwarded).map(|event| {
        let mut out = Event::default().data(event.data);
        if let Some(name) = event.event {
            out = out.event(name);
        }
        Ok(out)
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::SystemTime;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::{GameStore, memory::MemoryGameStore},
        state::{AppState, session::GameSession},
    };

    #[tokio::test]
    async fn subscribing_to_an_unknown_session_is_not_found() {
        let (state, _rx) = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;

        let err = subscribe(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn subscribing_to_an_existing_session_succeeds() {
        let (state, _rx) = AppState::new(AppConfig::default());
        let store = Arc::new(MemoryGameStore::new());
        state.set_game_store(store.clone()).await;

        let session = GameSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            state.config().rules(),
            SystemTime::now(),
        );
        let session_id = session.id;
        store.save_session(session.into()).await.unwrap();

        assert!(subscribe(&state, session_id).await.is_ok());
        assert_eq!(state.session_events().channel_count(), 1);
    }
}
