//! Event names and broadcast helpers for session subscribers.

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        session::SessionSummary,
        sse::{GameOverEvent, ServerEvent},
    },
    state::{
        SharedState,
        session::{DeckCard, GameSession},
    },
};

/// Full session snapshot, emitted after every authoritative mutation.
pub const SESSION_SNAPSHOT: &str = "session.snapshot";
/// Terminal event, emitted once when a session completes.
pub const SESSION_GAME_OVER: &str = "session.game_over";

/// Push the session's new state to its subscribers.
///
/// A snapshot always goes out; a completed session additionally gets the
/// terminal event so clients need not diff snapshots to detect the end.
pub fn publish_session(state: &SharedState, session: &GameSession, card: Option<&DeckCard>) {
    broadcast(
        state,
        session.id,
        SESSION_SNAPSHOT,
        &SessionSummary::from_session(session, card),
    );

    if session.is_active() {
        return;
    }
    let Some(reason) = session.win_reason else {
        return;
    };
    broadcast(
        state,
        session.id,
        SESSION_GAME_OVER,
        &GameOverEvent {
            session_id: session.id,
            winner_id: session.winner_id,
            win_reason: reason,
        },
    );
}

fn broadcast<T: Serialize>(state: &SharedState, session_id: Uuid, event: &str, payload: &T) {
    match ServerEvent::json(event, payload) {
        Ok(event) => state.session_events().broadcast(session_id, event),
        Err(err) => warn!(%session_id, event, error = %err, "failed to serialize session event"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::SystemTime;

    use super::*;
    use crate::{
        config::{AppConfig, GameRules},
        state::AppState,
    };

    fn sample_session() -> GameSession {
        GameSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &GameRules::default(),
            SystemTime::now(),
        )
    }

    fn state() -> Arc<AppState> {
        AppState::new(AppConfig::default()).0
    }

    #[tokio::test]
    async fn active_session_emits_only_a_snapshot() {
        let state = state();
        let session = sample_session();
        let mut rx = state.session_events().subscribe(session.id);

        publish_session(&state, &session, None);

        let event = rx.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some(SESSION_SNAPSHOT));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn completed_session_emits_snapshot_then_game_over() {
        let state = state();
        let mut session = sample_session();
        session.finish_deck_exhausted(SystemTime::now());
        let mut rx = state.session_events().subscribe(session.id);

        publish_session(&state, &session, None);

        assert_eq!(
            rx.try_recv().unwrap().event.as_deref(),
            Some(SESSION_SNAPSHOT)
        );
        let terminal = rx.try_recv().unwrap();
        assert_eq!(terminal.event.as_deref(), Some(SESSION_GAME_OVER));
        assert!(terminal.data.contains("completed"));
    }
}
