//! Session lifecycle: creation and retrieval.

use std::time::SystemTime;

use tracing::info;
use uuid::Uuid;

use crate::{
    dto::session::SessionSummary,
    error::ServiceError,
    services::{deck_service, turn_service},
    state::{SharedState, session::GameSession},
};

/// Open a session between two users and deal the opening card.
///
/// Participant 1 takes the first turn and their countdown starts immediately.
pub async fn create_session(
    state: &SharedState,
    user1_id: Uuid,
    user2_id: Uuid,
) -> Result<SessionSummary, ServiceError> {
    let _gate = state.lock_sessions().await;
    let store = state.require_game_store().await?;

    let now = SystemTime::now();
    let mut session = GameSession::new(user1_id, user2_id, state.config().rules(), now);

    let card = deck_service::draw_card(state, &session)
        .await?
        .ok_or(ServiceError::DeckExhausted)?;
    session.assign_card(&card, now);

    store.save_session(session.clone().into()).await?;
    state.timers().arm(
        session.id,
        session.current_turn,
        card.id,
        card.time_limit_seconds,
        state.config().expiry_grace(),
    );

    info!(session_id = %session.id, "session created");
    Ok(SessionSummary::from_session(&session, Some(&card)))
}

/// Fetch the current snapshot of a session.
pub async fn get_session(state: &SharedState, id: Uuid) -> Result<SessionSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let session = turn_service::load_session(&store, id).await?;
    let card = turn_service::fetch_current_card(&store, &session).await?;
    Ok(SessionSummary::from_session(&session, card.as_ref()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::memory::MemoryGameStore,
            models::{CardCategory, DeckCardEntity, SessionStatus},
        },
        state::AppState,
    };

    async fn state_with_store() -> SharedState {
        let (state, _rx) = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state
    }

    async fn seed_card(state: &SharedState) {
        let store = state.require_game_store().await.unwrap();
        store
            .save_card(DeckCardEntity {
                id: Uuid::new_v4(),
                category: CardCategory::Action,
                prompt: "plan the next date night".into(),
                time_limit_seconds: 90,
                is_active: true,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn creation_deals_the_opening_card_and_arms_the_timer() {
        let state = state_with_store().await;
        seed_card(&state).await;

        let user1 = Uuid::new_v4();
        let user2 = Uuid::new_v4();
        let summary = create_session(&state, user1, user2).await.unwrap();

        assert_eq!(summary.status, SessionStatus::Active);
        assert_eq!(summary.current_turn, user1);
        assert_eq!(summary.total_cards_played, 1);
        assert!(summary.current_card.is_some());
        assert!(state.timers().is_armed(summary.id));
    }

    #[tokio::test]
    async fn creation_fails_on_an_empty_deck() {
        let state = state_with_store().await;
        let err = create_session(&state, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DeckExhausted));
    }

    #[tokio::test]
    async fn snapshot_round_trips_through_the_store() {
        let state = state_with_store().await;
        seed_card(&state).await;

        let created = create_session(&state, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap();
        let fetched = get_session(&state, created.id).await.unwrap();

        assert_eq!(fetched.id, created.id);
        assert_eq!(
            fetched.current_card.map(|c| c.id),
            created.current_card.map(|c| c.id)
        );
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let state = state_with_store().await;
        let err = get_session(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
