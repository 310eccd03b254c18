//! Authoritative turn transitions: expiration, completion, skip, and reveal.
//!
//! Every entry point serializes on the session gate, applies a pure
//! transition on the loaded session, persists the result, and only then
//! touches timers and notifies subscribers. Timer expirations and client
//! calls go through the same paths, so whichever arrives second fails its
//! precondition instead of corrupting state.

use std::sync::Arc;
use std::time::SystemTime;

use uuid::Uuid;

use crate::{
    dao::game_store::GameStore,
    dto::session::{ExpireTurnResponse, SessionSummary},
    error::ServiceError,
    services::{deck_service, sse_events},
    state::{
        SharedState,
        session::{DeckCard, GameSession, SkipOutcome, TurnOutcome},
    },
};

/// Load a session or fail with a not-found error.
pub(crate) async fn load_session(
    store: &Arc<dyn GameStore>,
    id: Uuid,
) -> Result<GameSession, ServiceError> {
    let entity = store
        .find_session(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` does not exist")))?;
    Ok(entity.into())
}

/// Fetch the deck card currently assigned to the session, if any.
pub(crate) async fn fetch_current_card(
    store: &Arc<dyn GameStore>,
    session: &GameSession,
) -> Result<Option<DeckCard>, ServiceError> {
    let Some(card_id) = session.current_card_id else {
        return Ok(None);
    };
    Ok(store.find_card(card_id).await?.map(DeckCard::from))
}

/// Record that the turn-holder's countdown ran out.
///
/// Increments the holder's failure counter; on the third failure the match
/// ends against them, otherwise the turn rotates and the next card is drawn.
pub async fn expire_turn(
    state: &SharedState,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<ExpireTurnResponse, ServiceError> {
    apply_expiration(state, session_id, user_id, None).await
}

/// Apply a server countdown expiration for a specific card.
///
/// A skip keeps the turn with the same participant, so the turn-holder
/// precondition alone cannot detect a fire queued during the grace window;
/// the expiration is rejected once `card_id` is no longer the card in play.
pub async fn expire_card_timeout(
    state: &SharedState,
    session_id: Uuid,
    user_id: Uuid,
    card_id: Uuid,
) -> Result<ExpireTurnResponse, ServiceError> {
    apply_expiration(state, session_id, user_id, Some(card_id)).await
}

async fn apply_expiration(
    state: &SharedState,
    session_id: Uuid,
    user_id: Uuid,
    expected_card: Option<Uuid>,
) -> Result<ExpireTurnResponse, ServiceError> {
    let _gate = state.lock_sessions().await;
    let store = state.require_game_store().await?;
    let mut session = load_session(&store, session_id).await?;

    if let Some(card_id) = expected_card
        && session.current_card_id != Some(card_id)
    {
        return Err(ServiceError::InvalidState(
            "the card in play changed before the expiration was applied".into(),
        ));
    }

    let now = SystemTime::now();
    let expiry = session.expire_turn(user_id, state.config().rules(), now)?;

    let drawn = match expiry.outcome {
        TurnOutcome::Ended(_) => None,
        TurnOutcome::AwaitingDraw => draw_replacement(state, &mut session, now).await?,
    };

    store.save_session(session.clone().into()).await?;
    sync_timer(state, &session, drawn.as_ref());
    sse_events::publish_session(state, &session, drawn.as_ref());

    Ok(ExpireTurnResponse {
        success: true,
        failed_tasks: expiry.failed_tasks,
        game_ended: !session.is_active(),
        winner_id: session.winner_id,
        win_reason: session.win_reason,
    })
}

/// Record that the turn-holder completed the current card.
pub async fn complete_card(
    state: &SharedState,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<SessionSummary, ServiceError> {
    let _gate = state.lock_sessions().await;
    let store = state.require_game_store().await?;
    let mut session = load_session(&store, session_id).await?;

    let now = SystemTime::now();
    session.complete_card(user_id, now)?;
    let drawn = draw_replacement(state, &mut session, now).await?;

    store.save_session(session.clone().into()).await?;
    sync_timer(state, &session, drawn.as_ref());
    sse_events::publish_session(state, &session, drawn.as_ref());

    Ok(SessionSummary::from_session(&session, drawn.as_ref()))
}

/// Discard the current card without completing it.
///
/// The turn stays with the caller and a replacement is drawn; skipping with
/// no skips left ends the match against the caller.
pub async fn skip_card(
    state: &SharedState,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<SessionSummary, ServiceError> {
    let _gate = state.lock_sessions().await;
    let store = state.require_game_store().await?;
    let mut session = load_session(&store, session_id).await?;

    let now = SystemTime::now();
    let drawn = match session.skip_card(user_id, now)? {
        SkipOutcome::Skipped { .. } => draw_replacement(state, &mut session, now).await?,
        SkipOutcome::Ended(_) => None,
    };

    store.save_session(session.clone().into()).await?;
    sync_timer(state, &session, drawn.as_ref());
    sse_events::publish_session(state, &session, drawn.as_ref());

    Ok(SessionSummary::from_session(&session, drawn.as_ref()))
}

/// Mark the current card as revealed. The countdown keeps running.
pub async fn reveal_card(
    state: &SharedState,
    session_id: Uuid,
    user_id: Uuid,
) -> Result<SessionSummary, ServiceError> {
    let _gate = state.lock_sessions().await;
    let store = state.require_game_store().await?;
    let mut session = load_session(&store, session_id).await?;

    session.reveal_card(user_id, SystemTime::now())?;
    let card = fetch_current_card(&store, &session).await?;

    store.save_session(session.clone().into()).await?;
    sse_events::publish_session(state, &session, card.as_ref());

    Ok(SessionSummary::from_session(&session, card.as_ref()))
}

/// Draw and install the next card, or complete the session when the deck is
/// exhausted.
async fn draw_replacement(
    state: &SharedState,
    session: &mut GameSession,
    now: SystemTime,
) -> Result<Option<DeckCard>, ServiceError> {
    match deck_service::draw_card(state, session).await? {
        Some(card) => {
            session.assign_card(&card, now);
            Ok(Some(card))
        }
        None => {
            session.finish_deck_exhausted(now);
            Ok(None)
        }
    }
}

/// Arm the countdown for the freshly assigned card, or cancel it when the
/// session no longer has one.
fn sync_timer(state: &SharedState, session: &GameSession, card: Option<&DeckCard>) {
    match card {
        Some(card) if session.is_active() => state.timers().arm(
            session.id,
            session.current_turn,
            card.id,
            card.time_limit_seconds,
            state.config().expiry_grace(),
        ),
        _ => state.timers().cancel(session.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            game_store::memory::MemoryGameStore,
            models::{CardCategory, DeckCardEntity, SessionStatus, WinReason},
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

    async fn seed_cards(state: &SharedState, count: usize) {
        let store = state.require_game_store().await.unwrap();
        for index in 0..count {
            store
                .save_card(DeckCardEntity {
                    id: Uuid::new_v4(),
                    category: CardCategory::Text,
                    prompt: format!("prompt {index}"),
                    time_limit_seconds: 60,
                    is_active: true,
                })
                .await
                .unwrap();
        }
    }

    async fn seed_session(state: &SharedState) -> GameSession {
        let store = state.require_game_store().await.unwrap();
        let now = SystemTime::now();
        let mut session = GameSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            state.config().rules(),
            now,
        );
        let card = deck_service::draw_card(state, &session)
            .await
            .unwrap()
            .expect("deck should have cards");
        session.assign_card(&card, now);
        store.save_session(session.clone().into()).await.unwrap();
        session
    }

    async fn reload(state: &SharedState, id: Uuid) -> GameSession {
        let store = state.require_game_store().await.unwrap();
        load_session(&store, id).await.unwrap()
    }

    #[tokio::test]
    async fn expiration_rotates_and_draws_for_the_next_holder() {
        let state = state_with_store().await;
        seed_cards(&state, 5).await;
        let session = seed_session(&state).await;

        let response = expire_turn(&state, session.id, session.user1_id)
            .await
            .unwrap();

        assert!(response.success);
        assert_eq!(response.failed_tasks, 1);
        assert!(!response.game_ended);

        let stored = reload(&state, session.id).await;
        assert_eq!(stored.current_turn, session.user2_id);
        assert!(stored.current_card_id.is_some());
        assert_eq!(stored.total_cards_played, 2);
        assert!(state.timers().is_armed(session.id));
    }

    #[tokio::test]
    async fn third_expiration_ends_the_match_and_cancels_the_timer() {
        let state = state_with_store().await;
        seed_cards(&state, 8).await;
        let session = seed_session(&state).await;

        // user1 expires, user2 expires, user1 expires, and so on; the fifth
        // expiration is user1's third.
        let order = [
            session.user1_id,
            session.user2_id,
            session.user1_id,
            session.user2_id,
            session.user1_id,
        ];
        let mut last = None;
        for user in order {
            last = Some(expire_turn(&state, session.id, user).await.unwrap());
        }

        let response = last.unwrap();
        assert!(response.game_ended);
        assert_eq!(response.failed_tasks, 3);
        assert_eq!(response.winner_id, Some(session.user2_id));
        assert_eq!(response.win_reason, Some(WinReason::FailedTasks));

        let stored = reload(&state, session.id).await;
        assert_eq!(stored.status, SessionStatus::Completed);
        assert!(!state.timers().is_armed(session.id));
    }

    #[tokio::test]
    async fn expiration_by_the_wrong_user_changes_nothing() {
        let state = state_with_store().await;
        seed_cards(&state, 3).await;
        let session = seed_session(&state).await;

        let err = expire_turn(&state, session.id, session.user2_id)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotYourTurn { .. }));

        let stored = reload(&state, session.id).await;
        assert_eq!(stored, session);
    }

    #[tokio::test]
    async fn exhausted_deck_completes_the_session_without_a_winner() {
        let state = state_with_store().await;
        seed_cards(&state, 1).await;
        let session = seed_session(&state).await;

        // The only card is already in play; completing it finds no successor.
        let summary = complete_card(&state, session.id, session.user1_id)
            .await
            .unwrap();

        assert_eq!(summary.winner_id, None);
        assert_eq!(summary.win_reason, Some(WinReason::Completed));

        let stored = reload(&state, session.id).await;
        assert_eq!(stored.status, SessionStatus::Completed);
        assert!(!state.timers().is_armed(session.id));
    }

    #[tokio::test]
    async fn skip_keeps_the_turn_and_spends_a_skip() {
        let state = state_with_store().await;
        seed_cards(&state, 4).await;
        let session = seed_session(&state).await;

        let summary = skip_card(&state, session.id, session.user1_id)
            .await
            .unwrap();

        assert_eq!(summary.current_turn, session.user1_id);
        assert_eq!(summary.user1_skips_remaining, 2);
        let card = summary.current_card.expect("replacement should be drawn");
        assert_ne!(Some(card.id), session.current_card_id);
    }

    #[tokio::test]
    async fn skip_without_skips_left_ends_the_match() {
        let state = state_with_store().await;
        seed_cards(&state, 4).await;
        let session = seed_session(&state).await;

        let store = state.require_game_store().await.unwrap();
        let mut drained = session.clone();
        drained.user1_skips_remaining = 0;
        store.save_session(drained.into()).await.unwrap();

        let summary = skip_card(&state, session.id, session.user1_id)
            .await
            .unwrap();

        assert_eq!(summary.status, SessionStatus::Completed);
        assert_eq!(summary.winner_id, Some(session.user2_id));
        assert_eq!(summary.win_reason, Some(WinReason::NoSkips));
    }

    #[tokio::test]
    async fn reveal_flags_the_card_and_keeps_the_countdown_owner() {
        let state = state_with_store().await;
        seed_cards(&state, 2).await;
        let session = seed_session(&state).await;

        let summary = reveal_card(&state, session.id, session.user1_id)
            .await
            .unwrap();

        let card = summary.current_card.expect("card should still be assigned");
        assert!(card.revealed);
        assert_eq!(summary.current_turn, session.user1_id);
    }

    #[tokio::test]
    async fn stale_timeout_after_a_skip_is_rejected() {
        let state = state_with_store().await;
        seed_cards(&state, 4).await;
        let session = seed_session(&state).await;
        let old_card = session.current_card_id.unwrap();

        // The participant skips while the expiration signal is still queued;
        // the turn stays with them, so only the card id betrays the staleness.
        skip_card(&state, session.id, session.user1_id)
            .await
            .unwrap();

        let err = expire_card_timeout(&state, session.id, session.user1_id, old_card)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));

        let stored = reload(&state, session.id).await;
        assert_eq!(stored.user1_failed_tasks, 0);
        assert_eq!(stored.current_turn, session.user1_id);
    }

    #[tokio::test]
    async fn timeout_for_the_card_in_play_is_applied() {
        let state = state_with_store().await;
        seed_cards(&state, 4).await;
        let session = seed_session(&state).await;
        let card_id = session.current_card_id.unwrap();

        let response = expire_card_timeout(&state, session.id, session.user1_id, card_id)
            .await
            .unwrap();
        assert_eq!(response.failed_tasks, 1);

        let stored = reload(&state, session.id).await;
        assert_eq!(stored.current_turn, session.user2_id);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let state = state_with_store().await;
        let err = expire_turn(&state, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn degraded_mode_rejects_turn_actions() {
        let (state, _rx) = AppState::new(AppConfig::default());
        let err = expire_turn(&state, Uuid::new_v4(), Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }
}
