//! Deck card management and the random draw.

use rand::seq::IndexedRandom;
use uuid::Uuid;

use crate::{
    dao::models::DeckCardEntity,
    dto::card::{CardSummary, CreateCardRequest},
    error::ServiceError,
    state::{
        SharedState,
        session::{DeckCard, GameSession},
    },
};

/// Draw a random active card the session has not played yet.
///
/// Returns `None` when the deck is exhausted for this session. The draw is
/// uniform over a bounded candidate window, not over the whole deck.
pub async fn draw_card(
    state: &SharedState,
    session: &GameSession,
) -> Result<Option<DeckCard>, ServiceError> {
    let store = state.require_game_store().await?;

    let mut exclude = session.played_cards.clone();
    if let Some(current) = session.current_card_id
        && !exclude.contains(&current)
    {
        exclude.push(current);
    }

    let candidates = store
        .list_candidate_cards(exclude, state.config().draw_candidate_limit())
        .await?;

    let chosen = candidates.choose(&mut rand::rng()).cloned();
    Ok(chosen.map(DeckCard::from))
}

/// Add a card to the deck.
pub async fn add_card(
    state: &SharedState,
    request: CreateCardRequest,
) -> Result<CardSummary, ServiceError> {
    let store = state.require_game_store().await?;

    let entity = DeckCardEntity {
        id: Uuid::new_v4(),
        category: request.category,
        prompt: request.prompt,
        time_limit_seconds: request.time_limit_seconds,
        is_active: request.is_active,
    };
    store.save_card(entity.clone()).await?;

    Ok(entity.into())
}

/// Fetch a deck card by id.
pub async fn get_card(state: &SharedState, id: Uuid) -> Result<CardSummary, ServiceError> {
    let store = state.require_game_store().await?;
    let card = store
        .find_card(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("card `{id}` does not exist")))?;
    Ok(card.into())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::SystemTime;

    use super::*;
    use crate::{
        config::{AppConfig, GameRules},
        dao::{game_store::memory::MemoryGameStore, models::CardCategory},
    };

    async fn state_with_store() -> SharedState {
        let (state, _rx) = crate::state::AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new()))
            .await;
        state
    }

    fn entity(prompt: &str) -> DeckCardEntity {
        DeckCardEntity {
            id: Uuid::new_v4(),
            category: CardCategory::Action,
            prompt: prompt.into(),
            time_limit_seconds: 60,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn draw_never_returns_a_played_card() {
        let state = state_with_store().await;
        let store = state.require_game_store().await.unwrap();

        let played = entity("already played");
        let fresh = entity("fresh");
        store.save_card(played.clone()).await.unwrap();
        store.save_card(fresh.clone()).await.unwrap();

        let now = SystemTime::now();
        let mut session =
            GameSession::new(Uuid::new_v4(), Uuid::new_v4(), &GameRules::default(), now);
        session.played_cards.push(played.id);

        for _ in 0..20 {
            let drawn = draw_card(&state, &session).await.unwrap().unwrap();
            assert_eq!(drawn.id, fresh.id);
        }
    }

    #[tokio::test]
    async fn draw_excludes_the_current_card() {
        let state = state_with_store().await;
        let store = state.require_game_store().await.unwrap();

        let current = entity("current");
        store.save_card(current.clone()).await.unwrap();

        let now = SystemTime::now();
        let mut session =
            GameSession::new(Uuid::new_v4(), Uuid::new_v4(), &GameRules::default(), now);
        session.assign_card(&current.clone().into(), now);

        let drawn = draw_card(&state, &session).await.unwrap();
        assert!(drawn.is_none());
    }

    #[tokio::test]
    async fn draw_on_an_empty_deck_returns_none() {
        let state = state_with_store().await;
        let session = GameSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &GameRules::default(),
            SystemTime::now(),
        );
        assert!(draw_card(&state, &session).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn added_card_can_be_fetched_back() {
        let state = state_with_store().await;
        let summary = add_card(
            &state,
            CreateCardRequest {
                category: CardCategory::Photo,
                prompt: "take a photo of your view".into(),
                time_limit_seconds: 300,
                is_active: true,
            },
        )
        .await
        .unwrap();

        let fetched = get_card(&state, summary.id).await.unwrap();
        assert_eq!(fetched.prompt, "take a photo of your view");
        assert_eq!(fetched.time_limit_seconds, 300);
    }

    #[tokio::test]
    async fn unknown_card_is_not_found() {
        let state = state_with_store().await;
        let err = get_card(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }
}
