//! In-memory [`GameStore`] used by tests and store-less local runs.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::game_store::GameStore;
use crate::dao::models::{DeckCardEntity, SessionEntity, SessionStatus};
use crate::dao::storage::StorageResult;

/// Process-local store backed by concurrent maps. Everything is lost on restart.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    sessions: DashMap<Uuid, SessionEntity>,
    cards: DashMap<Uuid, DeckCardEntity>,
}

impl MemoryGameStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn candidates(&self, exclude: &HashSet<Uuid>, limit: usize) -> Vec<DeckCardEntity> {
        let mut matching: Vec<DeckCardEntity> = self
            .inner
            .cards
            .iter()
            .filter(|entry| entry.is_active && !exclude.contains(&entry.id))
            .map(|entry| entry.value().clone())
            .collect();

        // Deterministic order so bounded queries behave the same across runs.
        matching.sort_unstable_by_key(|card| card.id);
        matching.truncate(limit);
        matching
    }
}

impl GameStore for MemoryGameStore {
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.sessions.insert(session.id, session);
            Ok(())
        })
    }

    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.sessions.get(&id).map(|s| s.value().clone())) })
    }

    fn list_active_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .inner
                .sessions
                .iter()
                .filter(|entry| entry.status == SessionStatus::Active)
                .map(|entry| entry.value().clone())
                .collect())
        })
    }

    fn save_card(&self, card: DeckCardEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.inner.cards.insert(card.id, card);
            Ok(())
        })
    }

    fn find_card(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DeckCardEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.inner.cards.get(&id).map(|c| c.value().clone())) })
    }

    fn list_candidate_cards(
        &self,
        exclude: Vec<Uuid>,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<DeckCardEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let exclude: HashSet<Uuid> = exclude.into_iter().collect();
            Ok(store.candidates(&exclude, limit))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::CardCategory;

    fn card(active: bool) -> DeckCardEntity {
        DeckCardEntity {
            id: Uuid::new_v4(),
            category: CardCategory::Action,
            prompt: "cook dinner together".into(),
            time_limit_seconds: 60,
            is_active: active,
        }
    }

    #[tokio::test]
    async fn candidate_listing_skips_excluded_and_inactive_cards() {
        let store = MemoryGameStore::new();
        let played = card(true);
        let inactive = card(false);
        let fresh = card(true);

        for c in [played.clone(), inactive.clone(), fresh.clone()] {
            store.save_card(c).await.unwrap();
        }

        let candidates = store
            .list_candidate_cards(vec![played.id], 10)
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, fresh.id);
    }

    #[tokio::test]
    async fn candidate_listing_honours_the_limit() {
        let store = MemoryGameStore::new();
        for _ in 0..8 {
            store.save_card(card(true)).await.unwrap();
        }

        let candidates = store.list_candidate_cards(Vec::new(), 5).await.unwrap();
        assert_eq!(candidates.len(), 5);
    }

    #[tokio::test]
    async fn find_session_returns_none_for_unknown_id() {
        let store = MemoryGameStore::new();
        assert!(store.find_session(Uuid::new_v4()).await.unwrap().is_none());
    }
}
