//! Storage backends for sessions and deck cards.

pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{DeckCardEntity, SessionEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for game sessions and the card deck.
pub trait GameStore: Send + Sync {
    /// Upsert a session row.
    fn save_session(&self, session: SessionEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a session by id.
    fn find_session(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<SessionEntity>>>;
    /// List every session still in the active state (used to re-arm turn timers).
    fn list_active_sessions(&self) -> BoxFuture<'static, StorageResult<Vec<SessionEntity>>>;
    /// Upsert a deck card.
    fn save_card(&self, card: DeckCardEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a deck card by id.
    fn find_card(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<DeckCardEntity>>>;
    /// Return up to `limit` active cards whose ids are not in `exclude`.
    fn list_candidate_cards(
        &self,
        exclude: Vec<Uuid>,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<DeckCardEntity>>>;
    /// Cheap connectivity probe.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Attempt to re-establish a broken backend connection.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
