use mongodb::bson::{Binary, DateTime, Document, doc, spec::BinarySubtype};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{CardCategory, DeckCardEntity, SessionEntity, SessionStatus, WinReason};

/// Session document as stored in the `sessions` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSessionDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    user1_id: Uuid,
    user2_id: Uuid,
    status: SessionStatus,
    current_turn: Uuid,
    current_card_id: Option<Uuid>,
    current_card_started_at: Option<DateTime>,
    current_card_revealed: bool,
    current_card_completed: bool,
    user1_failed_tasks: u8,
    user2_failed_tasks: u8,
    user1_skips_remaining: u8,
    user2_skips_remaining: u8,
    winner_id: Option<Uuid>,
    win_reason: Option<WinReason>,
    completed_at: Option<DateTime>,
    played_cards: Vec<Uuid>,
    total_cards_played: u32,
    created_at: DateTime,
    last_activity_at: DateTime,
}

impl From<SessionEntity> for MongoSessionDocument {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            user1_id: value.user1_id,
            user2_id: value.user2_id,
            status: value.status,
            current_turn: value.current_turn,
            current_card_id: value.current_card_id,
            current_card_started_at: value
                .current_card_started_at
                .map(DateTime::from_system_time),
            current_card_revealed: value.current_card_revealed,
            current_card_completed: value.current_card_completed,
            user1_failed_tasks: value.user1_failed_tasks,
            user2_failed_tasks: value.user2_failed_tasks,
            user1_skips_remaining: value.user1_skips_remaining,
            user2_skips_remaining: value.user2_skips_remaining,
            winner_id: value.winner_id,
            win_reason: value.win_reason,
            completed_at: value.completed_at.map(DateTime::from_system_time),
            played_cards: value.played_cards,
            total_cards_played: value.total_cards_played,
            created_at: DateTime::from_system_time(value.created_at),
            last_activity_at: DateTime::from_system_time(value.last_activity_at),
        }
    }
}

impl From<MongoSessionDocument> for SessionEntity {
    fn from(value: MongoSessionDocument) -> Self {
        Self {
            id: value.id,
            user1_id: value.user1_id,
            user2_id: value.user2_id,
            status: value.status,
            current_turn: value.current_turn,
            current_card_id: value.current_card_id,
            current_card_started_at: value.current_card_started_at.map(|t| t.to_system_time()),
            current_card_revealed: value.current_card_revealed,
            current_card_completed: value.current_card_completed,
            user1_failed_tasks: value.user1_failed_tasks,
            user2_failed_tasks: value.user2_failed_tasks,
            user1_skips_remaining: value.user1_skips_remaining,
            user2_skips_remaining: value.user2_skips_remaining,
            winner_id: value.winner_id,
            win_reason: value.win_reason,
            completed_at: value.completed_at.map(|t| t.to_system_time()),
            played_cards: value.played_cards,
            total_cards_played: value.total_cards_played,
            created_at: value.created_at.to_system_time(),
            last_activity_at: value.last_activity_at.to_system_time(),
        }
    }
}

/// Deck card document as stored in the `cards` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoDeckCardDocument {
    #[serde(rename = "_id")]
    id: Uuid,
    category: CardCategory,
    prompt: String,
    time_limit_seconds: u32,
    is_active: bool,
}

impl From<DeckCardEntity> for MongoDeckCardDocument {
    fn from(value: DeckCardEntity) -> Self {
        Self {
            id: value.id,
            category: value.category,
            prompt: value.prompt,
            time_limit_seconds: value.time_limit_seconds,
            is_active: value.is_active,
        }
    }
}

impl From<MongoDeckCardDocument> for DeckCardEntity {
    fn from(value: MongoDeckCardDocument) -> Self {
        Self {
            id: value.id,
            category: value.category,
            prompt: value.prompt,
            time_limit_seconds: value.time_limit_seconds,
            is_active: value.is_active,
        }
    }
}

pub fn uuid_as_binary(id: Uuid) -> Binary {
    Binary {
        subtype: BinarySubtype::Uuid,
        bytes: id.into_bytes().to_vec(),
    }
}

pub fn doc_id(id: Uuid) -> Document {
    doc! {"_id": uuid_as_binary(id)}
}
