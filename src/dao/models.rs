//! Entities shared between the storage backends and the runtime state.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a game session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// The match is in progress; turn and card fields may mutate.
    Active,
    /// Terminal state; the session is permanently read-only.
    Completed,
}

/// Why a session reached its terminal state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    /// A participant accumulated the maximum number of expired turns.
    FailedTasks,
    /// A participant attempted to skip with no skips remaining.
    NoSkips,
    /// The deck ran out of cards; the match ended without a loser.
    Completed,
}

/// Category of a deck card prompt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardCategory {
    /// The turn-holder performs something for their partner.
    Action,
    /// The turn-holder sends a written answer.
    Text,
    /// The turn-holder takes and shares a photo.
    Photo,
}

/// Persisted representation of a two-participant game session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntity {
    /// Primary key of the session.
    pub id: Uuid,
    /// First participant.
    pub user1_id: Uuid,
    /// Second participant.
    pub user2_id: Uuid,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Participant expected to act before their timer expires.
    pub current_turn: Uuid,
    /// Card currently assigned to the turn-holder, if any.
    pub current_card_id: Option<Uuid>,
    /// When the current card was drawn.
    pub current_card_started_at: Option<SystemTime>,
    /// Whether the turn-holder revealed the current card.
    pub current_card_revealed: bool,
    /// Whether the current card has been completed.
    pub current_card_completed: bool,
    /// Expired-turn count for participant 1.
    pub user1_failed_tasks: u8,
    /// Expired-turn count for participant 2.
    pub user2_failed_tasks: u8,
    /// Skips participant 1 may still use.
    pub user1_skips_remaining: u8,
    /// Skips participant 2 may still use.
    pub user2_skips_remaining: u8,
    /// Winner of a completed session, when one exists.
    pub winner_id: Option<Uuid>,
    /// Reason the session completed.
    pub win_reason: Option<WinReason>,
    /// When the session completed.
    pub completed_at: Option<SystemTime>,
    /// Ordered, append-only list of every card id drawn in this session.
    pub played_cards: Vec<Uuid>,
    /// Number of cards drawn so far.
    pub total_cards_played: u32,
    /// When the session was created.
    pub created_at: SystemTime,
    /// Last authoritative mutation.
    pub last_activity_at: SystemTime,
}

/// Persisted deck card. Reference data, never mutated by gameplay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeckCardEntity {
    /// Primary key of the card.
    pub id: Uuid,
    /// Prompt category.
    pub category: CardCategory,
    /// Prompt text shown to the turn-holder.
    pub prompt: String,
    /// Countdown length attached to this card.
    pub time_limit_seconds: u32,
    /// Inactive cards are excluded from every draw.
    pub is_active: bool,
}
