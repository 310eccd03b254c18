use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dao::models::{CardCategory, DeckCardEntity};

/// Payload used to add a card to the deck.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateCardRequest {
    /// Prompt category.
    pub category: CardCategory,
    /// Prompt text shown to the turn-holder.
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
    /// Countdown length attached to this card.
    #[validate(range(min = 1, message = "time limit must be strictly positive"))]
    pub time_limit_seconds: u32,
    /// Whether the card participates in draws. Defaults to true.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

/// Deck card projection exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct CardSummary {
    /// Stable identifier of the card.
    pub id: Uuid,
    /// Prompt category.
    pub category: CardCategory,
    /// Prompt text.
    pub prompt: String,
    /// Countdown length.
    pub time_limit_seconds: u32,
    /// Whether the card participates in draws.
    pub is_active: bool,
}

impl From<DeckCardEntity> for CardSummary {
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
