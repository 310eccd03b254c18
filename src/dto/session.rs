use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::{CardCategory, SessionStatus, WinReason},
    dto::format_system_time,
    state::session::{DeckCard, GameSession},
};

/// Payload used to open a session between two users.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    /// First participant.
    pub user1_id: Uuid,
    /// Second participant.
    pub user2_id: Uuid,
}

impl Validate for CreateSessionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.user1_id == self.user2_id {
            let mut error = ValidationError::new("distinct_users");
            error.message = Some("participants must be two distinct users".into());
            errors.add("user2_id", error);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Payload identifying which participant performs a turn action.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TurnActionRequest {
    /// Participant performing the action.
    pub user_id: Uuid,
}

/// Result of an authoritative turn expiration.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpireTurnResponse {
    /// Whether the expiration was applied.
    pub success: bool,
    /// Failure counter of the expired participant after the increment.
    pub failed_tasks: u8,
    /// Whether the expiration ended the match.
    pub game_ended: bool,
    /// Winner of the match, when it ended with one.
    pub winner_id: Option<Uuid>,
    /// Why the match ended, when it did.
    pub win_reason: Option<WinReason>,
}

/// Current card as embedded in a session summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentCardSummary {
    /// Stable identifier of the card.
    pub id: Uuid,
    /// Prompt category.
    pub category: CardCategory,
    /// Prompt text.
    pub prompt: String,
    /// Countdown length for this card.
    pub time_limit_seconds: u32,
    /// When the card was assigned, RFC 3339.
    pub started_at: Option<String>,
    /// Whether the turn-holder revealed the card.
    pub revealed: bool,
    /// Whether the card has been completed.
    pub completed: bool,
}

/// Full session snapshot exposed to clients and SSE subscribers.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionSummary {
    /// Primary key of the session.
    pub id: Uuid,
    /// First participant.
    pub user1_id: Uuid,
    /// Second participant.
    pub user2_id: Uuid,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Participant expected to act.
    pub current_turn: Uuid,
    /// Card currently assigned, when one is.
    pub current_card: Option<CurrentCardSummary>,
    /// Expired-turn count for participant 1.
    pub user1_failed_tasks: u8,
    /// Expired-turn count for participant 2.
    pub user2_failed_tasks: u8,
    /// Skips participant 1 may still use.
    pub user1_skips_remaining: u8,
    /// Skips participant 2 may still use.
    pub user2_skips_remaining: u8,
    /// Winner of a completed session.
    pub winner_id: Option<Uuid>,
    /// Reason the session completed.
    pub win_reason: Option<WinReason>,
    /// When the session completed, RFC 3339.
    pub completed_at: Option<String>,
    /// Number of cards drawn so far.
    pub total_cards_played: u32,
    /// When the session was created, RFC 3339.
    pub created_at: String,
    /// Last authoritative mutation, RFC 3339.
    pub last_activity_at: String,
}

impl SessionSummary {
    /// Build a snapshot from the runtime session and its current card.
    ///
    /// `card` is the deck card matching `session.current_card_id`; it is
    /// ignored when the session has no assigned card.
    pub fn from_session(session: &GameSession, card: Option<&DeckCard>) -> Self {
        let current_card = session.current_card_id.and_then(|card_id| {
            let card = card.filter(|card| card.id == card_id)?;
            Some(CurrentCardSummary {
                id: card.id,
                category: card.category,
                prompt: card.prompt.clone(),
                time_limit_seconds: card.time_limit_seconds,
                started_at: session.current_card_started_at.map(format_system_time),
                revealed: session.current_card_revealed,
                completed: session.current_card_completed,
            })
        });

        Self {
            id: session.id,
            user1_id: session.user1_id,
            user2_id: session.user2_id,
            status: session.status,
            current_turn: session.current_turn,
            current_card,
            user1_failed_tasks: session.user1_failed_tasks,
            user2_failed_tasks: session.user2_failed_tasks,
            user1_skips_remaining: session.user1_skips_remaining,
            user2_skips_remaining: session.user2_skips_remaining,
            winner_id: session.winner_id,
            win_reason: session.win_reason,
            completed_at: session.completed_at.map(format_system_time),
            total_cards_played: session.total_cards_played,
            created_at: format_system_time(session.created_at),
            last_activity_at: format_system_time(session.last_activity_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::config::GameRules;

    #[test]
    fn identical_participants_fail_validation() {
        let user = Uuid::new_v4();
        let request = CreateSessionRequest {
            user1_id: user,
            user2_id: user,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn distinct_participants_pass_validation() {
        let request = CreateSessionRequest {
            user1_id: Uuid::new_v4(),
            user2_id: Uuid::new_v4(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn summary_embeds_the_matching_card() {
        let now = SystemTime::now();
        let mut session =
            GameSession::new(Uuid::new_v4(), Uuid::new_v4(), &GameRules::default(), now);
        let card = DeckCard {
            id: Uuid::new_v4(),
            category: CardCategory::Text,
            prompt: "share a favorite memory".into(),
            time_limit_seconds: 120,
        };
        session.assign_card(&card, now);

        let summary = SessionSummary::from_session(&session, Some(&card));
        let embedded = summary.current_card.expect("card should be embedded");
        assert_eq!(embedded.id, card.id);
        assert_eq!(embedded.time_limit_seconds, 120);
        assert!(embedded.started_at.is_some());
    }

    #[test]
    fn summary_without_card_has_no_current_card() {
        let session = GameSession::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &GameRules::default(),
            SystemTime::now(),
        );
        let summary = SessionSummary::from_session(&session, None);
        assert!(summary.current_card.is_none());
    }
}
