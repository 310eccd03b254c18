//! Runtime session model and the pure turn state machine.
//!
//! Every gameplay mutation goes through the typed transitions here; the
//! service layer only adds persistence, deck draws, and notifications around
//! them. A failing transition leaves the session untouched.

use std::time::SystemTime;

use thiserror::Error;
use uuid::Uuid;

use crate::config::GameRules;
use crate::dao::models::{CardCategory, DeckCardEntity, SessionEntity, SessionStatus, WinReason};

/// Which of the two participant slots a user occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    /// The user stored in `user1_id`.
    One,
    /// The user stored in `user2_id`.
    Two,
}

impl Participant {
    /// The opposite slot.
    pub fn other(self) -> Self {
        match self {
            Participant::One => Participant::Two,
            Participant::Two => Participant::One,
        }
    }
}

/// Error returned when a turn transition cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The session already reached a terminal state.
    #[error("session is already completed")]
    SessionCompleted,
    /// The supplied user is neither participant of the session.
    #[error("user `{user_id}` is not a participant of this session")]
    NotParticipant {
        /// Identifier the caller supplied.
        user_id: Uuid,
    },
    /// The supplied user is a participant but does not hold the turn.
    #[error("user `{user_id}` does not hold the current turn")]
    NotYourTurn {
        /// Identifier the caller supplied.
        user_id: Uuid,
    },
    /// The operation requires a currently assigned card.
    #[error("no card is currently assigned")]
    NoCurrentCard,
}

/// Terminal result carried by game-ending transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    /// Winner of the match, absent when the deck ran out.
    pub winner_id: Option<Uuid>,
    /// Why the match ended.
    pub reason: WinReason,
}

/// What happened to the turn after a non-failing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn rotated (or stayed, for skips); a new card must be drawn.
    AwaitingDraw,
    /// The session reached a terminal state.
    Ended(GameOver),
}

/// Result of applying a turn expiration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnExpiry {
    /// Failure counter of the expiring participant after the increment.
    pub failed_tasks: u8,
    /// Whether play continues or the match ended.
    pub outcome: TurnOutcome,
}

/// Result of a skip attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// The card was discarded; the same participant draws a replacement.
    Skipped {
        /// Skips the participant has left after this one.
        skips_remaining: u8,
    },
    /// The participant was out of skips; the match ended against them.
    Ended(GameOver),
}

/// Runtime card handed to the turn-holder. Inactive cards never reach this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckCard {
    /// Stable identifier of the card.
    pub id: Uuid,
    /// Prompt category.
    pub category: CardCategory,
    /// Prompt text.
    pub prompt: String,
    /// Countdown length for this card.
    pub time_limit_seconds: u32,
}

impl From<DeckCardEntity> for DeckCard {
    fn from(value: DeckCardEntity) -> Self {
        Self {
            id: value.id,
            category: value.category,
            prompt: value.prompt,
            time_limit_seconds: value.time_limit_seconds,
        }
    }
}

/// In-memory state of a two-participant card game match.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSession {
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
    /// Card currently assigned to the turn-holder.
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
    /// Winner of a completed session.
    pub winner_id: Option<Uuid>,
    /// Reason the session completed.
    pub win_reason: Option<WinReason>,
    /// When the session completed.
    pub completed_at: Option<SystemTime>,
    /// Ordered, append-only list of every drawn card id.
    pub played_cards: Vec<Uuid>,
    /// Number of cards drawn so far.
    pub total_cards_played: u32,
    /// When the session was created.
    pub created_at: SystemTime,
    /// Last authoritative mutation.
    pub last_activity_at: SystemTime,
}

impl GameSession {
    /// Build a fresh active session. Participant 1 takes the opening turn.
    pub fn new(user1_id: Uuid, user2_id: Uuid, rules: &GameRules, now: SystemTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            user1_id,
            user2_id,
            status: SessionStatus::Active,
            current_turn: user1_id,
            current_card_id: None,
            current_card_started_at: None,
            current_card_revealed: false,
            current_card_completed: false,
            user1_failed_tasks: 0,
            user2_failed_tasks: 0,
            user1_skips_remaining: rules.initial_skips,
            user2_skips_remaining: rules.initial_skips,
            winner_id: None,
            win_reason: None,
            completed_at: None,
            played_cards: Vec::new(),
            total_cards_played: 0,
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Slot occupied by `user_id`, if they participate in this session.
    pub fn participant(&self, user_id: Uuid) -> Option<Participant> {
        if user_id == self.user1_id {
            Some(Participant::One)
        } else if user_id == self.user2_id {
            Some(Participant::Two)
        } else {
            None
        }
    }

    /// User id stored in the given slot.
    pub fn participant_id(&self, slot: Participant) -> Uuid {
        match slot {
            Participant::One => self.user1_id,
            Participant::Two => self.user2_id,
        }
    }

    /// Failure counter of the given slot.
    pub fn failed_tasks(&self, slot: Participant) -> u8 {
        match slot {
            Participant::One => self.user1_failed_tasks,
            Participant::Two => self.user2_failed_tasks,
        }
    }

    /// Remaining skips of the given slot.
    pub fn skips_remaining(&self, slot: Participant) -> u8 {
        match slot {
            Participant::One => self.user1_skips_remaining,
            Participant::Two => self.user2_skips_remaining,
        }
    }

    /// Whether the session still accepts gameplay mutations.
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Record that the caller's turn expired without completion.
    ///
    /// Increments the caller's failure counter. Reaching the configured
    /// maximum completes the match against them; otherwise the turn rotates
    /// and the caller of this method must draw a replacement card.
    pub fn expire_turn(
        &mut self,
        user_id: Uuid,
        rules: &GameRules,
        now: SystemTime,
    ) -> Result<TurnExpiry, TurnError> {
        let slot = self.ensure_turn_holder(user_id)?;

        let failed = self.failed_tasks(slot) + 1;
        match slot {
            Participant::One => self.user1_failed_tasks = failed,
            Participant::Two => self.user2_failed_tasks = failed,
        }

        let outcome = if failed >= rules.max_failed_tasks {
            let winner_id = self.participant_id(slot.other());
            self.finish(Some(winner_id), WinReason::FailedTasks, now);
            TurnOutcome::Ended(GameOver {
                winner_id: Some(winner_id),
                reason: WinReason::FailedTasks,
            })
        } else {
            self.rotate_turn(now);
            TurnOutcome::AwaitingDraw
        };

        Ok(TurnExpiry {
            failed_tasks: failed,
            outcome,
        })
    }

    /// Record that the turn-holder completed the current card.
    ///
    /// Rotates the turn; a replacement card must be drawn afterwards.
    pub fn complete_card(&mut self, user_id: Uuid, now: SystemTime) -> Result<(), TurnError> {
        self.ensure_turn_holder(user_id)?;
        if self.current_card_id.is_none() {
            return Err(TurnError::NoCurrentCard);
        }

        self.current_card_completed = true;
        self.rotate_turn(now);
        Ok(())
    }

    /// Discard the current card without completing it.
    ///
    /// The turn does not rotate; the same participant draws a replacement.
    /// Attempting a skip with none remaining completes the match against the
    /// caller with the `no_skips` reason.
    pub fn skip_card(&mut self, user_id: Uuid, now: SystemTime) -> Result<SkipOutcome, TurnError> {
        let slot = self.ensure_turn_holder(user_id)?;
        if self.current_card_id.is_none() {
            return Err(TurnError::NoCurrentCard);
        }

        if self.skips_remaining(slot) == 0 {
            let winner_id = self.participant_id(slot.other());
            self.finish(Some(winner_id), WinReason::NoSkips, now);
            return Ok(SkipOutcome::Ended(GameOver {
                winner_id: Some(winner_id),
                reason: WinReason::NoSkips,
            }));
        }

        let remaining = self.skips_remaining(slot) - 1;
        match slot {
            Participant::One => self.user1_skips_remaining = remaining,
            Participant::Two => self.user2_skips_remaining = remaining,
        }

        self.clear_card();
        self.touch(now);
        Ok(SkipOutcome::Skipped {
            skips_remaining: remaining,
        })
    }

    /// Mark the current card as revealed to the turn-holder.
    pub fn reveal_card(&mut self, user_id: Uuid, now: SystemTime) -> Result<(), TurnError> {
        self.ensure_turn_holder(user_id)?;
        if self.current_card_id.is_none() {
            return Err(TurnError::NoCurrentCard);
        }

        self.current_card_revealed = true;
        self.touch(now);
        Ok(())
    }

    /// Install a freshly drawn card and start its countdown window.
    pub fn assign_card(&mut self, card: &DeckCard, now: SystemTime) {
        self.current_card_id = Some(card.id);
        self.current_card_started_at = Some(now);
        self.current_card_revealed = false;
        self.current_card_completed = false;
        self.played_cards.push(card.id);
        self.total_cards_played += 1;
        self.touch(now);
    }

    /// Complete the session because the deck ran out of cards.
    ///
    /// Nobody failed, so there is no winner; the match simply ends.
    pub fn finish_deck_exhausted(&mut self, now: SystemTime) {
        self.finish(None, WinReason::Completed, now);
    }

    fn ensure_turn_holder(&self, user_id: Uuid) -> Result<Participant, TurnError> {
        if !self.is_active() {
            return Err(TurnError::SessionCompleted);
        }
        let slot = self
            .participant(user_id)
            .ok_or(TurnError::NotParticipant { user_id })?;
        if self.current_turn != user_id {
            return Err(TurnError::NotYourTurn { user_id });
        }
        Ok(slot)
    }

    fn rotate_turn(&mut self, now: SystemTime) {
        let holder = self
            .participant(self.current_turn)
            .unwrap_or(Participant::One);
        self.current_turn = self.participant_id(holder.other());
        self.clear_card();
        self.touch(now);
    }

    fn clear_card(&mut self) {
        self.current_card_id = None;
        self.current_card_started_at = None;
        self.current_card_revealed = false;
        self.current_card_completed = false;
    }

    fn finish(&mut self, winner_id: Option<Uuid>, reason: WinReason, now: SystemTime) {
        self.status = SessionStatus::Completed;
        self.winner_id = winner_id;
        self.win_reason = Some(reason);
        self.completed_at = Some(now);
        self.clear_card();
        self.touch(now);
    }

    fn touch(&mut self, now: SystemTime) {
        self.last_activity_at = now;
    }
}

impl From<SessionEntity> for GameSession {
    fn from(value: SessionEntity) -> Self {
        Self {
            id: value.id,
            user1_id: value.user1_id,
            user2_id: value.user2_id,
            status: value.status,
            current_turn: value.current_turn,
            current_card_id: value.current_card_id,
            current_card_started_at: value.current_card_started_at,
            current_card_revealed: value.current_card_revealed,
            current_card_completed: value.current_card_completed,
            user1_failed_tasks: value.user1_failed_tasks,
            user2_failed_tasks: value.user2_failed_tasks,
            user1_skips_remaining: value.user1_skips_remaining,
            user2_skips_remaining: value.user2_skips_remaining,
            winner_id: value.winner_id,
            win_reason: value.win_reason,
            completed_at: value.completed_at,
            played_cards: value.played_cards,
            total_cards_played: value.total_cards_played,
            created_at: value.created_at,
            last_activity_at: value.last_activity_at,
        }
    }
}

impl From<GameSession> for SessionEntity {
    fn from(value: GameSession) -> Self {
        Self {
            id: value.id,
            user1_id: value.user1_id,
            user2_id: value.user2_id,
            status: value.status,
            current_turn: value.current_turn,
            current_card_id: value.current_card_id,
            current_card_started_at: value.current_card_started_at,
            current_card_revealed: value.current_card_revealed,
            current_card_completed: value.current_card_completed,
            user1_failed_tasks: value.user1_failed_tasks,
            user2_failed_tasks: value.user2_failed_tasks,
            user1_skips_remaining: value.user1_skips_remaining,
            user2_skips_remaining: value.user2_skips_remaining,
            winner_id: value.winner_id,
            win_reason: value.win_reason,
            completed_at: value.completed_at,
            played_cards: value.played_cards,
            total_cards_played: value.total_cards_played,
            created_at: value.created_at,
            last_activity_at: value.last_activity_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> GameRules {
        GameRules::default()
    }

    fn card(seconds: u32) -> DeckCard {
        DeckCard {
            id: Uuid::new_v4(),
            category: CardCategory::Action,
            prompt: "write a note for your partner".into(),
            time_limit_seconds: seconds,
        }
    }

    fn session_with_card() -> GameSession {
        let now = SystemTime::now();
        let mut session = GameSession::new(Uuid::new_v4(), Uuid::new_v4(), &rules(), now);
        session.assign_card(&card(60), now);
        session
    }

    #[test]
    fn new_session_gives_the_opening_turn_to_user1() {
        let session = GameSession::new(Uuid::new_v4(), Uuid::new_v4(), &rules(), SystemTime::now());
        assert_eq!(session.status, SessionStatus::Active);
        assert_eq!(session.current_turn, session.user1_id);
        assert_eq!(session.user1_skips_remaining, 3);
        assert_eq!(session.user2_skips_remaining, 3);
        assert!(session.played_cards.is_empty());
    }

    #[test]
    fn assign_card_appends_to_played_cards() {
        let now = SystemTime::now();
        let mut session = GameSession::new(Uuid::new_v4(), Uuid::new_v4(), &rules(), now);
        let first = card(30);
        session.assign_card(&first, now);

        assert_eq!(session.current_card_id, Some(first.id));
        assert_eq!(session.played_cards, vec![first.id]);
        assert_eq!(session.total_cards_played, 1);
        assert!(session.current_card_started_at.is_some());
        assert!(!session.current_card_revealed);
    }

    #[test]
    fn non_terminal_expiration_rotates_the_turn() {
        let mut session = session_with_card();
        let user1 = session.user1_id;
        let user2 = session.user2_id;

        let expiry = session
            .expire_turn(user1, &rules(), SystemTime::now())
            .unwrap();

        assert_eq!(expiry.failed_tasks, 1);
        assert_eq!(expiry.outcome, TurnOutcome::AwaitingDraw);
        assert_eq!(session.current_turn, user2);
        assert_eq!(session.status, SessionStatus::Active);
        assert!(session.current_card_id.is_none());
        assert!(session.current_card_started_at.is_none());
    }

    #[test]
    fn third_expiration_completes_the_match_against_the_failer() {
        let mut session = session_with_card();
        session.user1_failed_tasks = 2;
        let user1 = session.user1_id;
        let user2 = session.user2_id;

        let expiry = session
            .expire_turn(user1, &rules(), SystemTime::now())
            .unwrap();

        assert_eq!(expiry.failed_tasks, 3);
        assert_eq!(
            expiry.outcome,
            TurnOutcome::Ended(GameOver {
                winner_id: Some(user2),
                reason: WinReason::FailedTasks,
            })
        );
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.winner_id, Some(user2));
        assert_eq!(session.win_reason, Some(WinReason::FailedTasks));
        assert!(session.completed_at.is_some());
        assert!(session.current_card_id.is_none());
        // The loser's counter is 3 while the winner's stayed untouched.
        assert_eq!(session.user1_failed_tasks, 3);
        assert_eq!(session.user2_failed_tasks, 0);
    }

    #[test]
    fn expiration_by_the_wrong_user_leaves_the_session_unchanged() {
        let mut session = session_with_card();
        let user2 = session.user2_id;
        let before = session.clone();

        let err = session
            .expire_turn(user2, &rules(), SystemTime::now())
            .unwrap_err();

        assert_eq!(err, TurnError::NotYourTurn { user_id: user2 });
        assert_eq!(session, before);
    }

    #[test]
    fn expiration_by_a_stranger_is_rejected() {
        let mut session = session_with_card();
        let stranger = Uuid::new_v4();
        let before = session.clone();

        let err = session
            .expire_turn(stranger, &rules(), SystemTime::now())
            .unwrap_err();

        assert_eq!(err, TurnError::NotParticipant { user_id: stranger });
        assert_eq!(session, before);
    }

    #[test]
    fn completed_session_rejects_further_transitions() {
        let mut session = session_with_card();
        session.user1_failed_tasks = 2;
        let user1 = session.user1_id;
        session
            .expire_turn(user1, &rules(), SystemTime::now())
            .unwrap();

        let before = session.clone();
        let err = session
            .expire_turn(session.user2_id, &rules(), SystemTime::now())
            .unwrap_err();
        assert_eq!(err, TurnError::SessionCompleted);
        assert_eq!(session, before);
    }

    #[test]
    fn complete_card_rotates_without_touching_failure_counters() {
        let mut session = session_with_card();
        let user1 = session.user1_id;
        let user2 = session.user2_id;

        session.complete_card(user1, SystemTime::now()).unwrap();

        assert_eq!(session.current_turn, user2);
        assert_eq!(session.user1_failed_tasks, 0);
        assert!(session.current_card_id.is_none());
    }

    #[test]
    fn complete_card_requires_an_assigned_card() {
        let now = SystemTime::now();
        let mut session = GameSession::new(Uuid::new_v4(), Uuid::new_v4(), &rules(), now);
        let err = session.complete_card(session.user1_id, now).unwrap_err();
        assert_eq!(err, TurnError::NoCurrentCard);
    }

    #[test]
    fn skip_decrements_and_keeps_the_turn() {
        let mut session = session_with_card();
        let user1 = session.user1_id;

        let outcome = session.skip_card(user1, SystemTime::now()).unwrap();

        assert_eq!(outcome, SkipOutcome::Skipped { skips_remaining: 2 });
        assert_eq!(session.current_turn, user1);
        assert!(session.current_card_id.is_none());
    }

    #[test]
    fn skip_with_none_remaining_ends_the_match() {
        let mut session = session_with_card();
        session.user1_skips_remaining = 0;
        let user1 = session.user1_id;
        let user2 = session.user2_id;

        let outcome = session.skip_card(user1, SystemTime::now()).unwrap();

        assert_eq!(
            outcome,
            SkipOutcome::Ended(GameOver {
                winner_id: Some(user2),
                reason: WinReason::NoSkips,
            })
        );
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.winner_id, Some(user2));
    }

    #[test]
    fn reveal_marks_the_current_card() {
        let mut session = session_with_card();
        let user1 = session.user1_id;

        session.reveal_card(user1, SystemTime::now()).unwrap();
        assert!(session.current_card_revealed);
    }

    #[test]
    fn deck_exhaustion_completes_without_a_winner() {
        let mut session = session_with_card();
        let user1 = session.user1_id;
        session
            .expire_turn(user1, &rules(), SystemTime::now())
            .unwrap();

        session.finish_deck_exhausted(SystemTime::now());

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.winner_id, None);
        assert_eq!(session.win_reason, Some(WinReason::Completed));
    }

    #[test]
    fn entity_round_trip_preserves_every_field() {
        let mut session = session_with_card();
        session.user2_failed_tasks = 1;
        session.user1_skips_remaining = 2;

        let entity: SessionEntity = session.clone().into();
        let back: GameSession = entity.into();
        assert_eq!(back, session);
    }
}
