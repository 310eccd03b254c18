//! Consumes countdown expirations and restores timers after a restart.

use std::time::SystemTime;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    error::ServiceError,
    services::turn_service,
    state::{SharedState, session::GameSession, timer::TimerFired},
};

/// Apply every countdown expiration as an authoritative turn failure.
///
/// Runs for the lifetime of the process. An expiration that loses the race
/// against a client action fails its card-in-play or turn-holder check and
/// is dropped.
pub async fn run_expiry_dispatcher(
    state: SharedState,
    mut expirations: mpsc::UnboundedReceiver<TimerFired>,
) {
    while let Some(fired) = expirations.recv().await {
        match turn_service::expire_card_timeout(
            &state,
            fired.session_id,
            fired.user_id,
            fired.card_id,
        )
        .await
        {
            Ok(response) => {
                info!(
                    session_id = %fired.session_id,
                    user_id = %fired.user_id,
                    failed_tasks = response.failed_tasks,
                    game_ended = response.game_ended,
                    "turn expired"
                );
            }
            Err(ServiceError::NotYourTurn { .. } | ServiceError::InvalidState(_)) => {
                debug!(
                    session_id = %fired.session_id,
                    "expiry arrived after the turn already advanced"
                );
            }
            Err(err) => {
                warn!(
                    session_id = %fired.session_id,
                    error = %err,
                    "failed to apply turn expiration"
                );
            }
        }
    }
}

/// Re-arm countdowns for every active session with a card in play.
///
/// Called after the storage backend comes up. Elapsed wall-clock time counts
/// against the remaining window; an already-overdue card expires right away.
/// Sessions whose timer survived in memory are left alone.
pub async fn rearm_active_sessions(state: &SharedState) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    let sessions = store.list_active_sessions().await?;
    let grace = state.config().expiry_grace();

    let mut rearmed = 0usize;
    for entity in sessions {
        let session: GameSession = entity.into();
        if state.timers().is_armed(session.id) {
            continue;
        }
        let Some(card_id) = session.current_card_id else {
            continue;
        };
        let Some(started_at) = session.current_card_started_at else {
            continue;
        };
        let Some(card) = store.find_card(card_id).await? else {
            warn!(
                session_id = %session.id,
                %card_id,
                "active session references an unknown card; skipping its timer"
            );
            continue;
        };

        let elapsed = SystemTime::now()
            .duration_since(started_at)
            .unwrap_or_default()
            .as_secs();
        let remaining = u64::from(card.time_limit_seconds).saturating_sub(elapsed) as u32;

        state
            .timers()
            .arm(session.id, session.current_turn, card_id, remaining, grace);
        rearmed += 1;
    }

    info!(count = rearmed, "re-armed turn countdowns");
    Ok(())
}
