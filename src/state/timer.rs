//! Server-side turn countdowns, owned and scoped.
//!
//! A [`TurnTimer`] owns the tokio task driving one countdown; dropping the
//! handle aborts the task, so a timer can never outlive its registration.
//! Expiry is signalled as a [`TimerFired`] message exactly once per armed
//! timer; re-arming a session replaces (and thereby cancels) the previous
//! countdown.

use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use uuid::Uuid;

/// Message emitted when a turn countdown ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Session whose turn expired.
    pub session_id: Uuid,
    /// Turn-holder on whose behalf the expiration will be applied.
    pub user_id: Uuid,
    /// Card whose countdown ran out; a fire is stale once the card in play
    /// changed.
    pub card_id: Uuid,
}

/// Handle owning one running countdown task.
pub struct TurnTimer {
    paused: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl TurnTimer {
    /// Spawn a countdown of `seconds` that emits `TimerFired` on `tx` after an
    /// additional `grace` delay once it reaches zero.
    pub fn arm(
        session_id: Uuid,
        user_id: Uuid,
        card_id: Uuid,
        seconds: u32,
        grace: Duration,
        tx: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        let (paused, paused_rx) = watch::channel(false);
        let fired = TimerFired {
            session_id,
            user_id,
            card_id,
        };
        let handle = tokio::spawn(run_countdown(seconds, grace, paused_rx, tx, fired));
        Self { paused, handle }
    }

    /// Suspend the countdown; elapsed seconds are kept.
    pub fn pause(&self) {
        let _ = self.paused.send(true);
    }

    /// Resume a paused countdown.
    pub fn resume(&self) {
        let _ = self.paused.send(false);
    }
}

impl Drop for TurnTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn run_countdown(
    seconds: u32,
    grace: Duration,
    mut paused: watch::Receiver<bool>,
    tx: mpsc::UnboundedSender<TimerFired>,
    fired: TimerFired,
) {
    let mut remaining = seconds;
    while remaining > 0 {
        if *paused.borrow() {
            // Parked until the pause flag flips; the owner aborting us is the
            // only other way out.
            if paused.changed().await.is_err() {
                return;
            }
            continue;
        }
        sleep(Duration::from_secs(1)).await;
        remaining -= 1;
    }

    // Short settling window so an in-flight completion can win the race.
    sleep(grace).await;
    let _ = tx.send(fired);
}

/// Live countdowns keyed by session id.
pub struct TimerRegistry {
    timers: DashMap<Uuid, TurnTimer>,
    tx: mpsc::UnboundedSender<TimerFired>,
}

impl TimerRegistry {
    /// Build a registry whose timers report expiry on `tx`.
    pub fn new(tx: mpsc::UnboundedSender<TimerFired>) -> Self {
        Self {
            timers: DashMap::new(),
            tx,
        }
    }

    /// Arm (or replace) the countdown for a session's current turn.
    pub fn arm(&self, session_id: Uuid, user_id: Uuid, card_id: Uuid, seconds: u32, grace: Duration) {
        let timer = TurnTimer::arm(session_id, user_id, card_id, seconds, grace, self.tx.clone());
        self.timers.insert(session_id, timer);
    }

    /// Cancel the countdown for a session, if one is running.
    pub fn cancel(&self, session_id: Uuid) {
        self.timers.remove(&session_id);
    }

    /// Whether a countdown is currently armed for the session.
    pub fn is_armed(&self, session_id: Uuid) -> bool {
        self.timers.contains_key(&session_id)
    }

    /// Suspend every countdown (used while storage is unavailable).
    pub fn pause_all(&self) {
        for entry in self.timers.iter() {
            entry.value().pause();
        }
    }

    /// Resume every suspended countdown.
    pub fn resume_all(&self) {
        for entry in self.timers.iter() {
            entry.value().resume();
        }
    }
}
