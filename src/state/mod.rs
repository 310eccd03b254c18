//! Shared application state.

pub mod notify;
pub mod session;
pub mod timer;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock, mpsc, watch};

use crate::{
    config::AppConfig,
    dao::game_store::GameStore,
    error::ServiceError,
    state::{
        notify::SessionHub,
        timer::{TimerFired, TimerRegistry},
    },
};

/// Cheaply clonable handle to the application state.
pub type SharedState = Arc<AppState>;

const SESSION_CHANNEL_CAPACITY: usize = 16;

/// Central application state: storage handle, notification hub, and timers.
pub struct AppState {
    config: AppConfig,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    notifier: SessionHub,
    timers: TimerRegistry,
    degraded: watch::Sender<bool>,
    // Serializes authoritative session mutations so concurrent expire and
    // complete calls resolve by precondition, never by lost update.
    session_gate: Mutex<()>,
}

impl AppState {
    /// Construct the shared state along with the timer expiry receiver the
    /// dispatcher task consumes.
    ///
    /// The application starts in degraded mode until a store is installed.
    pub fn new(config: AppConfig) -> (SharedState, mpsc::UnboundedReceiver<TimerFired>) {
        let (degraded_tx, _rx) = watch::channel(true);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let state = Arc::new(Self {
            config,
            game_store: RwLock::new(None),
            notifier: SessionHub::new(SESSION_CHANNEL_CAPACITY),
            timers: TimerRegistry::new(timer_tx),
            degraded: degraded_tx,
            session_gate: Mutex::new(()),
        });

        (state, timer_rx)
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the game store or fail with a degraded-mode error.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a storage backend and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the storage backend and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Broadcast the degraded flag and pause/resume timers when it changes.
    pub async fn update_degraded(&self, value: bool) {
        if self.is_degraded().await == value {
            return;
        }

        // A turn should not be lost to a storage outage: suspend countdowns
        // while degraded and let them continue once the store is back.
        if value {
            self.timers.pause_all();
        } else {
            self.timers.resume_all();
        }

        self.degraded.send_replace(value);
    }

    /// Per-session change-notification hub.
    pub fn session_events(&self) -> &SessionHub {
        &self.notifier
    }

    /// Registry of live turn countdowns.
    pub fn timers(&self) -> &TimerRegistry {
        &self.timers
    }

    /// Acquire the gate serializing session mutations.
    pub async fn lock_sessions(&self) -> MutexGuard<'_, ()> {
        self.session_gate.lock().await
    }
}
