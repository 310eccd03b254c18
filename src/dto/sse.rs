use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::WinReason;

/// Event pushed to session subscribers over the SSE stream.
#[derive(Debug, Clone)]
pub struct ServerEvent {
    /// SSE event name, when the event is typed.
    pub event: Option<String>,
    /// Serialized event payload.
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already-serialized payload.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }

    /// Build a typed event by serializing `payload` as JSON.
    pub fn json<T: Serialize>(event: &str, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            event: Some(event.to_string()),
            data: serde_json::to_string(payload)?,
        })
    }
}

/// Terminal payload broadcast when a session ends.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameOverEvent {
    /// Identifier of the session that ended.
    pub session_id: Uuid,
    /// Winner of the session, when one exists.
    pub winner_id: Option<Uuid>,
    /// Why the session ended.
    pub win_reason: WinReason,
}
