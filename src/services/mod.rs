//! Service layer orchestrating storage, timers, and change notifications.

pub mod deck_service;
pub mod documentation;
pub mod health_service;
pub mod session_service;
pub mod sse_events;
pub mod sse_service;
#[cfg(feature = "mongo-store")]
pub mod storage_supervisor;
pub mod timer_service;
pub mod turn_service;
