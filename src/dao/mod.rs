//! Persistence layer: storage abstraction, entities, and backends.

pub mod game_store;
pub mod models;
pub mod storage;
