use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::card::{CardSummary, CreateCardRequest},
    error::AppError,
    services::deck_service,
    state::SharedState,
};

/// Routes handling deck card management.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/cards", post(create_card))
        .route("/cards/{id}", get(get_card))
}

/// Add a card to the deck.
#[utoipa::path(
    post,
    path = "/cards",
    tag = "deck",
    request_body = CreateCardRequest,
    responses(
        (status = 200, description = "Card created", body = CardSummary),
        (status = 400, description = "Invalid prompt or time limit"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_card(
    State(state): State<SharedState>,
    Json(payload): Json<CreateCardRequest>,
) -> Result<Json<CardSummary>, AppError> {
    payload.validate()?;
    let summary = deck_service::add_card(&state, payload).await?;
    Ok(Json(summary))
}

/// Fetch a deck card by id.
#[utoipa::path(
    get,
    path = "/cards/{id}",
    tag = "deck",
    params(("id" = Uuid, Path, description = "Identifier of the card")),
    responses(
        (status = 200, description = "Card found", body = CardSummary),
        (status = 404, description = "Unknown card")
    )
)]
pub async fn get_card(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CardSummary>, AppError> {
    let summary = deck_service::get_card(&state, id).await?;
    Ok(Json(summary))
}
