use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::session::{
        CreateSessionRequest, ExpireTurnResponse, SessionSummary, TurnActionRequest,
    },
    error::AppError,
    services::{session_service, turn_service},
    state::SharedState,
};

/// Routes handling session lifecycle and turn actions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/expire-turn", post(expire_turn))
        .route("/sessions/{id}/complete-card", post(complete_card))
        .route("/sessions/{id}/skip-card", post(skip_card))
        .route("/sessions/{id}/reveal-card", post(reveal_card))
}

/// Open a session between two users and deal the opening card.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "session",
    request_body = CreateSessionRequest,
    responses(
        (status = 200, description = "Session created", body = SessionSummary),
        (status = 400, description = "Participants are not two distinct users"),
        (status = 409, description = "The deck has no active cards"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn create_session(
    State(state): State<SharedState>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    payload.validate()?;
    let summary =
        session_service::create_session(&state, payload.user1_id, payload.user2_id).await?;
    Ok(Json(summary))
}

/// Fetch the current snapshot of a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    tag = "session",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    responses(
        (status = 200, description = "Session snapshot", body = SessionSummary),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn get_session(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = session_service::get_session(&state, id).await?;
    Ok(Json(summary))
}

/// Report that the caller's turn expired without completing the card.
#[utoipa::path(
    post,
    path = "/sessions/{id}/expire-turn",
    tag = "session",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = TurnActionRequest,
    responses(
        (status = 200, description = "Expiration applied", body = ExpireTurnResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "The caller does not hold the turn")
    )
)]
pub async fn expire_turn(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TurnActionRequest>,
) -> Result<Json<ExpireTurnResponse>, AppError> {
    let response = turn_service::expire_turn(&state, id, payload.user_id).await?;
    Ok(Json(response))
}

/// Mark the current card as completed and rotate the turn.
#[utoipa::path(
    post,
    path = "/sessions/{id}/complete-card",
    tag = "session",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = TurnActionRequest,
    responses(
        (status = 200, description = "Card completed", body = SessionSummary),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "The caller does not hold the turn")
    )
)]
pub async fn complete_card(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TurnActionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = turn_service::complete_card(&state, id, payload.user_id).await?;
    Ok(Json(summary))
}

/// Discard the current card and draw a replacement for the same turn-holder.
#[utoipa::path(
    post,
    path = "/sessions/{id}/skip-card",
    tag = "session",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = TurnActionRequest,
    responses(
        (status = 200, description = "Card skipped", body = SessionSummary),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "The caller does not hold the turn")
    )
)]
pub async fn skip_card(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TurnActionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = turn_service::skip_card(&state, id, payload.user_id).await?;
    Ok(Json(summary))
}

/// Reveal the current card to the turn-holder.
#[utoipa::path(
    post,
    path = "/sessions/{id}/reveal-card",
    tag = "session",
    params(("id" = Uuid, Path, description = "Identifier of the session")),
    request_body = TurnActionRequest,
    responses(
        (status = 200, description = "Card revealed", body = SessionSummary),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "The caller does not hold the turn")
    )
)]
pub async fn reveal_card(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TurnActionRequest>,
) -> Result<Json<SessionSummary>, AppError> {
    let summary = turn_service::reveal_card(&state, id, payload.user_id).await?;
    Ok(Json(summary))
}
