use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for LoveSync Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::create_session,
        crate::routes::session::get_session,
        crate::routes::session::expire_turn,
        crate::routes::session::complete_card,
        crate::routes::session::skip_card,
        crate::routes::session::reveal_card,
        crate::routes::deck::create_card,
        crate::routes::deck::get_card,
        crate::routes::sse::session_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::CreateSessionRequest,
            crate::dto::session::TurnActionRequest,
            crate::dto::session::ExpireTurnResponse,
            crate::dto::session::SessionSummary,
            crate::dto::session::CurrentCardSummary,
            crate::dto::card::CreateCardRequest,
            crate::dto::card::CardSummary,
            crate::dto::sse::GameOverEvent,
            crate::dao::models::SessionStatus,
            crate::dao::models::WinReason,
            crate::dao::models::CardCategory,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Game session lifecycle and turn actions"),
        (name = "deck", description = "Deck card management"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
