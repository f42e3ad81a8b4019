//! Thin HTTP surface over the domain services.
//!
//! The handlers translate between JSON and the typed service results; they
//! carry no ledger logic. User-facing wording belongs to whichever front-end
//! consumes this API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use crate::domain::{
    IgnoreReason, LedgerError, LedgerService, ParseMode, ProcessOutcome, RegistrationService,
    RejectReason,
};
use shared::{
    BalanceResponse, ChatListResponse, ProcessMessageRequest, ProcessMessageResponse,
    RegisterChatRequest, RegisterChatResponse, RegisterUserRequest, RegisterUserResponse,
};

/// Application state containing the domain services
#[derive(Clone)]
pub struct AppState {
    pub ledger_service: LedgerService,
    pub registration_service: RegistrationService,
}

impl AppState {
    pub fn new(ledger_service: LedgerService, registration_service: RegistrationService) -> Self {
        Self { ledger_service, registration_service }
    }
}

/// Create the Axum router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/messages", post(process_message))
        .route("/inline-queries", post(process_inline_query))
        .route("/chats", post(register_chat))
        .route("/chats/:group_id/balance", get(get_chat_balance))
        .route("/users", post(register_user))
        .route("/users/:user_id/chats", get(list_user_chats));

    Router::new().nest("/api", api_routes).with_state(state)
}

fn error_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::ChatNotFound(_) => StatusCode::NOT_FOUND,
        LedgerError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn ignore_label(reason: IgnoreReason) -> &'static str {
    match reason {
        IgnoreReason::NoMatch => "no_match",
        IgnoreReason::Unsafe(RejectReason::SeparatorOnly) => "separator_only",
        IgnoreReason::Unsafe(RejectReason::ContainsUrl) => "url",
        IgnoreReason::Unsafe(RejectReason::SqlPattern) => "sql_pattern",
    }
}

async fn handle_message(
    state: AppState,
    request: ProcessMessageRequest,
    mode: ParseMode,
) -> Response {
    let result = state
        .ledger_service
        .process_message(request.user_id, request.group_id, &request.text, mode)
        .await;

    match result {
        Ok(ProcessOutcome::Applied { new_balance }) => (
            StatusCode::OK,
            Json(ProcessMessageResponse {
                applied: true,
                new_balance: Some(new_balance),
                ignored_reason: None,
            }),
        )
            .into_response(),
        Ok(ProcessOutcome::Ignored(reason)) => (
            StatusCode::OK,
            Json(ProcessMessageResponse {
                applied: false,
                new_balance: None,
                ignored_reason: Some(ignore_label(reason).to_string()),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error processing message: {:?}", e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

/// Axum handler function for POST /api/messages
pub async fn process_message(
    State(state): State<AppState>,
    Json(request): Json<ProcessMessageRequest>,
) -> impl IntoResponse {
    info!("POST /api/messages - user: {}, group: {}", request.user_id, request.group_id);
    handle_message(state, request, ParseMode::ChatMessage).await
}

/// Axum handler function for POST /api/inline-queries
pub async fn process_inline_query(
    State(state): State<AppState>,
    Json(request): Json<ProcessMessageRequest>,
) -> impl IntoResponse {
    info!("POST /api/inline-queries - user: {}, group: {}", request.user_id, request.group_id);
    handle_message(state, request, ParseMode::InlineQuery).await
}

/// Axum handler function for GET /api/chats/:group_id/balance
pub async fn get_chat_balance(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/chats/{}/balance", group_id);

    match state.ledger_service.get_chat_balance(group_id).await {
        Ok(balance) => (StatusCode::OK, Json(BalanceResponse { group_id, balance })).into_response(),
        Err(e) => {
            tracing::error!("Error getting balance for group {}: {:?}", group_id, e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

/// Axum handler function for GET /api/users/:user_id/chats
pub async fn list_user_chats(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> impl IntoResponse {
    info!("GET /api/users/{}/chats", user_id);

    match state.ledger_service.list_user_chats(user_id).await {
        Ok(chats) => (StatusCode::OK, Json(ChatListResponse { chats })).into_response(),
        Err(e) => {
            tracing::error!("Error listing chats for user {}: {:?}", user_id, e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

/// Axum handler function for POST /api/users
pub async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> impl IntoResponse {
    info!("POST /api/users - user: {}", request.user_id);

    match state.registration_service.ensure_user(request.user_id).await {
        Ok(user) => (
            StatusCode::CREATED,
            Json(RegisterUserResponse {
                user,
                success_message: "User registered".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error registering user {}: {:?}", request.user_id, e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}

/// Axum handler function for POST /api/chats (group-join events)
pub async fn register_chat(
    State(state): State<AppState>,
    Json(request): Json<RegisterChatRequest>,
) -> impl IntoResponse {
    // The title is informational only; the data model keeps no title
    if let Some(title) = &request.title {
        info!("POST /api/chats - group: {} ({})", request.group_id, title);
    } else {
        info!("POST /api/chats - group: {}", request.group_id);
    }

    match state
        .registration_service
        .ensure_chat_account(request.group_id, request.user_id)
        .await
    {
        Ok(chat) => (
            StatusCode::CREATED,
            Json(RegisterChatResponse {
                chat,
                success_message: "Chat registered".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Error registering chat {}: {:?}", request.group_id, e);
            (error_status(&e), e.to_string()).into_response()
        }
    }
}
