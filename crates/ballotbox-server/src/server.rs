// crates/ballotbox-server/src/server.rs
// ============================================================================
// Module: Ballotbox HTTP Server
// Description: Axum router, handlers, and error-to-status mapping.
// Purpose: Serve poll management and vote casting over JSON.
// Dependencies: axum, ballotbox-config, ballotbox-core, serde, tokio
// ============================================================================

//! ## Overview
//! Handlers authenticate the caller against the static bearer-token table,
//! delegate to the vote recorder or lifecycle operations, and translate the
//! domain error taxonomy into HTTP statuses. The envelope shape
//! `{success, message?, data?}` is shared by every route, including probe
//! endpoints, so clients parse one shape everywhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use ballotbox_config::AuthTokenConfig;
use ballotbox_core::LifecycleError;
use ballotbox_core::OptionId;
use ballotbox_core::Poll;
use ballotbox_core::PollDraft;
use ballotbox_core::PollId;
use ballotbox_core::PollUpdate;
use ballotbox_core::UserId;
use ballotbox_core::VoteError;
use ballotbox_core::VoteRecorder;
use ballotbox_core::VoteStore;
use ballotbox_core::runtime::lifecycle;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server startup errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not bind.
    #[error("server bind failed: {0}")]
    Bind(String),
    /// The accept loop failed.
    #[error("server accept loop failed: {0}")]
    Serve(String),
}

/// One API failure: a status code plus an envelope message.
#[derive(Debug)]
struct ApiError {
    /// HTTP status for the failure.
    status: StatusCode,
    /// Envelope message.
    message: String,
}

impl ApiError {
    /// Builds a 401 challenge.
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "missing or unknown bearer token".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::failure(self.message))).into_response()
    }
}

impl From<VoteError> for ApiError {
    fn from(error: VoteError) -> Self {
        let status = match &error {
            VoteError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            VoteError::DuplicateVote => StatusCode::CONFLICT,
            VoteError::PollOrOptionNotFound => StatusCode::NOT_FOUND,
            VoteError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(error: LifecycleError) -> Self {
        let status = match &error {
            LifecycleError::NotFound(_) => StatusCode::NOT_FOUND,
            LifecycleError::NotOwner | LifecycleError::VotingStarted => StatusCode::FORBIDDEN,
            LifecycleError::TooFewOptions | LifecycleError::EmptyTitle => StatusCode::BAD_REQUEST,
            LifecycleError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: error.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Envelope
// ============================================================================

/// Uniform response envelope.
///
/// # Invariants
/// - `success == true` implies `message` is absent.
/// - Failures never carry `data`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure description, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload, absent on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Builds a success envelope.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Builds a failure envelope.
    pub const fn failure(message: String) -> Self {
        Self {
            success: false,
            message: Some(message),
            data: None,
        }
    }
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared server state: the recorder plus the resolved token table.
#[derive(Clone)]
pub struct ServerState {
    /// Shared immutable interior.
    inner: Arc<StateInner>,
}

/// Interior of [`ServerState`].
struct StateInner {
    /// Vote recorder over the configured store.
    recorder: VoteRecorder<dyn VoteStore>,
    /// Bearer token to verified user mapping.
    tokens: HashMap<String, UserId>,
}

/// Builds server state from a recorder and the configured token table.
#[must_use]
pub fn build_server_state(
    recorder: VoteRecorder<dyn VoteStore>,
    auth_tokens: &[AuthTokenConfig],
) -> ServerState {
    let tokens = auth_tokens
        .iter()
        .map(|entry| (entry.token.clone(), UserId::new(entry.user_id.clone())))
        .collect();
    ServerState {
        inner: Arc::new(StateInner { recorder, tokens }),
    }
}

impl ServerState {
    /// Returns the recorder.
    fn recorder(&self) -> &VoteRecorder<dyn VoteStore> {
        &self.inner.recorder
    }
}

/// Resolves the caller from the `Authorization: Bearer` header.
fn authenticate(state: &ServerState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let value = headers.get(AUTHORIZATION).ok_or_else(ApiError::unauthorized)?;
    let value = value.to_str().map_err(|_| ApiError::unauthorized())?;
    let token = value.strip_prefix("Bearer ").ok_or_else(ApiError::unauthorized)?;
    state.inner.tokens.get(token).cloned().ok_or_else(ApiError::unauthorized)
}

// ============================================================================
// SECTION: Request And View Types
// ============================================================================

/// Body for `POST /api/v1/polls`.
#[derive(Debug, Deserialize)]
struct CreatePollRequest {
    /// Poll title.
    title: String,
    /// Optional description.
    #[serde(default)]
    description: Option<String>,
    /// Option texts, at least two non-empty after trimming.
    options: Vec<String>,
}

/// Body for `PUT /api/v1/polls/{poll_id}`. Absent fields are left unchanged;
/// an empty-string description clears it.
#[derive(Debug, Deserialize)]
struct UpdatePollRequest {
    /// Replacement title.
    #[serde(default)]
    title: Option<String>,
    /// Replacement description; empty string clears.
    #[serde(default)]
    description: Option<String>,
    /// Replacement option texts.
    #[serde(default)]
    options: Option<Vec<String>>,
}

/// Body for `POST /api/v1/polls/{poll_id}/vote`.
#[derive(Debug, Deserialize)]
struct VoteRequest {
    /// Chosen option identifier.
    option_id: String,
}

/// Pagination query for poll listings.
#[derive(Debug, Deserialize)]
struct ListQuery {
    /// 1-based page number.
    #[serde(default)]
    page: Option<u64>,
    /// Page size, capped at 50.
    #[serde(default)]
    limit: Option<u64>,
}

/// A poll plus the caller's vote state.
#[derive(Debug, Serialize)]
struct PollView {
    /// The poll.
    #[serde(flatten)]
    poll: Poll,
    /// Whether the caller has voted on this poll.
    voted: bool,
    /// The option the caller voted for, when voted.
    #[serde(skip_serializing_if = "Option::is_none")]
    voted_option_id: Option<OptionId>,
}

/// Result payload for poll deletion.
#[derive(Debug, Serialize)]
struct DeleteResult {
    /// Number of ballots removed by the cascade.
    removed_ballots: u64,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /api/v1/polls`.
async fn handle_create_poll(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(request): Json<CreatePollRequest>,
) -> Result<Response, ApiError> {
    let owner = authenticate(&state, &headers)?;
    let draft = PollDraft {
        title: request.title,
        description: request.description,
        options: request.options,
    };
    let poll = lifecycle::create_poll(state.recorder().store().as_ref(), &owner, &draft)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(poll))).into_response())
}

/// `GET /api/v1/polls`.
async fn handle_list_polls(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers)?;
    let page = state
        .recorder()
        .store()
        .list_polls(query.page.unwrap_or(1), query.limit.unwrap_or(20))
        .map_err(|error| ApiError::from(LifecycleError::from(error)))?;
    Ok(Json(ApiResponse::ok(page)).into_response())
}

/// `GET /api/v1/polls/mine`.
async fn handle_list_my_polls(
    State(state): State<ServerState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let owner = authenticate(&state, &headers)?;
    let polls = state
        .recorder()
        .store()
        .list_polls_by_owner(&owner)
        .map_err(|error| ApiError::from(LifecycleError::from(error)))?;
    Ok(Json(ApiResponse::ok(polls)).into_response())
}

/// `GET /api/v1/polls/{poll_id}`. The response includes the caller's own
/// vote state.
async fn handle_get_poll(
    State(state): State<ServerState>,
    Path(poll_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let poll_id = PollId::new(poll_id);
    let poll = state
        .recorder()
        .store()
        .get_poll(&poll_id)
        .map_err(|error| ApiError::from(LifecycleError::from(error)))?;
    let voted_option_id = state
        .recorder()
        .store()
        .find_ballot(&user_id, &poll_id)
        .map_err(|error| ApiError::from(LifecycleError::from(error)))?
        .map(|ballot| ballot.option_id);
    let view = PollView {
        poll,
        voted: voted_option_id.is_some(),
        voted_option_id,
    };
    Ok(Json(ApiResponse::ok(view)).into_response())
}

/// `PUT /api/v1/polls/{poll_id}`.
async fn handle_update_poll(
    State(state): State<ServerState>,
    Path(poll_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<UpdatePollRequest>,
) -> Result<Response, ApiError> {
    let actor = authenticate(&state, &headers)?;
    let update = PollUpdate {
        title: request.title,
        description: request
            .description
            .map(|text| if text.is_empty() { None } else { Some(text) }),
        options: request.options,
    };
    let poll = lifecycle::update_poll(
        state.recorder().store().as_ref(),
        &actor,
        &PollId::new(poll_id),
        &update,
    )?;
    Ok(Json(ApiResponse::ok(poll)).into_response())
}

/// `DELETE /api/v1/polls/{poll_id}`.
async fn handle_delete_poll(
    State(state): State<ServerState>,
    Path(poll_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let actor = authenticate(&state, &headers)?;
    let removed_ballots =
        lifecycle::delete_poll(state.recorder().store().as_ref(), &actor, &PollId::new(poll_id))?;
    Ok(Json(ApiResponse::ok(DeleteResult { removed_ballots })).into_response())
}

/// `POST /api/v1/polls/{poll_id}/vote`.
async fn handle_cast_vote(
    State(state): State<ServerState>,
    Path(poll_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<VoteRequest>,
) -> Result<Response, ApiError> {
    let user_id = authenticate(&state, &headers)?;
    let poll = state.recorder().cast_vote(
        &user_id,
        &PollId::new(poll_id),
        &OptionId::new(request.option_id),
    )?;
    Ok(Json(ApiResponse::ok(poll)).into_response())
}

/// `GET /healthz`.
async fn handle_health() -> Response {
    Json(ApiResponse::ok("alive")).into_response()
}

/// `GET /readyz`. Probes the store.
async fn handle_ready(State(state): State<ServerState>) -> Response {
    match state.recorder().store().readiness() {
        Ok(()) => Json(ApiResponse::ok("ready")).into_response(),
        Err(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::failure(error.to_string())),
        )
            .into_response(),
    }
}

// ============================================================================
// SECTION: Router And Runtime
// ============================================================================

/// Builds the application router.
#[must_use]
pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/api/v1/polls", post(handle_create_poll).get(handle_list_polls))
        .route("/api/v1/polls/mine", get(handle_list_my_polls))
        .route(
            "/api/v1/polls/{poll_id}",
            get(handle_get_poll).put(handle_update_poll).delete(handle_delete_poll),
        )
        .route("/api/v1/polls/{poll_id}/vote", post(handle_cast_vote))
        .route("/healthz", get(handle_health))
        .route("/readyz", get(handle_ready))
        .with_state(state)
}

/// Binds the listener and serves requests until the task is cancelled.
///
/// # Errors
///
/// Returns [`ServerError`] when the bind or the accept loop fails.
pub async fn run(bind: SocketAddr, state: ServerState) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| ServerError::Bind(err.to_string()))?;
    let router = build_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|err| ServerError::Serve(err.to_string()))
}

#[cfg(test)]
mod tests;
