// crates/ballotbox-server/src/server/tests.rs
// ============================================================================
// Module: Server Unit Tests
// Description: Unit tests for handlers, auth, and status mapping.
// Purpose: Validate the HTTP surface with in-memory fixtures.
// Dependencies: ballotbox-server
// ============================================================================

//! ## Overview
//! Exercises the handlers directly with in-memory fixtures: envelope shape,
//! bearer-token auth, the vote error-to-status mapping, and the lifecycle
//! guard statuses.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::body::to_bytes;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::response::Response;
use ballotbox_config::AuthTokenConfig;
use ballotbox_core::InMemoryVoteStore;
use ballotbox_core::NoopVoteAudit;
use ballotbox_core::VoteRecorder;
use ballotbox_core::VoteStore;
use serde_json::Value;
use serde_json::json;

use super::CreatePollRequest;
use super::ListQuery;
use super::ServerState;
use super::UpdatePollRequest;
use super::VoteRequest;
use super::build_server_state;
use super::handle_cast_vote;
use super::handle_create_poll;
use super::handle_delete_poll;
use super::handle_get_poll;
use super::handle_health;
use super::handle_list_my_polls;
use super::handle_list_polls;
use super::handle_ready;
use super::handle_update_poll;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn test_state() -> ServerState {
    let store: Arc<dyn VoteStore> = Arc::new(InMemoryVoteStore::new());
    let recorder = VoteRecorder::from_capabilities(store, Arc::new(NoopVoteAudit));
    build_server_state(
        recorder,
        &[
            AuthTokenConfig {
                token: "alice-token".to_string(),
                user_id: "alice".to_string(),
            },
            AuthTokenConfig {
                token: "bob-token".to_string(),
                user_id: "bob".to_string(),
            },
        ],
    )
}

fn bearer(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("header value");
    headers.insert(AUTHORIZATION, value);
    headers
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    serde_json::from_slice(&bytes).expect("body json")
}

/// Creates a two-option poll as alice and returns its JSON representation.
async fn create_sample_poll(state: &ServerState) -> Value {
    let request = CreatePollRequest {
        title: "lunch spot".to_string(),
        description: Some("pick one".to_string()),
        options: vec!["ramen".to_string(), "tacos".to_string()],
    };
    let response = handle_create_poll(State(state.clone()), bearer("alice-token"), Json(request))
        .await
        .expect("create")
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    body["data"].clone()
}

fn option_id(poll: &Value, index: usize) -> String {
    poll["options"][index]["id"].as_str().expect("option id").to_string()
}

fn poll_id(poll: &Value) -> String {
    poll["id"].as_str().expect("poll id").to_string()
}

async fn cast(
    state: &ServerState,
    token: &str,
    poll: &str,
    option: &str,
) -> Result<Response, Response> {
    let request = VoteRequest {
        option_id: option.to_string(),
    };
    handle_cast_vote(
        State(state.clone()),
        Path(poll.to_string()),
        bearer(token),
        Json(request),
    )
    .await
    .map(IntoResponse::into_response)
    .map_err(IntoResponse::into_response)
}

// ============================================================================
// SECTION: Auth
// ============================================================================

#[tokio::test]
async fn create_without_token_is_unauthorized() {
    let state = test_state();
    let request = CreatePollRequest {
        title: "t".to_string(),
        description: None,
        options: vec!["a".to_string(), "b".to_string()],
    };
    let error = handle_create_poll(State(state), HeaderMap::new(), Json(request))
        .await
        .expect_err("must reject")
        .into_response();
    assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(error).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn poll_reads_require_a_token() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    let error = handle_list_polls(
        State(state.clone()),
        HeaderMap::new(),
        Query(ListQuery {
            page: None,
            limit: None,
        }),
    )
    .await
    .expect_err("must reject")
    .into_response();
    assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
    let error = handle_get_poll(State(state), Path(poll_id(&poll)), HeaderMap::new())
        .await
        .expect_err("must reject")
        .into_response();
    assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let state = test_state();
    let error = handle_list_my_polls(State(state), bearer("wrong-token"))
        .await
        .expect_err("must reject")
        .into_response();
    assert_eq!(error.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// SECTION: Poll Lifecycle Routes
// ============================================================================

#[tokio::test]
async fn create_returns_envelope_with_poll() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    assert_eq!(poll["title"], json!("lunch spot"));
    assert_eq!(poll["options"].as_array().expect("options").len(), 2);
    assert_eq!(poll["options"][0]["vote_count"], json!(0));
}

#[tokio::test]
async fn create_rejects_single_option_draft() {
    let state = test_state();
    let request = CreatePollRequest {
        title: "t".to_string(),
        description: None,
        options: vec!["only".to_string()],
    };
    let error = handle_create_poll(State(state), bearer("alice-token"), Json(request))
        .await
        .expect_err("must reject")
        .into_response();
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_owner_update_is_forbidden() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    let request = UpdatePollRequest {
        title: Some("hijacked".to_string()),
        description: None,
        options: None,
    };
    let error = handle_update_poll(
        State(state),
        Path(poll_id(&poll)),
        bearer("bob-token"),
        Json(request),
    )
    .await
    .expect_err("must reject")
    .into_response();
    assert_eq!(error.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_after_vote_is_forbidden() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    cast(&state, "bob-token", &poll_id(&poll), &option_id(&poll, 0)).await.expect("vote");
    let request = UpdatePollRequest {
        title: Some("too late".to_string()),
        description: None,
        options: None,
    };
    let error = handle_update_poll(
        State(state),
        Path(poll_id(&poll)),
        bearer("alice-token"),
        Json(request),
    )
    .await
    .expect_err("must reject")
    .into_response();
    assert_eq!(error.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_reports_removed_ballots() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    let response = handle_delete_poll(State(state.clone()), Path(poll_id(&poll)), bearer("alice-token"))
        .await
        .expect("delete")
        .into_response();
    let body = body_json(response).await;
    assert_eq!(body["data"]["removed_ballots"], json!(0));
    let error = handle_get_poll(State(state), Path(poll_id(&poll)), bearer("alice-token"))
        .await
        .expect_err("gone")
        .into_response();
    assert_eq!(error.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_missing_poll_is_not_found() {
    let state = test_state();
    let request = UpdatePollRequest {
        title: Some("x".to_string()),
        description: None,
        options: None,
    };
    let error = handle_update_poll(
        State(state),
        Path("no-such-poll".to_string()),
        bearer("alice-token"),
        Json(request),
    )
    .await
    .expect_err("must reject")
    .into_response();
    assert_eq!(error.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// SECTION: Voting Routes
// ============================================================================

#[tokio::test]
async fn cast_vote_returns_updated_poll() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    let response = cast(&state, "bob-token", &poll_id(&poll), &option_id(&poll, 1))
        .await
        .expect("cast");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["options"][1]["vote_count"], json!(1));
    assert_eq!(body["data"]["options"][0]["vote_count"], json!(0));
}

#[tokio::test]
async fn second_vote_is_a_conflict() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    cast(&state, "bob-token", &poll_id(&poll), &option_id(&poll, 0)).await.expect("first");
    let error = cast(&state, "bob-token", &poll_id(&poll), &option_id(&poll, 1))
        .await
        .expect_err("duplicate");
    assert_eq!(error.status(), StatusCode::CONFLICT);
    let body = body_json(error).await;
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn forged_option_is_not_found() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    let error = cast(&state, "bob-token", &poll_id(&poll), "forged-option")
        .await
        .expect_err("forged");
    assert_eq!(error.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_option_id_is_bad_request() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    let error = cast(&state, "bob-token", &poll_id(&poll), "not valid!").await.expect_err("bad");
    assert_eq!(error.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_poll_reports_voter_state() {
    let state = test_state();
    let poll = create_sample_poll(&state).await;
    let chosen = option_id(&poll, 0);
    cast(&state, "bob-token", &poll_id(&poll), &chosen).await.expect("vote");
    let voter_view = handle_get_poll(State(state.clone()), Path(poll_id(&poll)), bearer("bob-token"))
        .await
        .expect("get")
        .into_response();
    let body = body_json(voter_view).await;
    assert_eq!(body["data"]["voted"], json!(true));
    assert_eq!(body["data"]["voted_option_id"], json!(chosen));
    let non_voter_view = handle_get_poll(State(state), Path(poll_id(&poll)), bearer("alice-token"))
        .await
        .expect("get")
        .into_response();
    let body = body_json(non_voter_view).await;
    assert_eq!(body["data"]["voted"], json!(false));
}

// ============================================================================
// SECTION: Listing Routes
// ============================================================================

#[tokio::test]
async fn list_caps_limit_at_fifty() {
    let state = test_state();
    for index in 0 .. 3 {
        let request = CreatePollRequest {
            title: format!("poll {index}"),
            description: None,
            options: vec!["a".to_string(), "b".to_string()],
        };
        handle_create_poll(State(state.clone()), bearer("alice-token"), Json(request))
            .await
            .expect("create");
    }
    let response = handle_list_polls(
        State(state),
        bearer("alice-token"),
        Query(ListQuery {
            page: Some(1),
            limit: Some(500),
        }),
    )
    .await
    .expect("list")
    .into_response();
    let body = body_json(response).await;
    assert_eq!(body["data"]["limit"], json!(50));
    assert_eq!(body["data"]["items"].as_array().expect("items").len(), 3);
}

#[tokio::test]
async fn mine_returns_only_owned_polls() {
    let state = test_state();
    create_sample_poll(&state).await;
    let response = handle_list_my_polls(State(state.clone()), bearer("bob-token"))
        .await
        .expect("mine")
        .into_response();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().expect("polls").len(), 0);
    let response = handle_list_my_polls(State(state), bearer("alice-token"))
        .await
        .expect("mine")
        .into_response();
    let body = body_json(response).await;
    assert_eq!(body["data"].as_array().expect("polls").len(), 1);
}

// ============================================================================
// SECTION: Health Endpoints
// ============================================================================

#[tokio::test]
async fn health_and_ready_report_success() {
    let state = test_state();
    let health = handle_health().await;
    assert_eq!(health.status(), StatusCode::OK);
    let ready = handle_ready(State(state)).await;
    assert_eq!(ready.status(), StatusCode::OK);
    let body = body_json(ready).await;
    assert_eq!(body["success"], json!(true));
}
