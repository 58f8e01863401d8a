//! REST endpoints relaying Salesforce and Slack calls.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, warn};

use super::salesforce::{SalesforceClient, SalesforceCredentials};
use super::slack::SlackClient;
use super::tokens::TokenSet;
use crate::error::IntegrationError;

/// Shared state for integration routes.
#[derive(Clone)]
pub struct IntegrationRouteState {
    pub salesforce: Arc<SalesforceClient>,
    pub slack: Arc<SlackClient>,
}

/// Build the Salesforce and Slack routes.
pub fn integration_routes(state: IntegrationRouteState) -> Router {
    Router::new()
        .route("/api/salesforce/auth", post(salesforce_auth))
        .route("/api/salesforce/leads", get(salesforce_leads))
        .route("/api/salesforce/opportunities", get(salesforce_opportunities))
        .route("/api/salesforce/tasks", post(salesforce_create_task))
        .route("/api/slack/auth", post(slack_auth))
        .route("/api/slack/channels", get(slack_channels))
        .route("/api/slack/messages", post(slack_send_message))
        .route("/api/slack/team", get(slack_team))
        .with_state(state)
}

fn authenticated(tokens: TokenSet) -> Response {
    Json(json!({ "success": true, "data": tokens })).into_response()
}

/// Map a relay outcome to a response. `failure` is the generic message for
/// upstream errors; the upstream detail only goes to the log.
fn relayed(result: Result<Vec<u8>, IntegrationError>, failure: &'static str) -> Response {
    match result {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(err @ IntegrationError::Unauthenticated { .. }) => {
            warn!(error = %err, "Rejected unauthenticated relay call");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Not authenticated"})),
            )
                .into_response()
        }
        Err(IntegrationError::AuthenticationFailed { .. }) => auth_failed(),
        Err(err @ IntegrationError::Upstream { .. }) => {
            error!(error = %err, "{failure}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": failure })),
            )
                .into_response()
        }
    }
}

/// Malformed or incomplete request body.
fn invalid_body(rejection: JsonRejection) -> Response {
    warn!(error = %rejection.body_text(), "Rejected request body");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Invalid request body"})),
    )
        .into_response()
}

fn auth_failed() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"error": "Authentication failed"})),
    )
        .into_response()
}

// ── Salesforce ──────────────────────────────────────────────────────────

/// POST /api/salesforce/auth
async fn salesforce_auth(
    State(state): State<IntegrationRouteState>,
    body: Result<Json<SalesforceCredentials>, JsonRejection>,
) -> Response {
    // Missing credentials fail like wrong ones.
    let Ok(Json(credentials)) = body else {
        return auth_failed();
    };
    match state.salesforce.authenticate(&credentials).await {
        Ok(tokens) => authenticated(tokens),
        Err(_) => auth_failed(),
    }
}

/// GET /api/salesforce/leads
async fn salesforce_leads(State(state): State<IntegrationRouteState>) -> Response {
    relayed(state.salesforce.leads().await, "Failed to fetch leads")
}

/// GET /api/salesforce/opportunities
async fn salesforce_opportunities(State(state): State<IntegrationRouteState>) -> Response {
    relayed(
        state.salesforce.opportunities().await,
        "Failed to fetch opportunities",
    )
}

/// POST /api/salesforce/tasks
async fn salesforce_create_task(
    State(state): State<IntegrationRouteState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let task = match body {
        Ok(Json(task)) => task,
        Err(rejection) => return invalid_body(rejection),
    };
    relayed(
        state.salesforce.create_task(&task).await,
        "Failed to create task",
    )
}

// ── Slack ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SlackAuthRequest {
    code: String,
}

/// POST /api/slack/auth
async fn slack_auth(
    State(state): State<IntegrationRouteState>,
    body: Result<Json<SlackAuthRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return auth_failed();
    };
    match state.slack.authenticate(&body.code).await {
        Ok(tokens) => authenticated(tokens),
        Err(_) => auth_failed(),
    }
}

/// GET /api/slack/channels
async fn slack_channels(State(state): State<IntegrationRouteState>) -> Response {
    relayed(state.slack.channels().await, "Failed to fetch channels")
}

#[derive(Deserialize)]
struct SlackMessageRequest {
    channel: String,
    message: String,
}

/// POST /api/slack/messages
async fn slack_send_message(
    State(state): State<IntegrationRouteState>,
    body: Result<Json<SlackMessageRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    relayed(
        state.slack.send_message(&body.channel, &body.message).await,
        "Failed to send message",
    )
}

/// GET /api/slack/team
async fn slack_team(State(state): State<IntegrationRouteState>) -> Response {
    relayed(state.slack.team_info().await, "Failed to fetch team info")
}
