//! REST endpoints driving registration sessions.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::export::ExportFormat;
use super::model::{INTEREST_OPTIONS, RecordPatch, TeamSize, WorkMode};
use super::sessions::RegistrationSessions;
use crate::error::{Error, RegistrationError};

/// Shared state for registration routes.
#[derive(Clone)]
pub struct RegistrationRouteState {
    pub sessions: Arc<RegistrationSessions>,
}

/// Build the registration REST routes.
pub fn registration_routes(sessions: Arc<RegistrationSessions>) -> Router {
    Router::new()
        .route("/api/registration", post(create_session))
        .route("/api/registration/options", get(form_options))
        .route(
            "/api/registration/{id}",
            get(get_session).patch(update_session).delete(delete_session),
        )
        .route("/api/registration/{id}/open", post(reopen))
        .route("/api/registration/{id}/interests", post(toggle_interest))
        .route("/api/registration/{id}/next", post(next_step))
        .route("/api/registration/{id}/back", post(previous_step))
        .route("/api/registration/{id}/submit", post(submit))
        .route("/api/registration/{id}/export/{format}", get(export))
        .with_state(RegistrationRouteState { sessions })
}

fn registration_error(err: RegistrationError) -> Response {
    let status = match &err {
        RegistrationError::StepIncomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RegistrationError::InvalidValue { .. } => StatusCode::BAD_REQUEST,
        RegistrationError::SessionNotFound => StatusCode::NOT_FOUND,
        RegistrationError::Submission(_) => StatusCode::BAD_GATEWAY,
        RegistrationError::InvalidTransition { .. }
        | RegistrationError::RecordFrozen
        | RegistrationError::WizardClosed
        | RegistrationError::NotSubmitted
        | RegistrationError::Cancelled => StatusCode::CONFLICT,
    };
    let body = match &err {
        RegistrationError::StepIncomplete { step, missing } => json!({
            "error": err.to_string(),
            "step": step,
            "missing": missing,
        }),
        _ => json!({ "error": err.to_string() }),
    };
    (status, Json(body)).into_response()
}

fn invalid_body(rejection: JsonRejection) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": rejection.body_text() })),
    )
        .into_response()
}

fn parse_id(id: &str) -> Result<Uuid, Response> {
    Uuid::parse_str(id).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid session ID"})),
        )
            .into_response()
    })
}

/// GET /api/registration/options
///
/// Choices offered by the form's selects and interest chips.
async fn form_options() -> Json<serde_json::Value> {
    Json(json!({
        "teamSizes": TeamSize::ALL.map(|size| size.as_str()),
        "workModes": WorkMode::ALL.map(|mode| mode.as_str()),
        "interests": INTEREST_OPTIONS,
    }))
}

/// POST /api/registration
async fn create_session(State(state): State<RegistrationRouteState>) -> Response {
    let wizard = state.sessions.create().await;
    (StatusCode::CREATED, Json(wizard.snapshot().await)).into_response()
}

/// GET /api/registration/{id}
async fn get_session(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.get(id).await {
        Ok(wizard) => Json(wizard.snapshot().await).into_response(),
        Err(e) => registration_error(e),
    }
}

/// PATCH /api/registration/{id}
async fn update_session(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<String>,
    body: Result<Json<RecordPatch>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let patch = match body {
        Ok(Json(patch)) => patch,
        Err(rejection) => return invalid_body(rejection),
    };
    let result = match state.sessions.get(id).await {
        Ok(wizard) => wizard.update(patch).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => registration_error(e),
    }
}

/// DELETE /api/registration/{id}
async fn delete_session(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.remove(id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => registration_error(e),
    }
}

/// POST /api/registration/{id}/open
async fn reopen(State(state): State<RegistrationRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.get(id).await {
        Ok(wizard) => Json(wizard.open().await).into_response(),
        Err(e) => registration_error(e),
    }
}

#[derive(Deserialize)]
struct ToggleRequest {
    interest: String,
}

/// POST /api/registration/{id}/interests
async fn toggle_interest(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<String>,
    body: Result<Json<ToggleRequest>, JsonRejection>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return invalid_body(rejection),
    };
    let result = match state.sessions.get(id).await {
        Ok(wizard) => wizard.toggle_interest(&body.interest).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => registration_error(e),
    }
}

/// POST /api/registration/{id}/next
async fn next_step(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let result = match state.sessions.get(id).await {
        Ok(wizard) => wizard.next().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => registration_error(e),
    }
}

/// POST /api/registration/{id}/back
async fn previous_step(
    State(state): State<RegistrationRouteState>,
    Path(id): Path<String>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    match state.sessions.get(id).await {
        Ok(wizard) => Json(wizard.back().await).into_response(),
        Err(e) => registration_error(e),
    }
}

/// POST /api/registration/{id}/submit
///
/// Waits for the (simulated) backend before answering.
async fn submit(State(state): State<RegistrationRouteState>, Path(id): Path<String>) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let result = match state.sessions.get(id).await {
        Ok(wizard) => wizard.submit().await,
        Err(e) => Err(e),
    };
    match result {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => registration_error(e),
    }
}

/// GET /api/registration/{id}/export/{format}
async fn export(
    State(state): State<RegistrationRouteState>,
    Path((id, format)): Path<(String, String)>,
) -> Response {
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let format: ExportFormat = match format.parse() {
        Ok(format) => format,
        Err(message) => {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };
    let wizard = match state.sessions.get(id).await {
        Ok(wizard) => wizard,
        Err(e) => return registration_error(e),
    };

    match wizard.export(format).await {
        Ok(file) => (
            [
                (header::CONTENT_TYPE, file.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.file_name),
                ),
            ],
            file.bytes,
        )
            .into_response(),
        Err(Error::Registration(e)) => registration_error(e),
        Err(e) => {
            tracing::error!(session = %id, error = %e, "Registration export failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Export failed"})),
            )
                .into_response()
        }
    }
}
