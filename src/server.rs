//! HTTP surface: wires every route group onto one router.

use std::sync::Arc;

use axum::routing::get;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::analytics::analytics_routes;
use crate::config::ServerConfig;
use crate::integrations::{
    IntegrationRouteState, SalesforceClient, SlackClient, TokenStore, integration_routes,
};
use crate::registration::{RegistrationSessions, registration_routes};

/// Build the full application router from `config`.
///
/// The token store and the outbound HTTP client are shared by both
/// providers for the lifetime of the router.
pub fn build_router(config: &ServerConfig) -> Router {
    let tokens = Arc::new(TokenStore::new());
    let client = reqwest::Client::new();

    let integrations = IntegrationRouteState {
        salesforce: Arc::new(SalesforceClient::new(
            config.salesforce.clone(),
            Arc::clone(&tokens),
            client.clone(),
        )),
        slack: Arc::new(SlackClient::new(
            config.slack.clone(),
            Arc::clone(&tokens),
            client,
        )),
    };
    let sessions = RegistrationSessions::simulated(config.wizard);

    Router::new()
        .route("/health", get(health))
        .merge(integration_routes(integrations))
        .merge(analytics_routes())
        .merge(registration_routes(sessions))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
