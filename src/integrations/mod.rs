//! Third-party integrations: Salesforce and Slack OAuth relays.
//!
//! Each provider has a single token slot for the whole process. A successful
//! authentication replaces it; resource calls read it and forward the
//! upstream response body untouched.

pub mod routes;
pub mod salesforce;
pub mod slack;
pub mod tokens;

pub use routes::{IntegrationRouteState, integration_routes};
pub use salesforce::{SalesforceClient, SalesforceCredentials};
pub use slack::SlackClient;
pub use tokens::{TokenSet, TokenStore};

use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

/// Supported integration providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Salesforce,
    Slack,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Salesforce => write!(f, "Salesforce"),
            Self::Slack => write!(f, "Slack"),
        }
    }
}

/// Read an upstream response, failing on any non-2xx status.
pub(crate) async fn relay_body(
    provider: Provider,
    response: reqwest::Response,
) -> Result<Vec<u8>, IntegrationError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(IntegrationError::Upstream {
            provider,
            reason: format!("HTTP {status}: {body}"),
        });
    }
    response
        .bytes()
        .await
        .map(|b| b.to_vec())
        .map_err(|e| upstream_error(provider, e))
}

pub(crate) fn upstream_error(provider: Provider, err: reqwest::Error) -> IntegrationError {
    IntegrationError::Upstream {
        provider,
        reason: err.to_string(),
    }
}
