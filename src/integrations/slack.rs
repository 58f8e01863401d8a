//! Slack Web API relay.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde_json::{Value, json};
use tracing::{error, info};

use super::tokens::{TokenSet, TokenStore};
use super::{Provider, relay_body, upstream_error};
use crate::config::SlackConfig;
use crate::error::IntegrationError;

/// Slack client bound to the process-wide token store.
pub struct SlackClient {
    config: SlackConfig,
    tokens: Arc<TokenStore>,
    client: reqwest::Client,
}

impl SlackClient {
    pub fn new(config: SlackConfig, tokens: Arc<TokenStore>, client: reqwest::Client) -> Self {
        Self {
            config,
            tokens,
            client,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.config.api_url.trim_end_matches('/'))
    }

    /// Exchange an OAuth code for a token set and store it.
    ///
    /// Slack reports a rejected code as HTTP 200 with `"ok": false`; that is
    /// treated as a failure and the stored token set is left untouched.
    pub async fn authenticate(&self, code: &str) -> Result<TokenSet, IntegrationError> {
        let failed = || IntegrationError::AuthenticationFailed {
            provider: Provider::Slack,
        };

        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ];
        let response = self
            .client
            .post(self.api_url("oauth.v2.access"))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Slack auth request failed");
                failed()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "Slack auth rejected");
            return Err(failed());
        }

        let raw: Value = response.json().await.map_err(|e| {
            error!(error = %e, "Slack auth returned invalid JSON");
            failed()
        })?;
        if raw.get("ok").and_then(Value::as_bool) != Some(true) {
            let reason = raw.get("error").and_then(Value::as_str).unwrap_or("unknown");
            error!(reason, "Slack auth rejected");
            return Err(failed());
        }
        let tokens = TokenSet::from_value(raw).ok_or_else(|| {
            error!("Slack auth response carried no access token");
            failed()
        })?;

        self.tokens.set(Provider::Slack, tokens.clone()).await;
        info!("Slack authenticated");
        Ok(tokens)
    }

    /// `conversations.list`, relayed verbatim.
    pub async fn channels(&self) -> Result<Vec<u8>, IntegrationError> {
        self.get("conversations.list").await
    }

    /// `team.info`, relayed verbatim.
    pub async fn team_info(&self) -> Result<Vec<u8>, IntegrationError> {
        self.get("team.info").await
    }

    /// Post `text` to `channel`.
    pub async fn send_message(&self, channel: &str, text: &str) -> Result<Vec<u8>, IntegrationError> {
        let tokens = self.tokens.require(Provider::Slack).await?;
        let response = self
            .client
            .post(self.api_url("chat.postMessage"))
            .bearer_auth(tokens.access_token())
            .json(&json!({ "channel": channel, "text": text }))
            .send()
            .await
            .map_err(|e| upstream_error(Provider::Slack, e))?;
        relay_body(Provider::Slack, response).await
    }

    async fn get(&self, method: &str) -> Result<Vec<u8>, IntegrationError> {
        let tokens = self.tokens.require(Provider::Slack).await?;
        let response = self
            .client
            .get(self.api_url(method))
            .bearer_auth(tokens.access_token())
            .send()
            .await
            .map_err(|e| upstream_error(Provider::Slack, e))?;
        relay_body(Provider::Slack, response).await
    }
}
