//! Salesforce REST relay: OAuth username-password flow plus SOQL queries.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use super::tokens::{TokenSet, TokenStore};
use super::{Provider, relay_body, upstream_error};
use crate::config::SalesforceConfig;
use crate::error::IntegrationError;

/// REST API version used for every data call.
const API_VERSION: &str = "v58.0";

pub const LEADS_QUERY: &str = "SELECT Id, Name, Email, Company, Status FROM Lead LIMIT 10";
pub const OPPORTUNITIES_QUERY: &str =
    "SELECT Id, Name, Amount, StageName, CloseDate FROM Opportunity LIMIT 10";

/// Body of `POST /api/salesforce/auth`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesforceCredentials {
    pub username: String,
    pub password: SecretString,
    #[serde(default = "empty_secret")]
    pub security_token: SecretString,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Salesforce client bound to the process-wide token store.
pub struct SalesforceClient {
    config: SalesforceConfig,
    tokens: Arc<TokenStore>,
    client: reqwest::Client,
}

impl SalesforceClient {
    pub fn new(config: SalesforceConfig, tokens: Arc<TokenStore>, client: reqwest::Client) -> Self {
        Self {
            config,
            tokens,
            client,
        }
    }

    /// Exchange user credentials for a token set and store it.
    ///
    /// The stored token set is left untouched on failure.
    pub async fn authenticate(
        &self,
        credentials: &SalesforceCredentials,
    ) -> Result<TokenSet, IntegrationError> {
        let failed = || IntegrationError::AuthenticationFailed {
            provider: Provider::Salesforce,
        };

        // Salesforce expects the security token appended to the password.
        let password = format!(
            "{}{}",
            credentials.password.expose_secret(),
            credentials.security_token.expose_secret()
        );
        let params = [
            ("grant_type", "password"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
            ("username", credentials.username.as_str()),
            ("password", password.as_str()),
        ];

        let response = self
            .client
            .post(format!(
                "{}/services/oauth2/token",
                self.config.login_url.trim_end_matches('/')
            ))
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Salesforce auth request failed");
                failed()
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, body = %body, "Salesforce auth rejected");
            return Err(failed());
        }

        let raw: Value = response.json().await.map_err(|e| {
            error!(error = %e, "Salesforce auth returned invalid JSON");
            failed()
        })?;
        let tokens = TokenSet::from_value(raw).ok_or_else(|| {
            error!("Salesforce auth response carried no access token");
            failed()
        })?;

        self.tokens.set(Provider::Salesforce, tokens.clone()).await;
        info!(username = %credentials.username, "Salesforce authenticated");
        Ok(tokens)
    }

    /// Run a SOQL query and return the upstream body verbatim.
    pub async fn query(&self, soql: &str) -> Result<Vec<u8>, IntegrationError> {
        let tokens = self.tokens.require(Provider::Salesforce).await?;
        let url = format!("{}/query/", data_url(&tokens)?);
        let response = self
            .client
            .get(url)
            .bearer_auth(tokens.access_token())
            .query(&[("q", soql)])
            .send()
            .await
            .map_err(|e| upstream_error(Provider::Salesforce, e))?;
        relay_body(Provider::Salesforce, response).await
    }

    pub async fn leads(&self) -> Result<Vec<u8>, IntegrationError> {
        self.query(LEADS_QUERY).await
    }

    pub async fn opportunities(&self) -> Result<Vec<u8>, IntegrationError> {
        self.query(OPPORTUNITIES_QUERY).await
    }

    /// Create a Task record from the given field map.
    pub async fn create_task(&self, task: &Value) -> Result<Vec<u8>, IntegrationError> {
        let tokens = self.tokens.require(Provider::Salesforce).await?;
        let url = format!("{}/sobjects/Task/", data_url(&tokens)?);
        let response = self
            .client
            .post(url)
            .bearer_auth(tokens.access_token())
            .json(task)
            .send()
            .await
            .map_err(|e| upstream_error(Provider::Salesforce, e))?;
        relay_body(Provider::Salesforce, response).await
    }
}

fn data_url(tokens: &TokenSet) -> Result<String, IntegrationError> {
    let instance = tokens
        .instance_url()
        .ok_or_else(|| IntegrationError::Upstream {
            provider: Provider::Salesforce,
            reason: "token set has no instance_url".to_string(),
        })?;
    Ok(format!(
        "{}/services/data/{API_VERSION}",
        instance.trim_end_matches('/')
    ))
}
