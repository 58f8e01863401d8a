//! Per-provider OAuth token slots.

use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use super::Provider;
use crate::error::IntegrationError;

/// Opaque token bundle exactly as the provider returned it.
///
/// Only constructed from responses that carry an `access_token`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TokenSet(Value);

impl TokenSet {
    /// Wrap a token response, or `None` if it has no access token.
    pub fn from_value(raw: Value) -> Option<Self> {
        match raw.get("access_token").and_then(Value::as_str) {
            Some(token) if !token.is_empty() => Some(Self(raw)),
            _ => None,
        }
    }

    pub fn access_token(&self) -> &str {
        self.0
            .get("access_token")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Salesforce instance the token is valid for.
    pub fn instance_url(&self) -> Option<&str> {
        self.0.get("instance_url").and_then(Value::as_str)
    }
}

/// Most recent token set per provider. Last successful write wins.
#[derive(Debug, Default)]
pub struct TokenStore {
    salesforce: RwLock<Option<TokenSet>>,
    slack: RwLock<Option<TokenSet>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, provider: Provider) -> &RwLock<Option<TokenSet>> {
        match provider {
            Provider::Salesforce => &self.salesforce,
            Provider::Slack => &self.slack,
        }
    }

    pub async fn get(&self, provider: Provider) -> Option<TokenSet> {
        self.slot(provider).read().await.clone()
    }

    /// Replace the provider's token set wholesale.
    pub async fn set(&self, provider: Provider, tokens: TokenSet) {
        *self.slot(provider).write().await = Some(tokens);
        info!(provider = %provider, "Stored new token set");
    }

    /// Token set for a resource call, or `Unauthenticated`.
    pub async fn require(&self, provider: Provider) -> Result<TokenSet, IntegrationError> {
        self.get(provider)
            .await
            .ok_or(IntegrationError::Unauthenticated { provider })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn tokens(access: &str) -> TokenSet {
        TokenSet::from_value(json!({
            "access_token": access,
            "instance_url": "https://na1.example.com",
        }))
        .unwrap()
    }

    #[test]
    fn token_set_requires_access_token() {
        assert!(TokenSet::from_value(json!({"instance_url": "x"})).is_none());
        assert!(TokenSet::from_value(json!({"access_token": ""})).is_none());
        assert!(TokenSet::from_value(json!({"ok": false, "error": "invalid_code"})).is_none());

        let set = tokens("abc");
        assert_eq!(set.access_token(), "abc");
        assert_eq!(set.instance_url(), Some("https://na1.example.com"));
    }

    #[test]
    fn token_set_serializes_verbatim() {
        let raw = json!({"access_token": "xoxb", "team": {"id": "T1"}});
        let set = TokenSet::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&set).unwrap(), raw);
    }

    #[tokio::test]
    async fn require_fails_before_any_token() {
        let store = TokenStore::new();
        let err = store.require(Provider::Salesforce).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Unauthenticated {
                provider: Provider::Salesforce
            }
        ));
    }

    #[tokio::test]
    async fn providers_have_separate_slots() {
        let store = TokenStore::new();
        store.set(Provider::Slack, tokens("slack")).await;

        assert!(store.get(Provider::Salesforce).await.is_none());
        assert_eq!(
            store.require(Provider::Slack).await.unwrap().access_token(),
            "slack"
        );
    }

    #[tokio::test]
    async fn last_write_wins() {
        let store = TokenStore::new();
        store.set(Provider::Salesforce, tokens("first")).await;
        store.set(Provider::Salesforce, tokens("second")).await;
        assert_eq!(
            store.get(Provider::Salesforce).await.unwrap().access_token(),
            "second"
        );
    }
}
