//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default listen port; the web client's API base URL points here.
pub const DEFAULT_PORT: u16 = 3001;

/// Salesforce connected-app settings.
#[derive(Debug, Clone)]
pub struct SalesforceConfig {
    /// Base URL of the OAuth token endpoint (production or sandbox login host).
    pub login_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
}

impl Default for SalesforceConfig {
    fn default() -> Self {
        Self {
            login_url: "https://login.salesforce.com".to_string(),
            client_id: String::new(),
            client_secret: SecretString::from(String::new()),
            redirect_uri: String::new(),
        }
    }
}

/// Slack app settings.
#[derive(Debug, Clone)]
pub struct SlackConfig {
    /// Base URL of the Slack Web API.
    pub api_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub redirect_uri: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            api_url: "https://slack.com/api".to_string(),
            client_id: String::new(),
            client_secret: SecretString::from(String::new()),
            redirect_uri: String::new(),
        }
    }
}

/// Registration wizard timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardConfig {
    /// How long the simulated backend takes to accept a submission.
    pub submit_delay: Duration,
    /// How long the success screen stays up before the wizard resets.
    pub reset_delay: Duration,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            submit_delay: Duration::from_millis(2000),
            reset_delay: Duration::from_millis(3000),
        }
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub salesforce: SalesforceConfig,
    pub slack: SlackConfig,
    pub wizard: WizardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            salesforce: SalesforceConfig::default(),
            slack: SlackConfig::default(),
            wizard: WizardConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".to_string(),
                message: format!("{raw:?} is not a valid port"),
            })?,
            None => DEFAULT_PORT,
        };

        let sf_defaults = SalesforceConfig::default();
        let salesforce = SalesforceConfig {
            login_url: lookup("SALESFORCE_LOGIN_URL").unwrap_or(sf_defaults.login_url),
            client_id: lookup("SALESFORCE_CLIENT_ID").unwrap_or_default(),
            client_secret: SecretString::from(
                lookup("SALESFORCE_CLIENT_SECRET").unwrap_or_default(),
            ),
            redirect_uri: lookup("SALESFORCE_REDIRECT_URI").unwrap_or_default(),
        };

        let slack_defaults = SlackConfig::default();
        let slack = SlackConfig {
            api_url: lookup("SLACK_API_URL").unwrap_or(slack_defaults.api_url),
            client_id: lookup("SLACK_CLIENT_ID").unwrap_or_default(),
            client_secret: SecretString::from(lookup("SLACK_CLIENT_SECRET").unwrap_or_default()),
            redirect_uri: lookup("SLACK_REDIRECT_URI").unwrap_or_default(),
        };

        let wizard_defaults = WizardConfig::default();
        let wizard = WizardConfig {
            submit_delay: millis_or(
                &lookup,
                "HYBRIDFLOW_SUBMIT_DELAY_MS",
                wizard_defaults.submit_delay,
            ),
            reset_delay: millis_or(&lookup, "HYBRIDFLOW_RESET_DELAY_MS", wizard_defaults.reset_delay),
        };

        Ok(Self {
            port,
            salesforce,
            slack,
            wizard,
        })
    }
}

fn millis_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring unparseable duration, using default");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.salesforce.login_url, "https://login.salesforce.com");
        assert_eq!(config.slack.api_url, "https://slack.com/api");
        assert_eq!(config.wizard, WizardConfig::default());
    }

    #[test]
    fn reads_provider_settings() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "8080"),
            ("SALESFORCE_LOGIN_URL", "https://test.salesforce.com"),
            ("SALESFORCE_CLIENT_ID", "sf-id"),
            ("SALESFORCE_CLIENT_SECRET", "sf-secret"),
            ("SLACK_CLIENT_SECRET", "slack-secret"),
            ("HYBRIDFLOW_SUBMIT_DELAY_MS", "10"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.salesforce.login_url, "https://test.salesforce.com");
        assert_eq!(config.salesforce.client_id, "sf-id");
        assert_eq!(config.salesforce.client_secret.expose_secret(), "sf-secret");
        assert_eq!(config.slack.client_secret.expose_secret(), "slack-secret");
        assert_eq!(config.wizard.submit_delay, Duration::from_millis(10));
        assert_eq!(config.wizard.reset_delay, Duration::from_millis(3000));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "PORT"));
    }

    #[test]
    fn invalid_delay_falls_back_to_default() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("HYBRIDFLOW_RESET_DELAY_MS", "soon")])).unwrap();
        assert_eq!(config.wizard.reset_delay, Duration::from_millis(3000));
    }
}
