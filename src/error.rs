//! Error types for HybridFlow.

use crate::integrations::Provider;
use crate::registration::WizardPhase;

/// Error from a wizard operation that may also render an export.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while relaying calls to Salesforce or Slack.
#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    /// Bad credentials, or the provider rejected the exchange.
    #[error("Authentication failed for {provider}")]
    AuthenticationFailed { provider: Provider },

    /// A resource call was made before any successful authentication.
    #[error("Not authenticated with {provider}")]
    Unauthenticated { provider: Provider },

    /// The provider answered with an error status or could not be reached.
    #[error("{provider} request failed: {reason}")]
    Upstream { provider: Provider, reason: String },
}

/// Registration wizard errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Step {step} is incomplete: missing {}", .missing.join(", "))]
    StepIncomplete { step: u8, missing: Vec<&'static str> },

    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: WizardPhase,
        action: &'static str,
    },

    #[error("Registration record is frozen after submission")]
    RecordFrozen,

    #[error("Registration wizard is closed")]
    WizardClosed,

    #[error("Invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("Registration has not been submitted yet")]
    NotSubmitted,

    #[error("Submission cancelled because the wizard was closed")]
    Cancelled,

    #[error("Registration session not found")]
    SessionNotFound,

    #[error("Submission failed: {0}")]
    Submission(String),
}

/// Export rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Spreadsheet export failed: {0}")]
    Spreadsheet(String),

    #[error("Document export failed: {0}")]
    Document(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
