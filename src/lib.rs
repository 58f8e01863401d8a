//! HybridFlow: registration wizard, CRM/chat relays and mock analytics.

pub mod analytics;
pub mod config;
pub mod error;
pub mod integrations;
pub mod registration;
pub mod server;
