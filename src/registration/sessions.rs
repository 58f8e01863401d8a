//! In-memory registry of open registration sessions.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::wizard::{RegistrationSink, RegistrationWizard, SimulatedSink, WizardEvent};
use crate::config::WizardConfig;
use crate::error::RegistrationError;

/// One wizard per open registration modal, keyed by session id.
pub struct RegistrationSessions {
    sessions: RwLock<HashMap<Uuid, RegistrationWizard>>,
    sink: Arc<dyn RegistrationSink>,
    config: WizardConfig,
}

impl RegistrationSessions {
    pub fn new(sink: Arc<dyn RegistrationSink>, config: WizardConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            sink,
            config,
        })
    }

    /// Sessions that submit to the simulated backend.
    pub fn simulated(config: WizardConfig) -> Arc<Self> {
        Self::new(Arc::new(SimulatedSink::new(config.submit_delay)), config)
    }

    /// Open a new wizard and register it.
    ///
    /// The session is dropped from the registry as soon as the wizard
    /// closes, whether by `DELETE` or by the post-success reset.
    pub async fn create(self: &Arc<Self>) -> RegistrationWizard {
        let wizard = RegistrationWizard::new(Arc::clone(&self.sink), self.config.reset_delay);
        let id = wizard.id();
        let events = wizard.subscribe();
        self.sessions.write().await.insert(id, wizard.clone());
        tokio::spawn(evict_on_close(Arc::downgrade(self), id, events));
        info!(session = %id, "Registration session created");
        wizard
    }

    pub async fn get(&self, id: Uuid) -> Result<RegistrationWizard, RegistrationError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RegistrationError::SessionNotFound)
    }

    /// Close the wizard and forget the session.
    pub async fn remove(&self, id: Uuid) -> Result<(), RegistrationError> {
        let wizard = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(RegistrationError::SessionNotFound)?;
        wizard.close().await;
        info!(session = %id, "Registration session removed");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

async fn evict_on_close(
    registry: Weak<RegistrationSessions>,
    id: Uuid,
    mut events: broadcast::Receiver<WizardEvent>,
) {
    loop {
        match events.recv().await {
            Ok(WizardEvent::Closed) => break,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
            // Wizard already dropped.
            Err(RecvError::Closed) => return,
        }
    }
    let Some(registry) = registry.upgrade() else {
        return;
    };
    if registry.sessions.write().await.remove(&id).is_some() {
        debug!(session = %id, "Closed registration session evicted");
    }
}
