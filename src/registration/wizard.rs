//! Registration wizard. Owns one registration session: the record, the step
//! state machine, and the submit/reset timers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::export::{self, ExportFormat, ExportedFile};
use super::model::{RecordPatch, RegistrationRecord};
use super::state::WizardPhase;
use crate::config::WizardConfig;
use crate::error::{self, RegistrationError};

/// Broadcast channel capacity for wizard events.
const EVENT_CAPACITY: usize = 16;

/// Where completed registrations are delivered.
#[async_trait]
pub trait RegistrationSink: Send + Sync {
    async fn submit(&self, record: &RegistrationRecord) -> Result<(), RegistrationError>;
}

/// Stands in for the registration backend: accepts everything after a delay.
pub struct SimulatedSink {
    delay: Duration,
}

impl SimulatedSink {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl RegistrationSink for SimulatedSink {
    async fn submit(&self, record: &RegistrationRecord) -> Result<(), RegistrationError> {
        debug!(email = %record.email, delay_ms = self.delay.as_millis() as u64, "Simulating registration submit");
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Notifications for whoever hosts the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WizardEvent {
    /// The record was accepted by the sink.
    Submitted,
    /// The record was cleared after the success screen timed out.
    Reset,
    /// The host should close the wizard.
    Closed,
}

/// Serializable view of the wizard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub id: Uuid,
    pub phase: WizardPhase,
    pub step: u8,
    pub record: RegistrationRecord,
    pub step_valid: bool,
    pub missing_fields: Vec<&'static str>,
    pub open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct WizardState {
    phase: WizardPhase,
    record: RegistrationRecord,
    open: bool,
    submitted_at: Option<DateTime<Utc>>,
    /// Bumped every time the wizard is opened, closed or reset. Timers only
    /// act if the generation they were scheduled in is still current.
    generation: u64,
}

impl WizardState {
    fn reset(&mut self, open: bool) {
        self.phase = WizardPhase::Identity;
        self.record = RegistrationRecord::default();
        self.submitted_at = None;
        self.open = open;
        self.generation += 1;
    }

    /// Edits need an open wizard on one of the form steps.
    fn ensure_editable(&self) -> Result<(), RegistrationError> {
        if !self.open {
            return Err(RegistrationError::WizardClosed);
        }
        if !self.phase.is_editable() {
            return Err(RegistrationError::RecordFrozen);
        }
        Ok(())
    }

    fn snapshot(&self, id: Uuid) -> WizardSnapshot {
        let step = self.phase.step_number();
        let missing_fields = if self.phase.is_editable() {
            self.record.missing_fields(step)
        } else {
            Vec::new()
        };
        WizardSnapshot {
            id,
            phase: self.phase,
            step,
            record: self.record.clone(),
            step_valid: missing_fields.is_empty(),
            missing_fields,
            open: self.open,
            submitted_at: self.submitted_at,
        }
    }
}

struct WizardInner {
    id: Uuid,
    state: RwLock<WizardState>,
    sink: Arc<dyn RegistrationSink>,
    reset_delay: Duration,
    submit_task: Mutex<Option<AbortHandle>>,
    reset_task: Mutex<Option<AbortHandle>>,
    tx: broadcast::Sender<WizardEvent>,
}

/// Multi-step registration form. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct RegistrationWizard {
    inner: Arc<WizardInner>,
}

impl RegistrationWizard {
    /// Create an open wizard that submits to `sink`.
    pub fn new(sink: Arc<dyn RegistrationSink>, reset_delay: Duration) -> Self {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        let state = WizardState {
            open: true,
            ..Default::default()
        };
        Self {
            inner: Arc::new(WizardInner {
                id: Uuid::new_v4(),
                state: RwLock::new(state),
                sink,
                reset_delay,
                submit_task: Mutex::new(None),
                reset_task: Mutex::new(None),
                tx,
            }),
        }
    }

    /// Create an open wizard backed by the simulated backend.
    pub fn simulated(config: WizardConfig) -> Self {
        Self::new(
            Arc::new(SimulatedSink::new(config.submit_delay)),
            config.reset_delay,
        )
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WizardEvent> {
        self.inner.tx.subscribe()
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        self.inner.state.read().await.snapshot(self.inner.id)
    }

    pub async fn phase(&self) -> WizardPhase {
        self.inner.state.read().await.phase
    }

    /// (Re)open the wizard with an empty record.
    ///
    /// A reset still pending from a previous success is cancelled, so a quick
    /// re-open is never wiped by the old timer.
    pub async fn open(&self) -> WizardSnapshot {
        self.inner.cancel_tasks().await;
        let mut state = self.inner.state.write().await;
        state.reset(true);
        info!(wizard = %self.inner.id, "Registration wizard opened");
        state.snapshot(self.inner.id)
    }

    /// Close the wizard, cancelling any pending submit or reset.
    pub async fn close(&self) {
        self.inner.cancel_tasks().await;
        {
            let mut state = self.inner.state.write().await;
            state.reset(false);
        }
        info!(wizard = %self.inner.id, "Registration wizard closed");
        let _ = self.inner.tx.send(WizardEvent::Closed);
    }

    /// Apply a partial record update.
    pub async fn update(&self, patch: RecordPatch) -> Result<WizardSnapshot, RegistrationError> {
        let mut state = self.inner.state.write().await;
        state.ensure_editable()?;
        state.record.apply(patch)?;
        Ok(state.snapshot(self.inner.id))
    }

    /// Select or deselect an interest.
    pub async fn toggle_interest(
        &self,
        interest: &str,
    ) -> Result<WizardSnapshot, RegistrationError> {
        let mut state = self.inner.state.write().await;
        state.ensure_editable()?;
        let selected = state.record.interests.toggle(interest)?;
        debug!(wizard = %self.inner.id, interest, selected, "Interest toggled");
        Ok(state.snapshot(self.inner.id))
    }

    /// Advance to the next step if the current one is complete.
    pub async fn next(&self) -> Result<WizardSnapshot, RegistrationError> {
        let mut state = self.inner.state.write().await;
        if !state.open {
            return Err(RegistrationError::WizardClosed);
        }
        if !state.phase.is_editable() {
            return Err(RegistrationError::InvalidTransition {
                from: state.phase,
                action: "advance",
            });
        }
        let step = state.phase.step_number();
        let missing = state.record.missing_fields(step);
        if !missing.is_empty() {
            debug!(wizard = %self.inner.id, step, ?missing, "Advance blocked");
            return Err(RegistrationError::StepIncomplete { step, missing });
        }
        state.phase = state.phase.next_step();
        debug!(wizard = %self.inner.id, phase = %state.phase, "Advanced");
        Ok(state.snapshot(self.inner.id))
    }

    /// Go back one step. Never blocked; a no-op outside the form steps or
    /// while closed.
    pub async fn back(&self) -> WizardSnapshot {
        let mut state = self.inner.state.write().await;
        if state.open && state.phase.is_editable() {
            state.phase = state.phase.previous_step();
        }
        state.snapshot(self.inner.id)
    }

    /// Submit the completed record.
    ///
    /// Resolves once the sink has accepted the record and the wizard shows
    /// the success screen. The submission keeps running if the caller stops
    /// waiting; only `close`/`open` cancel it.
    pub async fn submit(&self) -> Result<WizardSnapshot, RegistrationError> {
        let (record, generation) = {
            let mut state = self.inner.state.write().await;
            if !state.open {
                return Err(RegistrationError::WizardClosed);
            }
            if !state.phase.can_transition_to(WizardPhase::Submitting) {
                return Err(RegistrationError::InvalidTransition {
                    from: state.phase,
                    action: "submit",
                });
            }
            for step in 1..=3 {
                let missing = state.record.missing_fields(step);
                if !missing.is_empty() {
                    return Err(RegistrationError::StepIncomplete { step, missing });
                }
            }
            state.phase = WizardPhase::Submitting;
            (state.record.clone(), state.generation)
        };
        info!(wizard = %self.inner.id, email = %record.email, "Submitting registration");

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(inner.finish_submission(record, generation));
        *self.inner.submit_task.lock().await = Some(handle.abort_handle());

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(RegistrationError::Cancelled),
            Err(e) => Err(RegistrationError::Submission(e.to_string())),
        }
    }

    /// Render the submitted record. Only available on the success screen.
    pub async fn export(&self, format: ExportFormat) -> error::Result<ExportedFile> {
        let record = {
            let state = self.inner.state.read().await;
            if state.phase != WizardPhase::Success {
                return Err(RegistrationError::NotSubmitted.into());
            }
            state.record.clone()
        };
        let file = export::export(&record, format, Utc::now())?;
        info!(wizard = %self.inner.id, file = %file.file_name, bytes = file.bytes.len(), "Registration exported");
        Ok(file)
    }
}

impl WizardInner {
    async fn cancel_tasks(&self) {
        for slot in [&self.submit_task, &self.reset_task] {
            if let Some(handle) = slot.lock().await.take() {
                handle.abort();
            }
        }
    }

    async fn finish_submission(
        self: Arc<Self>,
        record: RegistrationRecord,
        generation: u64,
    ) -> Result<WizardSnapshot, RegistrationError> {
        let outcome = self.sink.submit(&record).await;

        let snapshot = {
            let mut state = self.state.write().await;
            if state.generation != generation {
                return Err(RegistrationError::Cancelled);
            }
            if let Err(e) = outcome {
                warn!(wizard = %self.id, error = %e, "Registration submit failed");
                state.phase = WizardPhase::Interests;
                return Err(e);
            }
            state.phase = WizardPhase::Success;
            state.submitted_at = Some(Utc::now());
            state.snapshot(self.id)
        };
        info!(wizard = %self.id, "Registration submitted");
        let _ = self.tx.send(WizardEvent::Submitted);

        self.schedule_reset(generation).await;
        Ok(snapshot)
    }

    async fn schedule_reset(self: &Arc<Self>, generation: u64) {
        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(inner.reset_delay).await;
            {
                let mut state = inner.state.write().await;
                if state.generation != generation {
                    return;
                }
                state.reset(false);
            }
            info!(wizard = %inner.id, "Registration wizard reset after success");
            let _ = inner.tx.send(WizardEvent::Reset);
            let _ = inner.tx.send(WizardEvent::Closed);
        });
        *self.reset_task.lock().await = Some(handle.abort_handle());
    }
}
