//! Registration wizard: three-step sign-up form with exports.
//!
//! A user fills in identity, professional, and interest details one step at
//! a time. Each step must be complete before the next one opens. Once the
//! record is submitted it is frozen, can be downloaded as a spreadsheet or a
//! PDF, and is cleared again after a short success screen.

pub mod export;
pub mod model;
pub mod routes;
pub mod sessions;
pub mod state;
pub mod wizard;

pub use export::{ExportFormat, ExportedFile};
pub use model::{INTEREST_OPTIONS, InterestSet, RecordPatch, RegistrationRecord, TeamSize, WorkMode};
pub use routes::registration_routes;
pub use sessions::RegistrationSessions;
pub use state::WizardPhase;
pub use wizard::{
    RegistrationSink, RegistrationWizard, SimulatedSink, WizardEvent, WizardSnapshot,
};
