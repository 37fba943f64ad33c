//! Check-in/check-out workflow engine for the attendance kiosk.
//!
//! The engine validates an identification, looks the registrant up, toggles
//! their presence flag, captures evidence, and announces the result. Remote
//! collaborators are reached through the traits in [`ports`].

pub mod memory;
pub mod ports;

mod evidence;
mod settings;
mod workflow;

use thiserror::Error;

use kiosk_types::{ErrorKind, EvidencePath, ValidationError};

pub use evidence::EvidencePipeline;
pub use kiosk_config::{DuplicatePolicy, KioskConfig, MessagesConfig};
pub use kiosk_types::{
    FeedbackChannel, InputDisposition, Phase, Registrant, RegistrantId, WorkflowSession,
};
pub use ports::{
    Announcer, CaptureDevice, CaptureError, CapturedImage, EvidenceError, EvidenceStore,
    RegistrantStore, StoreError,
};
pub use settings::EngineSettings;
pub use workflow::{AttemptReport, CheckInEngine, SharedFeedback, SubmitRejected, Toggle};

/// Every way an attempt can go wrong, with its cause attached.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no registrant matches the identification")]
    NotRegistered,
    #[error("{count} registrants share the identification")]
    AmbiguousMatch { count: usize },
    #[error("registrant lookup failed: {0}")]
    LookupFailed(#[source] StoreError),
    #[error("presence update failed: {0}")]
    PersistFailed(#[source] StoreError),
    #[error("evidence capture failed: {0}")]
    Capture(#[source] CaptureError),
    #[error("evidence upload to {path} failed: {source}")]
    Upload {
        path: EvidencePath,
        source: EvidenceError,
    },
}

impl WorkflowError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(ValidationError::EmptyInput) => ErrorKind::EmptyInput,
            Self::Validation(ValidationError::InvalidFormat { .. }) => ErrorKind::InvalidFormat,
            Self::NotRegistered => ErrorKind::NotRegistered,
            Self::AmbiguousMatch { .. } => ErrorKind::AmbiguousMatch,
            Self::LookupFailed(_) => ErrorKind::LookupFailed,
            Self::PersistFailed(_) => ErrorKind::PersistFailed,
            Self::Capture(_) | Self::Upload { .. } => ErrorKind::EvidenceUploadFailed,
        }
    }
}
