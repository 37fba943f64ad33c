//! Core domain types for the attendance kiosk.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod evidence;
mod feedback;
mod identification;
mod registrant;
mod session;

pub use evidence::{
    CaptureOptions, DEFAULT_CAPTURE_QUALITY, DEFAULT_EVIDENCE_PREFIX, EvidencePath, ImageEncoding,
};
pub use feedback::{
    FadeSequence, FadeStage, FadeTimings, FeedbackChannel, Notice, NoticeId, NoticeKind,
};
pub use identification::{
    DEFAULT_MAX_LENGTH, DEFAULT_MIN_LENGTH, Identification, IdentificationScheme,
    ValidationError, validate,
};
pub use registrant::{Registrant, RegistrantId, redact_identification};
pub use session::{ErrorKind, ErrorState, InputDisposition, Phase, WorkflowSession};
