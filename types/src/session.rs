//! Workflow session state for a single check-in attempt.
//!
//! # State Machine
//! ```text
//! Idle -> Validating -> LookingUp -> Persisting -> CapturingEvidence -> Announcing -> Idle
//!             |             |            |
//!             +-------------+------------+----> Idle (with ErrorState)
//! ```
//!
//! `CapturingEvidence` never short-circuits: evidence failures are recorded and
//! the attempt continues to `Announcing`.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    LookingUp,
    Persisting,
    CapturingEvidence,
    Announcing,
}

impl Phase {
    /// The phase that follows `self` on the success path.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::Validating,
            Self::Validating => Self::LookingUp,
            Self::LookingUp => Self::Persisting,
            Self::Persisting => Self::CapturingEvidence,
            Self::CapturingEvidence => Self::Announcing,
            Self::Announcing => Self::Idle,
        }
    }

    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::LookingUp => "looking_up",
            Self::Persisting => "persisting",
            Self::CapturingEvidence => "capturing_evidence",
            Self::Announcing => "announcing",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure an attempt can surface to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyInput,
    InvalidFormat,
    NotRegistered,
    AmbiguousMatch,
    LookupFailed,
    PersistFailed,
    EvidenceUploadFailed,
}

impl ErrorKind {
    /// Whether this error ends the attempt before the announcement.
    #[must_use]
    pub const fn aborts_attempt(self) -> bool {
        !matches!(self, Self::EvidenceUploadFailed)
    }

    /// Whether the identification field keeps its text and is marked for correction.
    #[must_use]
    pub const fn flags_field(self) -> bool {
        matches!(self, Self::EmptyInput | Self::InvalidFormat)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::InvalidFormat => "invalid_format",
            Self::NotRegistered => "not_registered",
            Self::AmbiguousMatch => "ambiguous_match",
            Self::LookupFailed => "lookup_failed",
            Self::PersistFailed => "persist_failed",
            Self::EvidenceUploadFailed => "evidence_upload_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorState {
    pub kind: ErrorKind,
    pub message: String,
    pub field_flagged: bool,
}

/// What the operator sees in the identification field after an attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum InputDisposition {
    Cleared,
    Flagged(String),
}

/// Transient state of one attempt, owned by whoever drives it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkflowSession {
    identification_input: Option<String>,
    phase: Phase,
    error_state: Option<ErrorState>,
}

impl WorkflowSession {
    /// Start an attempt with the operator's raw input.
    #[must_use]
    pub fn begin(input: Option<String>) -> Self {
        Self {
            identification_input: input,
            phase: Phase::Validating,
            error_state: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn identification_input(&self) -> Option<&str> {
        self.identification_input.as_deref()
    }

    #[must_use]
    pub fn error_state(&self) -> Option<&ErrorState> {
        self.error_state.as_ref()
    }

    /// Move one step along the success path.
    pub fn advance(&mut self) -> Phase {
        debug_assert!(!self.phase.is_idle(), "advance called on an idle session");
        self.phase = self.phase.next();
        self.phase
    }

    /// Record an error. Aborting kinds return the session to `Idle` and apply
    /// the input disposition for that kind; non-aborting kinds leave the phase.
    pub fn fail(&mut self, kind: ErrorKind, message: impl Into<String>) {
        let field_flagged = kind.flags_field();
        self.error_state = Some(ErrorState {
            kind,
            message: message.into(),
            field_flagged,
        });
        if kind.aborts_attempt() {
            if !field_flagged {
                self.identification_input = None;
            }
            self.phase = Phase::Idle;
        }
    }

    /// Close a successful attempt: clear the input and return to `Idle`.
    pub fn finish(&mut self) {
        self.identification_input = None;
        self.phase = Phase::Idle;
    }

    #[must_use]
    pub fn input_disposition(&self) -> InputDisposition {
        match (&self.identification_input, &self.error_state) {
            (Some(text), Some(state)) if state.field_flagged => {
                InputDisposition::Flagged(text.clone())
            }
            _ => InputDisposition::Cleared,
        }
    }
}
