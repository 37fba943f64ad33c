//! Workflow engine state machine.
//!
//! # State Machine
//! ```text
//! ┌──────┐ submit ┌────────────┐ ok ┌───────────┐ 1 match ┌────────────┐ written ┌───────────────────┐
//! │ Idle │ ─────> │ Validating │ ─> │ LookingUp │ ──────> │ Persisting │ ──────> │ CapturingEvidence │
//! └──────┘        └────────────┘    └───────────┘         └────────────┘         └───────────────────┘
//!    ^                  │ invalid         │ 0 / error           │ error                    │ always
//!    │                  v                 v                     v                          v
//!    └──────────────── Idle + ErrorState ───────────────────────┘                   ┌────────────┐
//!    └───────────────────────────────────────────────────────────────────────────── │ Announcing │
//!                                                                                   └────────────┘
//! ```
//!
//! One attempt runs at a time. The in-flight flag is claimed with a
//! compare-and-swap before anything else happens, so a submit that races a
//! running attempt is rejected without touching any collaborator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use kiosk_config::DuplicatePolicy;
use kiosk_types::{
    ErrorKind, EvidencePath, FeedbackChannel, Identification, InputDisposition, NoticeKind,
    Phase, Registrant, RegistrantId, WorkflowSession, redact_identification, validate,
};

use crate::evidence::EvidencePipeline;
use crate::ports::{Announcer, RegistrantStore};
use crate::settings::EngineSettings;
use crate::WorkflowError;

/// Feedback state shared between the engine (writer) and the presentation layer.
pub type SharedFeedback = Arc<Mutex<FeedbackChannel>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejected {
    #[error("an attempt is already in flight (phase: {phase})")]
    Busy { phase: Phase },
}

/// The presence change applied by a successful persist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Toggle {
    pub id: RegistrantId,
    pub name: String,
    pub previous_inout: bool,
    pub inout: bool,
}

/// Everything one attempt did, returned once the engine is idle again.
#[derive(Debug, Clone, Serialize)]
pub struct AttemptReport {
    pub attempt_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub session: WorkflowSession,
    pub toggle: Option<Toggle>,
    pub announcement: Option<String>,
    pub evidence: Option<EvidencePath>,
}

impl AttemptReport {
    fn new(attempt_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            attempt_id,
            started_at: now,
            finished_at: now,
            session: WorkflowSession::default(),
            toggle: None,
            announcement: None,
            evidence: None,
        }
    }

    #[must_use]
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.session.error_state().map(|state| state.kind)
    }

    #[must_use]
    pub fn input(&self) -> InputDisposition {
        self.session.input_disposition()
    }

    /// The presence flag was toggled and the result announced.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.toggle.is_some() && self.announcement.is_some()
    }
}

/// Proof that this task owns the engine until dropped.
///
/// Dropping it (normally or because the attempt future was cancelled)
/// publishes `Idle` and then releases the flag.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    phase: &'a watch::Sender<Phase>,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool, phase: &'a watch::Sender<Phase>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self { flag, phase })
    }

    fn publish(&self, phase: Phase) {
        self.phase.send_replace(phase);
        tracing::debug!(%phase, "Phase transition");
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.phase.send_replace(Phase::Idle);
        self.flag.store(false, Ordering::Release);
    }
}

pub struct CheckInEngine {
    settings: EngineSettings,
    registrants: Arc<dyn RegistrantStore>,
    evidence: Option<EvidencePipeline>,
    announcer: Arc<dyn Announcer>,
    feedback: SharedFeedback,
    in_flight: AtomicBool,
    phase: watch::Sender<Phase>,
}

impl CheckInEngine {
    /// An engine without evidence capture. Add it with [`CheckInEngine::with_evidence`].
    #[must_use]
    pub fn new(
        settings: EngineSettings,
        registrants: Arc<dyn RegistrantStore>,
        announcer: Arc<dyn Announcer>,
    ) -> Self {
        let (phase, _) = watch::channel(Phase::Idle);
        Self {
            settings,
            registrants,
            evidence: None,
            announcer,
            feedback: Arc::new(Mutex::new(FeedbackChannel::default())),
            in_flight: AtomicBool::new(false),
            phase,
        }
    }

    pub fn with_evidence(mut self, pipeline: EvidencePipeline) -> Self {
        self.evidence = Some(pipeline);
        self
    }

    pub fn with_feedback(mut self, feedback: SharedFeedback) -> Self {
        self.feedback = feedback;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn feedback(&self) -> SharedFeedback {
        Arc::clone(&self.feedback)
    }

    /// Watch the current phase, e.g. to disable the submit control while busy.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Run one attempt for the operator's input.
    ///
    /// Rejected with [`SubmitRejected::Busy`], and without side effects, when
    /// another attempt is in flight. Otherwise every outcome, including every
    /// error, is returned in the [`AttemptReport`].
    pub async fn submit(&self, input: Option<&str>) -> Result<AttemptReport, SubmitRejected> {
        let Some(guard) = InFlight::acquire(&self.in_flight, &self.phase) else {
            let phase = self.phase();
            tracing::debug!(%phase, "Submit rejected: attempt in flight");
            return Err(SubmitRejected::Busy { phase });
        };

        let attempt_id = Uuid::new_v4();
        let span = tracing::info_span!("attempt", id = %attempt_id);
        let report = self
            .run(&guard, attempt_id, input.map(str::to_owned))
            .instrument(span)
            .await;
        drop(guard);
        Ok(report)
    }

    async fn run(
        &self,
        guard: &InFlight<'_>,
        attempt_id: Uuid,
        input: Option<String>,
    ) -> AttemptReport {
        guard.publish(Phase::Validating);
        self.update_feedback(FeedbackChannel::clear_field_flag);

        let mut report = AttemptReport::new(attempt_id);
        let mut session = WorkflowSession::begin(input);
        if let Err(err) = self.drive(guard, &mut session, &mut report).await {
            self.surface(&mut session, &err);
        }
        debug_assert!(session.phase().is_idle());

        report.session = session;
        report.finished_at = Utc::now();
        tracing::info!(
            outcome = report.error_kind().map_or("ok", ErrorKind::as_str),
            toggled = report.toggle.is_some(),
            "Attempt finished"
        );
        report
    }

    async fn drive(
        &self,
        guard: &InFlight<'_>,
        session: &mut WorkflowSession,
        report: &mut AttemptReport,
    ) -> Result<(), WorkflowError> {
        let identification = validate(session.identification_input(), self.settings.scheme)?;

        self.advance(guard, session);
        let registrant = self.look_up(&identification).await?;

        self.advance(guard, session);
        let inout = registrant.toggled_inout();
        self.persist(&registrant, inout).await?;
        report.toggle = Some(Toggle {
            id: registrant.id.clone(),
            name: registrant.name.clone(),
            previous_inout: registrant.inout,
            inout,
        });

        self.advance(guard, session);
        if let Some(pipeline) = &self.evidence {
            match pipeline.record(&registrant.name).await {
                Ok(path) => {
                    tracing::debug!(path = %path, "Evidence uploaded");
                    report.evidence = Some(path);
                }
                Err(err) => self.surface(session, &err),
            }
        }

        self.advance(guard, session);
        let greeting = self.settings.messages.greeting(inout, &registrant.name);
        self.announcer.speak(&greeting);
        self.update_feedback(|feedback| {
            feedback.show(greeting.clone());
            feedback.report(NoticeKind::Success, greeting.clone(), false);
        });
        report.announcement = Some(greeting);

        session.finish();
        Ok(())
    }

    fn advance(&self, guard: &InFlight<'_>, session: &mut WorkflowSession) {
        guard.publish(session.advance());
    }

    async fn look_up(&self, identification: &Identification) -> Result<Registrant, WorkflowError> {
        tracing::debug!(
            identification = %redact_identification(identification.as_str()),
            "Looking up registrant"
        );
        let matches = self
            .registrants
            .find_by_identification(identification.as_str())
            .await
            .map_err(WorkflowError::LookupFailed)?;

        let count = matches.len();
        if count > 1 {
            match self.settings.duplicate_policy {
                DuplicatePolicy::FirstWins => {
                    tracing::warn!(count, "Duplicate identification; using first match");
                }
                DuplicatePolicy::Reject => return Err(WorkflowError::AmbiguousMatch { count }),
            }
        }
        matches.into_iter().next().ok_or(WorkflowError::NotRegistered)
    }

    /// Write the new flag. When the write errors, optionally read the document
    /// back: a stored flag equal to `inout` means the write landed and only the
    /// acknowledgment was lost.
    async fn persist(&self, registrant: &Registrant, inout: bool) -> Result<(), WorkflowError> {
        let write_err = match self.registrants.merge_inout(&registrant.id, inout).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        if !self.settings.confirm_ambiguous_writes {
            return Err(WorkflowError::PersistFailed(write_err));
        }

        match self.registrants.get(&registrant.id).await {
            Ok(Some(stored)) if stored.inout == inout => {
                tracing::warn!(
                    id = %registrant.id,
                    error = %write_err,
                    "Presence write reported failure but read-back confirms it"
                );
                Ok(())
            }
            Ok(_) => Err(WorkflowError::PersistFailed(write_err)),
            Err(read_err) => {
                tracing::debug!(error = %read_err, "Read-back after failed write also failed");
                Err(WorkflowError::PersistFailed(write_err))
            }
        }
    }

    /// Record `err` on the session and show it to the operator, once.
    fn surface(&self, session: &mut WorkflowSession, err: &WorkflowError) {
        let kind = err.kind();
        let message = self.settings.message_for(kind).to_string();
        if kind.aborts_attempt() {
            tracing::warn!(%kind, error = %err, phase = %session.phase(), "Attempt aborted");
        } else {
            tracing::info!(%kind, error = %err, "Evidence failed; continuing attempt");
        }
        session.fail(kind, message.clone());
        self.update_feedback(|feedback| {
            feedback.report(NoticeKind::Error(kind), message, kind.flags_field());
        });
    }

    fn update_feedback<R>(&self, f: impl FnOnce(&mut FeedbackChannel) -> R) -> R {
        let mut feedback = self.feedback.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut feedback)
    }
}
