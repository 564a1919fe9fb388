//! AssessmentSession state machine
//!
//! One session owns everything for one attempt: the definition, the
//! AnswerSet, the Clock, and the eventual SubmissionResult. All entry
//! points take `&mut self`; callers serialize access through one mutex
//! per session, so timer ticks, expiry, and learner actions collapse into
//! a single ordered stream of transitions. Manual submit and clock expiry
//! converge on the same finalize routine, which submits at most once per
//! attempt regardless of trigger source.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::answers::AnswerSet;
use crate::clock::{Clock, ClockEvent, ClockEventKind};
use crate::error::SessionError;
use crate::events::{EventBus, SessionEvent};
use crate::gateway::SessionGateway;
use crate::model::{AssessmentDefinition, AssessmentId, OptionLabel, QuestionId, SubmissionResult};
use crate::review::{ResultView, project_result};

/// Phase of an assessment session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Fetching the definition and eligibility
    Loading,
    /// Learner is not enrolled; terminal for this attempt
    Ineligible,
    /// Attempt underway: answers mutable, clock running
    InProgress,
    /// Manual submit with unanswered questions; waiting for the
    /// learner's yes/no
    ConfirmingSubmit { unanswered: usize },
    /// Finalize underway: answers frozen, submit call in flight
    Submitting,
    /// Read-only review of the graded attempt
    Reviewing,
}

impl Phase {
    /// Phase name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Loading => "Loading",
            Phase::Ineligible => "Ineligible",
            Phase::InProgress => "InProgress",
            Phase::ConfirmingSubmit { .. } => "ConfirmingSubmit",
            Phase::Submitting => "Submitting",
            Phase::Reviewing => "Reviewing",
        }
    }
}

/// What caused a finalize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitTrigger {
    /// The learner asked to submit
    Manual,
    /// The clock reached zero
    Timeout,
}

/// Countdown state of the current attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining_seconds: u64,
    pub running: bool,
}

impl TimerState {
    fn stopped() -> Self {
        Self {
            remaining_seconds: 0,
            running: false,
        }
    }
}

/// One learner's run through one assessment
pub struct AssessmentSession {
    /// Unique session identifier
    id: String,
    /// The assessment being taken
    assessment_id: AssessmentId,
    /// Current phase
    phase: Phase,
    /// Definition, present once loaded; reloaded fresh on retake
    definition: Option<AssessmentDefinition>,
    /// The learner's selections for the current attempt
    answers: AnswerSet,
    /// Countdown state
    timer: TimerState,
    /// Attempt generation; clock events from older attempts are discarded
    attempt: u64,
    /// Set when finalize first runs for this attempt; suppresses any
    /// further automatic (timeout) submission
    finalize_started: bool,
    /// Grading result once a submit succeeded
    result: Option<SubmissionResult>,
    /// The running clock, if any; never reused across attempts
    clock: Option<Clock>,
    /// Channel new clocks deliver into
    clock_tx: mpsc::UnboundedSender<ClockEvent>,
    /// External collaborator for load/eligibility/submit
    gateway: Arc<dyn SessionGateway>,
    /// Event bus for the UI layer
    event_bus: Arc<dyn EventBus>,
}

impl AssessmentSession {
    /// Create a session in the Loading phase
    pub fn new(
        id: impl Into<String>,
        assessment_id: AssessmentId,
        gateway: Arc<dyn SessionGateway>,
        event_bus: Arc<dyn EventBus>,
        clock_tx: mpsc::UnboundedSender<ClockEvent>,
    ) -> Self {
        Self {
            id: id.into(),
            assessment_id,
            phase: Phase::Loading,
            definition: None,
            answers: AnswerSet::new(),
            timer: TimerState::stopped(),
            attempt: 0,
            finalize_started: false,
            result: None,
            clock: None,
            clock_tx,
            gateway,
            event_bus,
        }
    }

    /// Get the session ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The assessment this session is taking
    pub fn assessment_id(&self) -> AssessmentId {
        self.assessment_id
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current countdown state
    pub fn timer(&self) -> TimerState {
        self.timer
    }

    /// Seconds left in the current attempt
    pub fn remaining_seconds(&self) -> u64 {
        self.timer.remaining_seconds
    }

    /// Attempt generation (starts at 1 after the first load)
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// The loaded definition, if any
    pub fn definition(&self) -> Option<&AssessmentDefinition> {
        self.definition.as_ref()
    }

    /// The learner's answers
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// The grading result, once Reviewing
    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    /// Fetch the definition and eligibility, then start the attempt
    ///
    /// Fails with `Load` if either fetch fails and with `Ineligible`
    /// (moving the session to the terminal Ineligible phase) if the
    /// learner is not enrolled.
    pub async fn load(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Loading {
            return Err(self.invalid_phase("Loading"));
        }
        self.initialize().await
    }

    /// Record the learner's pick for a question
    pub async fn set_answer(
        &mut self,
        question_id: QuestionId,
        option: OptionLabel,
    ) -> Result<(), SessionError> {
        // Answers are frozen the instant Submitting begins
        if self.phase != Phase::InProgress {
            return Err(self.invalid_phase("InProgress"));
        }
        self.answers.set_answer(question_id, option)?;
        self.publish(SessionEvent::AnswerChanged {
            session_id: self.id.clone(),
            question_id,
            selected: option,
        })
        .await;
        Ok(())
    }

    /// Manual submit
    ///
    /// With unanswered questions the session parks in ConfirmingSubmit
    /// until `respond_confirmation` is called; otherwise it finalizes
    /// right away. A repeated call while Submitting or Reviewing is
    /// ignored.
    pub async fn submit(&mut self) -> Result<(), SessionError> {
        match self.phase {
            Phase::InProgress => {}
            Phase::Submitting | Phase::Reviewing => return Ok(()),
            _ => return Err(self.invalid_phase("InProgress")),
        }

        let unanswered = self.answers.unanswered_count();
        if unanswered > 0 {
            self.set_phase(Phase::ConfirmingSubmit { unanswered }).await;
            self.publish(SessionEvent::ConfirmationRequested {
                session_id: self.id.clone(),
                unanswered,
            })
            .await;
            return Ok(());
        }

        self.finalize(SubmitTrigger::Manual).await
    }

    /// Answer a pending submit confirmation
    ///
    /// Declining returns to InProgress with no side effects.
    pub async fn respond_confirmation(&mut self, approved: bool) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::ConfirmingSubmit { .. }) {
            return Err(self.invalid_phase("ConfirmingSubmit"));
        }
        if approved {
            self.finalize(SubmitTrigger::Manual).await
        } else {
            self.set_phase(Phase::InProgress).await;
            Ok(())
        }
    }

    /// Deliver a clock event
    ///
    /// Ticks update the remaining time; the terminal expiry triggers the
    /// automatic submission, which skips confirmation entirely. Events
    /// from a previous attempt's clock are discarded.
    pub async fn handle_clock(&mut self, event: ClockEvent) -> Result<(), SessionError> {
        if event.attempt != self.attempt {
            return Ok(());
        }

        match event.kind {
            ClockEventKind::Tick { remaining_seconds } => {
                if matches!(self.phase, Phase::InProgress | Phase::ConfirmingSubmit { .. }) {
                    self.timer.remaining_seconds = remaining_seconds;
                    self.publish(SessionEvent::TimerTick {
                        session_id: self.id.clone(),
                        remaining_seconds,
                    })
                    .await;
                }
                Ok(())
            }
            ClockEventKind::Expired => {
                self.timer.remaining_seconds = 0;
                self.timer.running = false;

                // Once finalize has run for this attempt - even if that
                // submission failed - no further automatic attempt is
                // scheduled; retrying is the learner's call.
                if self.finalize_started {
                    return Ok(());
                }
                if !matches!(self.phase, Phase::InProgress | Phase::ConfirmingSubmit { .. }) {
                    return Ok(());
                }

                tracing::info!(session_id = %self.id, "time expired, auto-submitting");
                self.finalize(SubmitTrigger::Timeout).await
            }
        }
    }

    /// Discard the current result and answers and start a fresh attempt
    ///
    /// Goes through the same initialization path as the original load:
    /// the definition is re-fetched and eligibility re-checked. Allowed
    /// from Reviewing, and idempotently from the fresh InProgress a
    /// retake produces.
    pub async fn retake(&mut self) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::Reviewing | Phase::InProgress) {
            return Err(self.invalid_phase("Reviewing"));
        }
        tracing::info!(session_id = %self.id, attempt = self.attempt, "retaking assessment");
        self.initialize().await
    }

    /// Project the graded attempt for display
    pub fn review(&self) -> Result<ResultView, SessionError> {
        if self.phase != Phase::Reviewing {
            return Err(self.invalid_phase("Reviewing"));
        }
        let (Some(definition), Some(result)) = (&self.definition, &self.result) else {
            return Err(self.invalid_phase("Reviewing"));
        };
        Ok(project_result(definition, &self.answers, result))
    }

    /// Shared initialization path for load and retake
    async fn initialize(&mut self) -> Result<(), SessionError> {
        let definition = self
            .gateway
            .load_definition(self.assessment_id)
            .await
            .map_err(SessionError::Load)?;

        if !definition.has_unique_question_ids() {
            return Err(SessionError::CorruptDefinition(format!(
                "duplicate question id in assessment {}",
                self.assessment_id
            )));
        }

        let eligible = self
            .gateway
            .check_eligibility(definition.course_id)
            .await
            .map_err(SessionError::Load)?;

        if !eligible {
            let course_id = definition.course_id;
            self.set_phase(Phase::Ineligible).await;
            return Err(SessionError::Ineligible { course_id });
        }

        self.begin_attempt(definition).await;
        Ok(())
    }

    /// Seed answers, start a fresh clock, and enter InProgress
    async fn begin_attempt(&mut self, definition: AssessmentDefinition) {
        self.attempt += 1;
        self.finalize_started = false;
        self.result = None;

        let question_ids: Vec<QuestionId> = definition.question_ids().collect();
        self.answers.initialize(question_ids);

        let duration = definition.duration_seconds();
        self.timer = TimerState {
            remaining_seconds: duration,
            running: true,
        };

        // The previous attempt's clock, if any, must never fire into
        // this one
        if let Some(old) = self.clock.take() {
            old.cancel();
        }
        self.clock = Some(Clock::start(duration, self.attempt, self.clock_tx.clone()));

        self.definition = Some(definition);
        self.set_phase(Phase::InProgress).await;
    }

    /// The single submission path for both triggers
    ///
    /// A trigger arriving after the phase has already advanced is
    /// ignored, so the attempt submits at most once at a time.
    async fn finalize(&mut self, trigger: SubmitTrigger) -> Result<(), SessionError> {
        if !matches!(self.phase, Phase::InProgress | Phase::ConfirmingSubmit { .. }) {
            return Ok(());
        }

        self.finalize_started = true;
        if let Some(clock) = self.clock.take() {
            clock.cancel();
        }
        self.timer.running = false;
        self.set_phase(Phase::Submitting).await;

        let payload = self.answers.to_submission_payload();
        tracing::info!(
            session_id = %self.id,
            ?trigger,
            unanswered = self.answers.unanswered_count(),
            "submitting attempt"
        );

        match self.gateway.submit_attempt(self.assessment_id, payload).await {
            Ok(result) => {
                self.publish(SessionEvent::SubmissionAccepted {
                    session_id: self.id.clone(),
                    trigger,
                    marks_obtained: result.marks_obtained,
                    total_marks: result.total_marks,
                    status: result.status,
                })
                .await;
                self.result = Some(result);
                self.set_phase(Phase::Reviewing).await;
                Ok(())
            }
            Err(error) => {
                tracing::warn!(session_id = %self.id, error = %error, "submission failed");
                self.publish(SessionEvent::SubmissionFailed {
                    session_id: self.id.clone(),
                    message: error.to_string(),
                })
                .await;
                // Elapsed time is not refunded: the clock stays consumed
                // and the learner decides whether to retry
                self.set_phase(Phase::InProgress).await;
                Err(SessionError::Submission(error))
            }
        }
    }

    async fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
        self.publish(SessionEvent::PhaseChanged {
            session_id: self.id.clone(),
            phase,
        })
        .await;
    }

    async fn publish(&self, event: SessionEvent) {
        self.event_bus.publish(event).await;
    }

    fn invalid_phase(&self, expected: &str) -> SessionError {
        SessionError::InvalidPhase {
            expected: expected.to_string(),
            actual: self.phase.name().to_string(),
        }
    }
}
