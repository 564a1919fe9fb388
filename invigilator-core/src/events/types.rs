//! Event type definitions

use serde::{Deserialize, Serialize};

use crate::model::{AssessmentId, AttemptStatus, OptionLabel, QuestionId};
use crate::session::{Phase, SubmitTrigger};

/// Events published by assessment sessions
///
/// This is the surface the surrounding UI layer consumes: the current
/// phase tag, remaining seconds, answer changes, the confirmation hook,
/// and submission outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A session was created for an assessment
    SessionCreated {
        session_id: String,
        assessment_id: AssessmentId,
    },

    /// The session moved to a new phase
    PhaseChanged { session_id: String, phase: Phase },

    /// One second of attempt time elapsed
    TimerTick {
        session_id: String,
        remaining_seconds: u64,
    },

    /// The learner picked an option for a question
    AnswerChanged {
        session_id: String,
        question_id: QuestionId,
        selected: OptionLabel,
    },

    /// Manual submit with unanswered questions; the UI must answer via
    /// `respond_confirmation`
    ConfirmationRequested {
        session_id: String,
        unanswered: usize,
    },

    /// The gateway accepted the submission
    SubmissionAccepted {
        session_id: String,
        trigger: SubmitTrigger,
        marks_obtained: u32,
        total_marks: u32,
        status: AttemptStatus,
    },

    /// The gateway rejected the submission; the session is back in progress
    SubmissionFailed { session_id: String, message: String },

    /// The session was removed
    SessionRemoved { session_id: String, reason: String },
}

impl SessionEvent {
    /// The session this event belongs to
    pub fn session_id(&self) -> &str {
        match self {
            SessionEvent::SessionCreated { session_id, .. } => session_id,
            SessionEvent::PhaseChanged { session_id, .. } => session_id,
            SessionEvent::TimerTick { session_id, .. } => session_id,
            SessionEvent::AnswerChanged { session_id, .. } => session_id,
            SessionEvent::ConfirmationRequested { session_id, .. } => session_id,
            SessionEvent::SubmissionAccepted { session_id, .. } => session_id,
            SessionEvent::SubmissionFailed { session_id, .. } => session_id,
            SessionEvent::SessionRemoved { session_id, .. } => session_id,
        }
    }
}
