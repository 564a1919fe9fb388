//! Core library for invigilator
//!
//! A timed assessment-taking engine: sessions load a multiple-choice
//! assessment, check enrollment, collect answers against a countdown
//! clock, and submit for server-side grading exactly once per attempt,
//! whether the learner submits or the clock runs out.
//!
//! The main components are:
//! - [`session::AssessmentSession`]: the per-attempt state machine
//! - [`session::SessionManager`]: owns sessions and pumps their clocks
//! - [`gateway::SessionGateway`]: the boundary to the LMS backend
//! - [`events::EventBus`]: how the UI layer observes sessions
//! - [`clock::Clock`]: the cancellable countdown
//! - [`review`]: the read-only projection of a graded attempt

pub mod answers;
pub mod clock;
pub mod error;
pub mod events;
pub mod gateway;
pub mod model;
pub mod review;
pub mod session;

// Re-export key types for convenience
pub use answers::AnswerSet;
pub use clock::{Clock, ClockEvent, ClockEventKind};
pub use error::{EngineError, EventBusError, GatewayError, SessionError};
pub use events::{EventBus, EventSeq, MemoryEventBus, SessionEvent};
pub use gateway::{MockGateway, SessionGateway};
pub use model::{
    AnswerEntry, AssessmentDefinition, AssessmentId, AttemptStatus, CourseId, OptionLabel,
    Question, QuestionId, SubmissionPayload, SubmissionResult,
};
pub use review::{QuestionReview, ResultView, ScoreSummary, Verdict, project_result};
pub use session::{AssessmentSession, Phase, SessionManager, SubmitTrigger, TimerState};
