//! Error types for invigilator-core

use thiserror::Error;

use crate::model::{CourseId, QuestionId};

/// Top-level error type for invigilator-core
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Event bus error: {0}")]
    EventBus(#[from] EventBusError),
}

/// Errors surfaced by an assessment session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Failed to load assessment: {0}")]
    Load(#[source] GatewayError),

    #[error("Not enrolled in course {course_id}")]
    Ineligible { course_id: CourseId },

    #[error("Unknown question id: {question_id}")]
    InvalidQuestion { question_id: QuestionId },

    #[error("Submission failed: {0}")]
    Submission(#[source] GatewayError),

    #[error("Invalid phase: expected {expected}, got {actual}")]
    InvalidPhase { expected: String, actual: String },

    #[error("Corrupt assessment definition: {0}")]
    CorruptDefinition(String),
}

/// Errors from the session gateway (load, eligibility, submit)
///
/// Typed rather than stringly so the session can classify failures
/// without matching on messages.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors from the event bus
#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event")]
    PublishFailed,
}
