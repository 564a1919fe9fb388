//! SessionGateway trait
//!
//! Implementations handle the actual communication with the LMS backend;
//! the engine only consumes this contract. Grading is server-side: the
//! submit path never needs the correct answers.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::model::{AssessmentDefinition, AssessmentId, CourseId, SubmissionPayload, SubmissionResult};

/// Remote operations a session needs for one attempt
#[async_trait]
pub trait SessionGateway: Send + Sync {
    /// Fetch an assessment definition
    async fn load_definition(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<AssessmentDefinition, GatewayError>;

    /// Whether the learner is enrolled in the course
    async fn check_eligibility(&self, course_id: CourseId) -> Result<bool, GatewayError>;

    /// Submit an attempt's answers and receive the grading result
    async fn submit_attempt(
        &self,
        assessment_id: AssessmentId,
        payload: SubmissionPayload,
    ) -> Result<SubmissionResult, GatewayError>;
}
