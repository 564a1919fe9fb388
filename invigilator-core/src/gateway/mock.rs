//! Mock gateway for testing
//!
//! MockGateway allows scripting gateway behavior for unit tests, enabling
//! fast, deterministic testing of session logic. Submit outcomes are
//! queued with `queue_submit_result()` / `queue_submit_error()`; each
//! `submit_attempt` consumes one. Every submit call is recorded so tests
//! can observe exactly-once submission.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::traits::SessionGateway;
use crate::error::GatewayError;
use crate::model::{
    AssessmentDefinition, AssessmentId, AttemptStatus, CourseId, SubmissionPayload,
    SubmissionResult,
};

/// Mock implementation of SessionGateway for testing
pub struct MockGateway {
    /// Definitions served by `load_definition`
    definitions: Mutex<HashMap<AssessmentId, AssessmentDefinition>>,
    /// Enrollment per course; unknown courses default to eligible
    eligibility: Mutex<HashMap<CourseId, bool>>,
    /// Queued submit outcomes (each submit consumes one)
    submit_outcomes: Mutex<VecDeque<Result<SubmissionResult, GatewayError>>>,
    /// Recorded submit calls
    submit_calls: Mutex<Vec<(AssessmentId, SubmissionPayload)>>,
    /// Delay applied before each submit resolves (for concurrency tests)
    submit_delay: Option<Duration>,
}

impl MockGateway {
    /// Create an empty MockGateway
    pub fn new() -> Self {
        Self {
            definitions: Mutex::new(HashMap::new()),
            eligibility: Mutex::new(HashMap::new()),
            submit_outcomes: Mutex::new(VecDeque::new()),
            submit_calls: Mutex::new(Vec::new()),
            submit_delay: None,
        }
    }

    /// Create a MockGateway serving one definition
    pub fn with_definition(definition: AssessmentDefinition) -> Self {
        let gateway = Self::new();
        gateway.insert_definition(definition);
        gateway
    }

    /// Delay every submit by the given duration
    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = Some(delay);
        self
    }

    /// Serve (or replace) a definition
    pub fn insert_definition(&self, definition: AssessmentDefinition) {
        self.definitions
            .lock()
            .unwrap()
            .insert(definition.id, definition);
    }

    /// Script enrollment for a course
    pub fn set_eligibility(&self, course_id: CourseId, enrolled: bool) {
        self.eligibility.lock().unwrap().insert(course_id, enrolled);
    }

    /// Queue a grading result for the next submit
    pub fn queue_submit_result(&self, result: SubmissionResult) {
        self.submit_outcomes.lock().unwrap().push_back(Ok(result));
    }

    /// Queue a failure for the next submit
    pub fn queue_submit_error(&self, error: GatewayError) {
        self.submit_outcomes.lock().unwrap().push_back(Err(error));
    }

    /// Number of submit calls observed
    pub fn submit_call_count(&self) -> usize {
        self.submit_calls.lock().unwrap().len()
    }

    /// Recorded submit calls (assessment id and payload)
    pub fn submit_calls(&self) -> Vec<(AssessmentId, SubmissionPayload)> {
        self.submit_calls.lock().unwrap().clone()
    }

    /// Build a graded result (convenience for tests)
    pub fn graded(marks_obtained: u32, total_marks: u32, status: AttemptStatus) -> SubmissionResult {
        SubmissionResult {
            marks_obtained,
            total_marks,
            status,
            submitted_at: Utc::now(),
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionGateway for MockGateway {
    async fn load_definition(
        &self,
        assessment_id: AssessmentId,
    ) -> Result<AssessmentDefinition, GatewayError> {
        self.definitions
            .lock()
            .unwrap()
            .get(&assessment_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("assessment {assessment_id}")))
    }

    async fn check_eligibility(&self, course_id: CourseId) -> Result<bool, GatewayError> {
        Ok(self
            .eligibility
            .lock()
            .unwrap()
            .get(&course_id)
            .copied()
            .unwrap_or(true))
    }

    async fn submit_attempt(
        &self,
        assessment_id: AssessmentId,
        payload: SubmissionPayload,
    ) -> Result<SubmissionResult, GatewayError> {
        if let Some(delay) = self.submit_delay {
            tokio::time::sleep(delay).await;
        }

        self.submit_calls
            .lock()
            .unwrap()
            .push((assessment_id, payload));

        self.submit_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GatewayError::Validation(
                    "no queued submit outcome in MockGateway".to_string(),
                ))
            })
    }
}
