//! Assessment data model
//!
//! Definitions are immutable once loaded from the gateway; one definition
//! is owned by one session for the lifetime of an attempt and reloaded
//! fresh on retake.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of an assessment
pub type AssessmentId = u64;

/// Identifier of a course
pub type CourseId = u64;

/// Identifier of a question, unique within its definition
pub type QuestionId = u64;

/// Label of one of the four answer options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionLabel {
    A,
    B,
    C,
    D,
}

impl OptionLabel {
    /// All labels in display order
    pub const ALL: [OptionLabel; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Convert to the wire/display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }

    /// Parse from the wire/display string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }
}

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// Present only when the server reveals it: instructor context or
    /// post-submission review. Never required to take the assessment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<OptionLabel>,
    pub marks: u32,
}

impl Question {
    /// Text of the option with the given label
    pub fn option_text(&self, label: OptionLabel) -> &str {
        match label {
            OptionLabel::A => &self.option_a,
            OptionLabel::B => &self.option_b,
            OptionLabel::C => &self.option_c,
            OptionLabel::D => &self.option_d,
        }
    }
}

/// An assessment definition as served by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentDefinition {
    pub id: AssessmentId,
    pub title: String,
    pub course_id: CourseId,
    pub course_title: String,
    pub questions: Vec<Question>,
    /// Duration in minutes; the session counts down `duration * 60` seconds
    pub duration_minutes: u32,
    pub total_marks: u32,
}

impl AssessmentDefinition {
    /// Question identifiers in definition order
    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.questions.iter().map(|q| q.id)
    }

    /// Attempt duration in seconds
    pub fn duration_seconds(&self) -> u64 {
        u64::from(self.duration_minutes) * 60
    }

    /// Find a question by id
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Whether every question id is unique within the definition
    pub fn has_unique_question_ids(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.questions.iter().all(|q| seen.insert(q.id))
    }
}

/// One answer in a submission payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub question_id: QuestionId,
    /// `None` is the empty sentinel for an unanswered question; the server
    /// decides how to score it.
    pub selected_answer: Option<OptionLabel>,
}

/// The serialized answers handed to the gateway on submit
///
/// Covers every question of the definition, in definition order,
/// including unanswered ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionPayload {
    pub answers: Vec<AnswerEntry>,
}

/// Pass/fail status of a graded attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptStatus {
    Passed,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "Passed",
            Self::Failed => "Failed",
        }
    }
}

/// The grading result returned by the gateway for one submission
///
/// Created once per successful submit and immutable afterward; discarded
/// on retake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub marks_obtained: u32,
    pub total_marks: u32,
    pub status: AttemptStatus,
    pub submitted_at: DateTime<Utc>,
}
