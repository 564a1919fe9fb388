//! Review projection of a graded attempt
//!
//! A pure function from definition, answers, and grading result to the
//! read-only view the UI renders: the score summary plus one per-question
//! breakdown with the learner's pick, the correct answer, and a verdict.

use serde::{Deserialize, Serialize};

use crate::answers::AnswerSet;
use crate::model::{
    AssessmentDefinition, AttemptStatus, OptionLabel, QuestionId, SubmissionResult,
};

/// How one question went
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    Unanswered,
    /// The definition withheld the correct answer, so no comparison is
    /// possible
    Unrevealed,
}

/// Score line of a graded attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub marks_obtained: u32,
    pub total_marks: u32,
    pub status: AttemptStatus,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// One question in the review breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionReview {
    pub question_id: QuestionId,
    pub text: String,
    /// The learner's pick and its option text
    pub selected: Option<OptionLabel>,
    pub selected_text: Option<String>,
    /// The correct answer and its option text, when revealed
    pub correct: Option<OptionLabel>,
    pub correct_text: Option<String>,
    pub marks: u32,
    pub verdict: Verdict,
}

/// Read-only view of a graded attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub assessment_title: String,
    pub course_title: String,
    pub score: ScoreSummary,
    /// One entry per question, in definition order
    pub questions: Vec<QuestionReview>,
}

/// Build the review view for a graded attempt
///
/// Questions come out in definition order. The answers passed in are the
/// frozen set that was submitted.
pub fn project_result(
    definition: &AssessmentDefinition,
    answers: &AnswerSet,
    result: &SubmissionResult,
) -> ResultView {
    let questions = definition
        .questions
        .iter()
        .map(|question| {
            let selected = answers.selected(question.id).flatten();
            let verdict = match (selected, question.correct_answer) {
                (None, _) => Verdict::Unanswered,
                (Some(_), None) => Verdict::Unrevealed,
                (Some(picked), Some(correct)) if picked == correct => Verdict::Correct,
                _ => Verdict::Incorrect,
            };
            QuestionReview {
                question_id: question.id,
                text: question.text.clone(),
                selected,
                selected_text: selected.map(|label| question.option_text(label).to_string()),
                correct: question.correct_answer,
                correct_text: question
                    .correct_answer
                    .map(|label| question.option_text(label).to_string()),
                marks: question.marks,
                verdict,
            }
        })
        .collect();

    ResultView {
        assessment_title: definition.title.clone(),
        course_title: definition.course_title.clone(),
        score: ScoreSummary {
            marks_obtained: result.marks_obtained,
            total_marks: result.total_marks,
            status: result.status,
            submitted_at: result.submitted_at,
        },
        questions,
    }
}
