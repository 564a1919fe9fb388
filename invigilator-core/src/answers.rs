//! AnswerSet: the learner's selections for one attempt
//!
//! The domain of the set always equals the question ids of the current
//! definition; it is re-seeded to all-unanswered whenever a session
//! (re)initializes. Only the learner's answer-selection action mutates it.

use std::collections::HashMap;

use crate::error::SessionError;
use crate::model::{AnswerEntry, OptionLabel, QuestionId, SubmissionPayload};

/// Mapping from question id to the selected option, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerSet {
    /// Question ids in definition order
    order: Vec<QuestionId>,
    /// Selected option per question; `None` is the unanswered sentinel
    selected: HashMap<QuestionId, Option<OptionLabel>>,
}

impl AnswerSet {
    /// Create an empty set (no questions)
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the mapping to all-unanswered for exactly the given ids
    pub fn initialize(&mut self, question_ids: impl IntoIterator<Item = QuestionId>) {
        self.order = question_ids.into_iter().collect();
        self.selected = self.order.iter().map(|id| (*id, None)).collect();
    }

    /// Record the learner's pick for a question
    ///
    /// Overwrites any previous pick (last write wins). Fails with
    /// `InvalidQuestion` if the id is not in the current domain,
    /// leaving the set unchanged.
    pub fn set_answer(
        &mut self,
        question_id: QuestionId,
        option: OptionLabel,
    ) -> Result<(), SessionError> {
        match self.selected.get_mut(&question_id) {
            Some(slot) => {
                *slot = Some(option);
                Ok(())
            }
            None => Err(SessionError::InvalidQuestion { question_id }),
        }
    }

    /// The learner's pick for a question, or `None` if the id is unknown
    pub fn selected(&self, question_id: QuestionId) -> Option<Option<OptionLabel>> {
        self.selected.get(&question_id).copied()
    }

    /// Number of questions still at the unanswered sentinel
    pub fn unanswered_count(&self) -> usize {
        self.selected.values().filter(|v| v.is_none()).count()
    }

    /// Number of questions in the domain
    pub fn question_count(&self) -> usize {
        self.order.len()
    }

    /// Question ids in definition order
    pub fn question_ids(&self) -> &[QuestionId] {
        &self.order
    }

    /// Serialize every question's pick, unanswered included, in
    /// definition order
    pub fn to_submission_payload(&self) -> SubmissionPayload {
        SubmissionPayload {
            answers: self
                .order
                .iter()
                .map(|id| AnswerEntry {
                    question_id: *id,
                    selected_answer: self.selected.get(id).copied().flatten(),
                })
                .collect(),
        }
    }
}
