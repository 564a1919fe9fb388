//! Session lifecycle management
//!
//! The SessionManager owns every live session behind one mutex each and
//! pumps that session's clock events through the same mutex its user
//! operations take. That single lock is the serialization point: a tick,
//! an expiry, and a learner action are applied one at a time in arrival
//! order, which is what makes the at-most-one-submission guarantee hold
//! under concurrency.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

use super::state::{AssessmentSession, Phase};
use crate::error::{EngineError, SessionError};
use crate::events::{EventBus, SessionEvent};
use crate::gateway::SessionGateway;
use crate::model::{AssessmentId, OptionLabel, QuestionId};
use crate::review::ResultView;

/// Manages multiple assessment sessions
pub struct SessionManager {
    /// Active sessions by ID
    sessions: RwLock<HashMap<String, Arc<Mutex<AssessmentSession>>>>,
    /// Gateway shared by every session
    gateway: Arc<dyn SessionGateway>,
    /// Event bus shared by every session
    event_bus: Arc<dyn EventBus>,
}

impl SessionManager {
    /// Create a new SessionManager
    pub fn new(gateway: Arc<dyn SessionGateway>, event_bus: Arc<dyn EventBus>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            gateway,
            event_bus,
        }
    }

    /// Create a session for an assessment and load it
    ///
    /// On success the session is InProgress and its clock is running. A
    /// load failure discards the session; an eligibility rejection keeps
    /// it around in the terminal Ineligible phase.
    pub async fn start_session(&self, assessment_id: AssessmentId) -> Result<String, EngineError> {
        let session_id = Uuid::new_v4().to_string();
        let (clock_tx, clock_rx) = mpsc::unbounded_channel();

        let session = Arc::new(Mutex::new(AssessmentSession::new(
            session_id.clone(),
            assessment_id,
            Arc::clone(&self.gateway),
            Arc::clone(&self.event_bus),
            clock_tx,
        )));

        self.event_bus
            .publish(SessionEvent::SessionCreated {
                session_id: session_id.clone(),
                assessment_id,
            })
            .await;

        self.sessions
            .write()
            .await
            .insert(session_id.clone(), Arc::clone(&session));

        spawn_clock_pump(Arc::downgrade(&session), clock_rx);

        let load_result = session.lock().await.load().await;
        match load_result {
            Ok(()) => {
                tracing::info!(%session_id, assessment_id, "session started");
                Ok(session_id)
            }
            Err(error @ SessionError::Ineligible { .. }) => {
                tracing::warn!(%session_id, error = %error, "learner not eligible");
                Err(error.into())
            }
            Err(error) => {
                tracing::warn!(%session_id, error = %error, "session failed to load");
                self.sessions.write().await.remove(&session_id);
                Err(error.into())
            }
        }
    }

    /// Record an answer in a session
    pub async fn set_answer(
        &self,
        session_id: &str,
        question_id: QuestionId,
        option: OptionLabel,
    ) -> Result<(), EngineError> {
        let session = self.session(session_id).await?;
        session.lock().await.set_answer(question_id, option).await?;
        Ok(())
    }

    /// Manually submit a session's attempt
    pub async fn submit(&self, session_id: &str) -> Result<(), EngineError> {
        let session = self.session(session_id).await?;
        session.lock().await.submit().await?;
        Ok(())
    }

    /// Answer a session's pending submit confirmation
    pub async fn respond_confirmation(
        &self,
        session_id: &str,
        approved: bool,
    ) -> Result<(), EngineError> {
        let session = self.session(session_id).await?;
        session.lock().await.respond_confirmation(approved).await?;
        Ok(())
    }

    /// Start a fresh attempt in a session
    pub async fn retake(&self, session_id: &str) -> Result<(), EngineError> {
        let session = self.session(session_id).await?;
        session.lock().await.retake().await?;
        Ok(())
    }

    /// A session's current phase
    pub async fn phase(&self, session_id: &str) -> Result<Phase, EngineError> {
        let session = self.session(session_id).await?;
        let phase = session.lock().await.phase();
        Ok(phase)
    }

    /// Seconds left in a session's attempt
    pub async fn remaining_seconds(&self, session_id: &str) -> Result<u64, EngineError> {
        let session = self.session(session_id).await?;
        let remaining = session.lock().await.remaining_seconds();
        Ok(remaining)
    }

    /// A session's graded attempt, projected for display
    pub async fn review(&self, session_id: &str) -> Result<ResultView, EngineError> {
        let session = self.session(session_id).await?;
        let view = session.lock().await.review()?;
        Ok(view)
    }

    /// List active session IDs
    pub async fn list_sessions(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Number of active sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Remove a session
    ///
    /// Dropping the session cancels its clock and ends its pump task.
    pub async fn remove_session(&self, session_id: &str, reason: &str) -> Result<(), EngineError> {
        let removed = self.sessions.write().await.remove(session_id);
        if removed.is_none() {
            return Err(SessionError::NotFound(session_id.to_string()).into());
        }

        tracing::info!(%session_id, reason, "session removed");
        self.event_bus
            .publish(SessionEvent::SessionRemoved {
                session_id: session_id.to_string(),
                reason: reason.to_string(),
            })
            .await;
        Ok(())
    }

    async fn session(&self, session_id: &str) -> Result<Arc<Mutex<AssessmentSession>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }
}

/// Deliver clock events into the session, one at a time, through its mutex
///
/// The pump holds only a weak reference: removing the session from the
/// manager drops the last strong one, which cancels the clock, closes the
/// channel, and ends this task.
fn spawn_clock_pump(
    session: std::sync::Weak<Mutex<AssessmentSession>>,
    mut clock_rx: mpsc::UnboundedReceiver<crate::clock::ClockEvent>,
) {
    tokio::spawn(async move {
        while let Some(event) = clock_rx.recv().await {
            let Some(session) = session.upgrade() else {
                break;
            };
            let mut session = session.lock().await;
            if let Err(error) = session.handle_clock(event).await {
                // An expiry-driven submission failed; the session is back
                // in progress awaiting a manual retry
                tracing::warn!(
                    session_id = %session.id(),
                    error = %error,
                    "clock-driven submission failed"
                );
            }
        }
    });
}
