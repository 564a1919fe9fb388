//! Assessment session state machine and management

pub mod manager;
pub mod state;

// Re-export key types for convenience
pub use manager::SessionManager;
pub use state::{AssessmentSession, Phase, SubmitTrigger, TimerState};
