//! Session gateway abstraction
//!
//! The gateway is the external collaborator boundary: loading assessment
//! definitions, checking enrollment, and submitting answers. Transport,
//! persistence, and grading all live behind it.

pub mod mock;
pub mod traits;

// Re-export key types for convenience
pub use mock::MockGateway;
pub use traits::SessionGateway;
