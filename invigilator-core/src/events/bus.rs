//! EventBus trait definition
//!
//! The bus is how the engine surfaces session activity to the UI layer:
//! phase changes, timer ticks, answer changes, confirmation requests, and
//! submission outcomes, with replay support for late joiners.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::SessionEvent;

/// Sequence number for events (monotonically increasing)
pub type EventSeq = u64;

/// Event bus for publishing and subscribing to SessionEvents
///
/// Implementations must support:
/// - Publishing events with sequence numbers
/// - Live subscriptions via broadcast channel
/// - Historical replay for late joiners
/// - Session-scoped event retrieval
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event, returns its sequence number
    async fn publish(&self, event: SessionEvent) -> EventSeq;

    /// Subscribe to all events from now (live stream)
    fn subscribe(&self) -> broadcast::Receiver<(EventSeq, SessionEvent)>;

    /// Get all events starting from a sequence number (for replay)
    async fn events_from(&self, seq: EventSeq) -> Vec<(EventSeq, SessionEvent)>;

    /// Get all events for a specific session (for late joiners)
    async fn session_events(&self, session_id: &str) -> Vec<(EventSeq, SessionEvent)>;

    /// Current sequence number (high water mark)
    fn current_seq(&self) -> EventSeq;
}
