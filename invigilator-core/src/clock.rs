//! Cancellable countdown clock
//!
//! A Clock counts an attempt's remaining seconds down on a spawned task,
//! delivering one decrement event per elapsed second and a single terminal
//! expiry event into the session's clock channel. A Clock is never reused:
//! retake and reload construct a fresh instance, and every event carries
//! the attempt generation it was started for so a lingering timer can
//! never fire into a stale attempt.

use tokio::sync::mpsc;
use tokio::time::{Duration, interval};
use tokio_util::sync::CancellationToken;

/// What the clock observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEventKind {
    /// One second elapsed
    Tick { remaining_seconds: u64 },
    /// The countdown reached zero; emitted exactly once, after which the
    /// clock stops
    Expired,
}

/// A clock event, tagged with the attempt it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockEvent {
    pub attempt: u64,
    pub kind: ClockEventKind,
}

/// Handle to a running countdown
pub struct Clock {
    cancel: CancellationToken,
}

impl Clock {
    /// Start counting down `duration_seconds`, delivering events on `tx`
    ///
    /// A zero duration delivers the terminal expiry immediately.
    pub fn start(
        duration_seconds: u64,
        attempt: u64,
        tx: mpsc::UnboundedSender<ClockEvent>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(run_countdown(duration_seconds, attempt, tx, token));
        Self { cancel }
    }

    /// Stop the countdown
    ///
    /// Idempotent; safe before the first tick and after expiry.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for Clock {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_countdown(
    duration_seconds: u64,
    attempt: u64,
    tx: mpsc::UnboundedSender<ClockEvent>,
    token: CancellationToken,
) {
    let mut remaining = duration_seconds;

    if remaining == 0 {
        let _ = tx.send(ClockEvent {
            attempt,
            kind: ClockEventKind::Expired,
        });
        return;
    }

    let mut ticker = interval(Duration::from_secs(1));
    // The first interval tick completes immediately; consume it so each
    // later tick marks one elapsed second. A delayed tick is delivered
    // late rather than dropped, so every elapsed second decrements
    // exactly once.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {
                remaining -= 1;
                let sent = tx.send(ClockEvent {
                    attempt,
                    kind: ClockEventKind::Tick { remaining_seconds: remaining },
                });
                if sent.is_err() {
                    // Session is gone; stop counting
                    return;
                }
                if remaining == 0 {
                    let _ = tx.send(ClockEvent {
                        attempt,
                        kind: ClockEventKind::Expired,
                    });
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Paused-time tests: the tokio runtime auto-advances the clock when
    // all tasks are idle, so countdowns complete instantly and
    // deterministically.

    #[tokio::test(start_paused = true)]
    async fn counts_down_one_tick_per_second_then_expires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _clock = Clock::start(3, 1, tx);

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event.kind);
        }

        assert_eq!(
            events,
            vec![
                ClockEventKind::Tick {
                    remaining_seconds: 2
                },
                ClockEventKind::Tick {
                    remaining_seconds: 1
                },
                ClockEventKind::Tick {
                    remaining_seconds: 0
                },
                ClockEventKind::Expired,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_is_emitted_exactly_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _clock = Clock::start(2, 1, tx);

        let mut expiries = 0;
        while let Some(event) = rx.recv().await {
            if event.kind == ClockEventKind::Expired {
                expiries += 1;
            }
        }

        assert_eq!(expiries, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_expires_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _clock = Clock::start(0, 1, tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind, ClockEventKind::Expired);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn events_carry_attempt_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _clock = Clock::start(0, 42, tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.attempt, 42);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_the_countdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Clock::start(600, 1, tx);

        // Let at least one tick through, then cancel
        let first = rx.recv().await.unwrap();
        assert_eq!(
            first.kind,
            ClockEventKind::Tick {
                remaining_seconds: 599
            }
        );

        clock.cancel();

        // The channel closes without an expiry event
        while let Some(event) = rx.recv().await {
            assert_ne!(event.kind, ClockEventKind::Expired);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_safe_after_expiry() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Clock::start(0, 1, tx);

        // Drain to expiry
        while rx.recv().await.is_some() {}

        clock.cancel();
        clock.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_the_countdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock = Clock::start(600, 1, tx);
        drop(clock);

        // At most the tick that raced the drop; never an expiry
        while let Some(event) = rx.recv().await {
            assert_ne!(event.kind, ClockEventKind::Expired);
        }
    }
}
