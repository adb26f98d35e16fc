use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Trailing debounce: only the last value scheduled before a quiet period of
/// `delay` is delivered.
///
/// Nothing is spawned. The owner awaits [`Debouncer::fired`] (or polls
/// [`Debouncer::poll_expired`]) on its own task, so a fired value is always
/// applied on the owner's context. Dropping the debouncer discards any
/// pending value.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

#[derive(Debug)]
struct Pending<T> {
    deadline: Instant,
    value: T,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Replace any pending value and restart the quiet period from now.
    pub fn schedule(&mut self, value: T) {
        if self.pending.is_some() {
            trace!("superseding pending debounce");
        }
        self.pending = Some(Pending {
            deadline: Instant::now() + self.delay,
            value,
        });
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|p| p.value)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value if its quiet period has elapsed.
    pub fn poll_expired(&mut self) -> Option<T> {
        let expired = self
            .pending
            .as_ref()
            .is_some_and(|p| p.deadline <= Instant::now());
        if expired {
            self.cancel()
        } else {
            None
        }
    }

    /// Wait for the pending value to fire. Never resolves while nothing is
    /// scheduled.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the pending
    /// value in place, and a `schedule` call in between moves the deadline.
    pub async fn fired(&mut self) -> T {
        loop {
            let Some(deadline) = self.pending.as_ref().map(|p| p.deadline) else {
                return std::future::pending().await;
            };
            sleep_until(deadline).await;
            if let Some(value) = self.poll_expired() {
                return value;
            }
        }
    }
}
