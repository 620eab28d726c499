//! Debouncing and supersession of rapid, repeated requests.
//!
//! Every request takes a [RequestTicket] from a shared [RequestGeneration].
//! A response may only be applied while its ticket is still the latest one, so
//! a slow response to an old filter can never overwrite a newer result.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

/// How long input must stay unchanged before a request is sent.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Identifies one request within a [RequestGeneration].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

/// A monotonically increasing counter of issued requests.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration(Arc<AtomicU64>);

impl RequestGeneration {
    /// Create a counter that has not issued any tickets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new request, superseding every earlier ticket.
    pub fn next_ticket(&self) -> RequestTicket {
        RequestTicket(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether no request has been issued since `ticket`.
    pub fn is_latest(&self, ticket: RequestTicket) -> bool {
        self.0.load(Ordering::SeqCst) == ticket.0
    }

    /// Call `apply` with `value` only if `ticket` is still the latest.
    ///
    /// Returns whether `apply` was called.
    pub fn apply_if_latest<T>(
        &self,
        ticket: RequestTicket,
        value: T,
        apply: impl FnOnce(T),
    ) -> bool {
        if !self.is_latest(ticket) {
            tracing::debug!("Discarding stale response for request {}", ticket.0);
            return false;
        }

        apply(value);
        true
    }
}

/// Waits for a quiet period before letting a request through.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet_period: Duration,
    generation: RequestGeneration,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl Debouncer {
    /// Create a debouncer that waits `quiet_period` after each call.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            generation: RequestGeneration::new(),
        }
    }

    /// The counter shared by every call to this debouncer.
    pub fn generation(&self) -> &RequestGeneration {
        &self.generation
    }

    /// Take a ticket and wait out the quiet period.
    ///
    /// Returns the ticket if no other call was made in the meantime, otherwise `None`.
    pub async fn settle(&self) -> Option<RequestTicket> {
        let ticket = self.generation.next_ticket();
        tokio::time::sleep(self.quiet_period).await;

        self.generation.is_latest(ticket).then_some(ticket)
    }

    /// Run `request` once the input has settled.
    ///
    /// Returns `None` if a newer call arrived during the quiet period or while
    /// `request` was running. Failed requests are not retried.
    pub async fn run<F, Fut, T>(&self, request: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let ticket = self.settle().await?;
        let value = request().await;

        self.generation.is_latest(ticket).then_some(value)
    }
}
