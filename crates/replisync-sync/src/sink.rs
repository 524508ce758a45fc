//! Event sinks receiving reconciliation events
//!
//! The reconciler never logs changes directly; it hands every
//! [`SyncEvent`] to an injected sink. Formatting, persistence and rotation are
//! the sink's business.

use replisync_types::{SyncEvent, SyncEventKind};
use tracing::{info, warn};

/// Receives structured events produced during a pass
pub trait EventSink {
    /// Accept one event
    fn record(&mut self, event: SyncEvent);
}

/// Renders events as `tracing` log lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&mut self, event: SyncEvent) {
        match event.kind {
            SyncEventKind::Error => warn!(target: "replisync::events", "{}", event),
            _ => info!(target: "replisync::events", "{}", event),
        }
    }
}

impl EventSink for Vec<SyncEvent> {
    fn record(&mut self, event: SyncEvent) {
        self.push(event);
    }
}

impl<F> EventSink for F
where
    F: FnMut(SyncEvent),
{
    fn record(&mut self, event: SyncEvent) {
        self(event);
    }
}

/// Forwards every event to two sinks
#[derive(Debug, Clone, Default)]
pub struct Tee<A, B> {
    /// First sink, receives a clone of each event
    pub first: A,
    /// Second sink
    pub second: B,
}

impl<A, B> Tee<A, B> {
    /// Combine two sinks
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Split back into the two sinks
    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn record(&mut self, event: SyncEvent) {
        self.first.record(event.clone());
        self.second.record(event);
    }
}
