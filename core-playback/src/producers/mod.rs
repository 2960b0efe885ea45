//! # Event Producers
//!
//! Independent asynchronous sources of [`Event`]s.
//!
//! ## Overview
//!
//! Each producer runs its own tokio task and pushes events into a single
//! [`EventSink`], the unbounded channel drained by the player task. A
//! producer has exactly one registration with the sink:
//!
//! ```text
//! ┌──────────────┐  emit   ┌───────────┐  recv   ┌──────────────────┐
//! │ Network      ├────────>│           │         │                  │
//! │ Seek timer   ├────────>│ EventSink ├────────>│ Player task      │
//! │ Quality timer├────────>│  (mpsc)   │         │  └─ Session      │
//! │ Retry timer  ├────────>│           │         │     Controller   │
//! │ Engine       ├────────>│           │         │                  │
//! │ Item watcher ├────────>│           │         │                  │
//! └──────────────┘         └───────────┘         └──────────────────┘
//! ```
//!
//! ## Stop guarantee
//!
//! Every emitted [`Envelope`] carries a ticket stamped with the epoch of the
//! registration that produced it. `stop()` bumps the epoch before it cancels
//! the task, and the player task drops envelopes whose ticket is no longer
//! current. An event already sitting in the channel when `stop()` returns is
//! therefore never handled.
//!
//! Events of a single producer arrive in emission order; there is no
//! ordering across producers.

mod engine;
mod item;
mod network;
mod quality;
mod retry;
mod seek;

pub use engine::EngineNotifier;
pub use item::ItemWatcher;
pub use network::{NetworkEventProducer, Reachability};
pub use quality::QualityProducer;
pub use retry::RetryProducer;
pub use seek::SeekProducer;

use crate::events::Event;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Which producer an envelope came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProducerKind {
    Network,
    Seek,
    Quality,
    Retry,
    Engine,
    Item,
}

/// Something that can be told to start or stop emitting events.
pub trait EventProducer: Send {
    fn kind(&self) -> ProducerKind;

    /// Start emitting. Starting a running producer is a no-op.
    fn start(&mut self);

    /// Stop emitting. No event emitted before this call is handled after it.
    fn stop(&mut self);

    fn is_producing(&self) -> bool;
}

// ============================================================================
// Sink & Envelopes
// ============================================================================

#[derive(Debug, Clone)]
struct Ticket {
    source: ProducerKind,
    epoch: u64,
    gate: Arc<AtomicU64>,
}

impl Ticket {
    fn is_current(&self) -> bool {
        self.gate.load(Ordering::Acquire) == self.epoch
    }
}

/// An event together with the registration that emitted it.
#[derive(Debug)]
pub struct Envelope {
    event: Event,
    ticket: Ticket,
}

impl Envelope {
    pub fn source(&self) -> ProducerKind {
        self.ticket.source
    }

    /// `false` once the emitting producer was stopped.
    pub fn is_current(&self) -> bool {
        self.ticket.is_current()
    }

    pub fn event(&self) -> &Event {
        &self.event
    }

    pub fn into_event(self) -> Event {
        self.event
    }
}

/// Single listener all producers deliver to.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Envelope>,
}

impl EventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

/// A producer's registration with the sink.
#[derive(Debug)]
pub struct Registration {
    kind: ProducerKind,
    sink: EventSink,
    gate: Arc<AtomicU64>,
}

impl Registration {
    pub fn new(kind: ProducerKind, sink: EventSink) -> Self {
        Self {
            kind,
            sink,
            gate: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emitter bound to the current epoch.
    pub fn issue(&self) -> Emitter {
        Emitter {
            ticket: Ticket {
                source: self.kind,
                epoch: self.gate.load(Ordering::Acquire),
                gate: Arc::clone(&self.gate),
            },
            tx: self.sink.tx.clone(),
        }
    }

    /// Invalidate every emitter and envelope issued so far.
    pub fn revoke(&self) {
        self.gate.fetch_add(1, Ordering::AcqRel);
    }
}

/// Handle a producer task uses to deliver events.
#[derive(Debug, Clone)]
pub struct Emitter {
    ticket: Ticket,
    tx: mpsc::UnboundedSender<Envelope>,
}

impl Emitter {
    /// Deliver an event; returns `false` if revoked or the listener is gone.
    pub fn emit(&self, event: impl Into<Event>) -> bool {
        if !self.ticket.is_current() {
            return false;
        }
        self.tx
            .send(Envelope {
                event: event.into(),
                ticket: self.ticket.clone(),
            })
            .is_ok()
    }
}

// ============================================================================
// Task handling
// ============================================================================

/// The spawned task of a running producer.
#[derive(Debug, Default)]
pub(crate) struct ProducerTask {
    cancel: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
}

impl ProducerTask {
    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    pub(crate) fn spawn<F, Fut>(&mut self, run: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        self.handle = Some(tokio::spawn(run(token.clone())));
        self.cancel = Some(token);
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.handle.take();
    }
}

impl Drop for ProducerTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RetryEvent;

    #[test]
    fn revoked_envelopes_are_stale() {
        let (sink, mut rx) = EventSink::new();
        let registration = Registration::new(ProducerKind::Retry, sink);
        let emitter = registration.issue();

        assert!(emitter.emit(RetryEvent::RetryAvailable));
        registration.revoke();
        assert!(!emitter.emit(RetryEvent::RetryAvailable));

        let envelope = rx.try_recv().unwrap();
        assert_eq!(envelope.source(), ProducerKind::Retry);
        assert!(!envelope.is_current());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn new_emitters_follow_the_latest_epoch() {
        let (sink, mut rx) = EventSink::new();
        let registration = Registration::new(ProducerKind::Seek, sink);
        registration.revoke();

        let emitter = registration.issue();
        assert!(emitter.emit(crate::events::SeekEvent::SeekForward));
        assert!(rx.try_recv().unwrap().is_current());
    }
}
