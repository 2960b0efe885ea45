//! # Session Events
//!
//! Everything a producer can tell the session controller, as one closed
//! tagged union with a variant per producer family. The controller matches
//! on it exhaustively; new engine notifications are absorbed by the
//! `#[non_exhaustive]` [`EngineNotification`] enum.

use crate::item::{ItemId, MetadataField};
use bridge_traits::EngineNotification;

/// Reachability changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The network became unreachable.
    ConnectionLost,
    /// The network became reachable again.
    ConnectionRetrieved,
    /// Reachable before and after, over a different interface.
    NetworkChanged,
}

/// Ticks of the hold-to-seek timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekEvent {
    SeekBackward,
    SeekForward,
}

/// Quality adjustment decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityEvent {
    GoDown,
    GoUp,
}

/// Retry timer outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryEvent {
    /// Time for another recovery attempt.
    RetryAvailable,
    /// The retry budget is spent.
    RetryFailed,
}

/// A metadata field of an item changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataEvent {
    pub item: ItemId,
    pub field: MetadataField,
}

/// Anything that happened that the session controller may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Network(NetworkEvent),
    Seek(SeekEvent),
    Quality(QualityEvent),
    Retry(RetryEvent),
    Engine(EngineNotification),
    Item(MetadataEvent),
}

impl From<NetworkEvent> for Event {
    fn from(event: NetworkEvent) -> Self {
        Event::Network(event)
    }
}

impl From<SeekEvent> for Event {
    fn from(event: SeekEvent) -> Self {
        Event::Seek(event)
    }
}

impl From<QualityEvent> for Event {
    fn from(event: QualityEvent) -> Self {
        Event::Quality(event)
    }
}

impl From<RetryEvent> for Event {
    fn from(event: RetryEvent) -> Self {
        Event::Retry(event)
    }
}

impl From<EngineNotification> for Event {
    fn from(notification: EngineNotification) -> Self {
        Event::Engine(notification)
    }
}

impl From<MetadataEvent> for Event {
    fn from(event: MetadataEvent) -> Self {
        Event::Item(event)
    }
}
