//! # Playback Orchestration Module
//!
//! Event-driven control of a single audio playback session.
//!
//! ## Overview
//!
//! This module handles:
//! - The playback state machine ([`SessionController`]) and its async handle ([`Player`])
//! - Play queues with normal, repeat and shuffle modes ([`PlaybackQueue`])
//! - Adaptive quality switching driven by buffering interruptions
//! - Timed recovery after stalls and connection loss
//! - Reachability, engine, metadata and hold-to-seek event producers
//! - Now-playing metadata and remote command handling
//!
//! Decoding and rendering stay with the host: the session drives a
//! [`bridge_traits::DecodeEngine`] and reacts to its notifications.

pub mod config;
pub mod controller;
pub mod delegate;
pub mod error;
pub mod events;
pub mod item;
pub mod player;
pub mod producers;
pub mod quality;
pub mod queue;
pub mod retry;
pub mod state;

pub use config::{BufferingStrategy, PlayerConfig, SeekingBehavior, ThresholdMode};
pub use controller::{PlayerSnapshot, SessionController};
pub use delegate::{EventBusDelegate, PlayerDelegate};
pub use error::{PlaybackError, Result};
pub use events::{Event, MetadataEvent, NetworkEvent, QualityEvent, RetryEvent, SeekEvent};
pub use item::{AudioItem, ItemId, ItemMetadata, MetadataField, QualityTier};
pub use player::Player;
pub use producers::{EventProducer, EventSink, Reachability};
pub use quality::{InterruptionWindow, QualityController};
pub use queue::{PlaybackMode, PlaybackQueue};
pub use retry::{RetryController, RetryDecision};
pub use state::{FailureReason, PlaybackState};
