//! # Playback Error Types
//!
//! Errors surfaced synchronously by the playback core.
//!
//! Transient conditions (stalls, connection loss) never reach callers as
//! errors: the session controller turns them into state transitions. What is
//! left here is what a host can actually act on: bad input, a missing or
//! failing collaborator, and configuration problems.

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur while configuring or driving playback.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Item & Queue Errors
    // ========================================================================
    /// An audio item was created without any source.
    #[error("An audio item needs at least one source")]
    NoSources,

    /// A queue index was out of range.
    #[error("Index {index} is out of range for a queue of {len} items")]
    InvalidIndex { index: usize, len: usize },

    // ========================================================================
    // Engine Errors
    // ========================================================================
    /// The decode engine refused to load a source.
    #[error("Decode engine failed to load {locator}: {reason}")]
    EngineLoad { locator: String, reason: String },

    /// The operation needs an engine instance that is ready to play.
    #[error("Decode engine is not ready")]
    EngineNotReady,

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Player configuration failed validation.
    #[error("Invalid player configuration: {0}")]
    InvalidConfig(String),

    /// The now-playing session rejected its configuration.
    #[error("Now-playing session configuration failed: {0}")]
    NowPlaying(#[source] BridgeError),

    // ========================================================================
    // Runtime Errors
    // ========================================================================
    /// The player task has shut down.
    #[error("Player is closed")]
    PlayerClosed,

    /// A bridge call failed.
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    /// Runtime wiring failed.
    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),
}

impl PlaybackError {
    /// Returns `true` if retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            PlaybackError::EngineLoad { .. } | PlaybackError::EngineNotReady => true,
            PlaybackError::Bridge(err) => !err.is_configuration_error(),
            _ => false,
        }
    }

    /// Returns `true` for errors caused by how the player was configured.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::InvalidConfig(_) | PlaybackError::NowPlaying(_)
        ) || matches!(self, PlaybackError::Bridge(err) if err.is_configuration_error())
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
