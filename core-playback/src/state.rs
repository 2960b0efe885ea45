//! Playback state of a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a session ended up in [`PlaybackState::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The retry budget ran out before playback could restart.
    MaximumRetryCountHit,
    /// The engine reported a playback error.
    EngineError(String),
    /// The engine could not create an instance for the item.
    EngineUnavailable(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::MaximumRetryCountHit => write!(f, "maximum retry count hit"),
            FailureReason::EngineError(msg) => write!(f, "engine error: {}", msg),
            FailureReason::EngineUnavailable(msg) => write!(f, "engine unavailable: {}", msg),
        }
    }
}

/// The single authoritative state of a playback session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Buffering,
    Playing,
    Paused,
    WaitingForConnection,
    Failed(FailureReason),
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, PlaybackState::Paused)
    }

    pub fn is_buffering(&self) -> bool {
        matches!(self, PlaybackState::Buffering)
    }

    pub fn is_waiting_for_connection(&self) -> bool {
        matches!(self, PlaybackState::WaitingForConnection)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, PlaybackState::Stopped)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PlaybackState::Failed(_))
    }

    /// Short label used in logs and on the event bus.
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Buffering => "Buffering",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
            PlaybackState::WaitingForConnection => "WaitingForConnection",
            PlaybackState::Failed(_) => "Failed",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackState::Failed(reason) => write!(f, "Failed({})", reason),
            other => f.write_str(other.label()),
        }
    }
}
