//! Now-playing session and remote transport commands.
//!
//! The OS-level media surface (lock screen, Control Center, MPRIS, media
//! notification) shows what is playing and forwards transport commands back
//! to the core.

use crate::error::Result;
use crate::playback::Artwork;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Remote command kinds a host can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteCommand {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    ChangeRepeatMode,
    ChangePlaybackRate,
    ChangePlaybackPosition,
    SeekBackward,
    SeekForward,
    SkipBackward,
    SkipForward,
}

impl RemoteCommand {
    pub fn all() -> Vec<RemoteCommand> {
        vec![
            RemoteCommand::Play,
            RemoteCommand::Pause,
            RemoteCommand::Stop,
            RemoteCommand::TogglePlayPause,
            RemoteCommand::NextTrack,
            RemoteCommand::PreviousTrack,
            RemoteCommand::ChangeRepeatMode,
            RemoteCommand::ChangePlaybackRate,
            RemoteCommand::ChangePlaybackPosition,
            RemoteCommand::SeekBackward,
            RemoteCommand::SeekForward,
            RemoteCommand::SkipBackward,
            RemoteCommand::SkipForward,
        ]
    }
}

/// Repeat setting requested from the media surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatType {
    Off,
    One,
    All,
}

/// Press-and-hold phase of a seek command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekPhase {
    Begin,
    End,
}

/// A command received from the media surface, with its payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommandEvent {
    Play,
    Pause,
    Stop,
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    ChangeRepeatMode(RepeatType),
    ChangePlaybackRate(f32),
    ChangePlaybackPosition(Duration),
    SeekBackward(SeekPhase),
    SeekForward(SeekPhase),
    SkipBackward(Duration),
    SkipForward(Duration),
}

impl RemoteCommandEvent {
    pub fn command(&self) -> RemoteCommand {
        match self {
            RemoteCommandEvent::Play => RemoteCommand::Play,
            RemoteCommandEvent::Pause => RemoteCommand::Pause,
            RemoteCommandEvent::Stop => RemoteCommand::Stop,
            RemoteCommandEvent::TogglePlayPause => RemoteCommand::TogglePlayPause,
            RemoteCommandEvent::NextTrack => RemoteCommand::NextTrack,
            RemoteCommandEvent::PreviousTrack => RemoteCommand::PreviousTrack,
            RemoteCommandEvent::ChangeRepeatMode(_) => RemoteCommand::ChangeRepeatMode,
            RemoteCommandEvent::ChangePlaybackRate(_) => RemoteCommand::ChangePlaybackRate,
            RemoteCommandEvent::ChangePlaybackPosition(_) => RemoteCommand::ChangePlaybackPosition,
            RemoteCommandEvent::SeekBackward(_) => RemoteCommand::SeekBackward,
            RemoteCommandEvent::SeekForward(_) => RemoteCommand::SeekForward,
            RemoteCommandEvent::SkipBackward(_) => RemoteCommand::SkipBackward,
            RemoteCommandEvent::SkipForward(_) => RemoteCommand::SkipForward,
        }
    }
}

/// Outcome reported back to the media surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    NoActionableNowPlayingItem,
    CommandFailed,
}

/// Callback invoked by the session for each remote command.
pub type CommandHandler = Arc<dyn Fn(RemoteCommandEvent) -> CommandStatus + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Audio,
    Video,
}

/// Metadata that only changes when the item or its tags change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaticMetadata {
    /// Locator of the asset being played.
    pub asset: String,
    pub media_type: MediaType,
    pub is_live_stream: bool,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub artwork: Option<Artwork>,
    pub album: Option<String>,
    pub track_count: Option<u32>,
    pub track_number: Option<u32>,
}

/// Metadata that changes while playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicMetadata {
    pub rate: f32,
    pub position: Duration,
    pub duration: Duration,
}

/// Now-playing session trait
///
/// - **iOS/macOS**: `MPNowPlayingInfoCenter` + `MPRemoteCommandCenter`
/// - **Android**: `MediaSession`
/// - **Linux**: MPRIS
///
/// `configure` must fail with [`BridgeError::NoRegisteredCommands`](crate::BridgeError::NoRegisteredCommands)
/// when `registered` is empty, and with the category/activation variants when
/// the platform audio session cannot be set up.
pub trait NowPlayingSession: Send + Sync {
    fn configure(
        &self,
        registered: &[RemoteCommand],
        disabled: &[RemoteCommand],
        handler: CommandHandler,
    ) -> Result<()>;

    fn session_start(&self) -> Result<()>;

    fn session_end(&self);

    fn publish_static_metadata(&self, metadata: &StaticMetadata);

    /// `metadata` is `None` when rate, position or duration is unknown.
    fn publish_dynamic_metadata(&self, is_playing: bool, metadata: Option<&DynamicMetadata>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_event_maps_to_a_registrable_command() {
        let all = RemoteCommand::all();
        let events = [
            RemoteCommandEvent::Play,
            RemoteCommandEvent::ChangeRepeatMode(RepeatType::All),
            RemoteCommandEvent::ChangePlaybackRate(2.0),
            RemoteCommandEvent::SeekForward(SeekPhase::Begin),
            RemoteCommandEvent::SkipBackward(Duration::from_secs(15)),
        ];
        for event in events {
            assert!(all.contains(&event.command()));
        }
    }

    #[test]
    fn remote_command_serializes_snake_case() {
        let json = serde_json::to_string(&RemoteCommand::TogglePlayPause).unwrap();
        assert_eq!(json, "\"toggle_play_pause\"");
        let parsed: RemoteCommand = serde_json::from_str("\"skip_forward\"").unwrap();
        assert_eq!(parsed, RemoteCommand::SkipForward);
    }
}
