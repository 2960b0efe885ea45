//! # Host Bridge Traits
//!
//! Collaborator contracts the playback core consumes.
//!
//! ## Overview
//!
//! The core orchestrates playback but never decodes audio, never talks to the
//! OS media surface directly and never polls the network itself. Each of
//! those capabilities is a trait here, implemented per platform (desktop,
//! iOS, Android) and injected through `core_runtime::config::CoreConfig`.
//!
//! ## Traits
//!
//! ### Playback
//! - [`DecodeEngine`](playback::DecodeEngine) / [`EngineInstance`](playback::EngineInstance) - Load, play, seek, query timeline
//! - [`EngineNotificationStream`](playback::EngineNotificationStream) - Engine notifications
//! - [`NowPlayingSession`](now_playing::NowPlayingSession) - Media surface metadata and remote commands
//!
//! ### Platform Integration
//! - [`NetworkMonitor`](network::NetworkMonitor) - Reachability and change notifications
//! - [`BackgroundTaskHandler`](background::BackgroundTaskHandler) - Background execution allowance
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Network, background, now-playing |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! The decode engine has no default: hosts always inject one.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError`
//! and keep messages actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! between the player task and producer tasks.

pub mod background;
pub mod error;
pub mod network;
pub mod now_playing;
pub mod playback;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{BackgroundTaskHandler, BackgroundTaskId, LifecycleState};
pub use network::{NetworkChangeStream, NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
pub use now_playing::{
    CommandHandler, CommandStatus, DynamicMetadata, MediaType, NowPlayingSession, RemoteCommand,
    RemoteCommandEvent, RepeatType, SeekPhase, StaticMetadata,
};
pub use playback::{
    Artwork, AudioSource, BufferingPolicy, DecodeEngine, EngineInstance, EngineNotification,
    EngineNotificationStream, EngineStatus, LoadOptions, SeekCompletion, SeekTolerance,
    StreamMetadata, TimeRange,
};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, ManualClock, SystemClock};
