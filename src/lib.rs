//! Workspace facade crate.
//!
//! Re-exports the playback core together with the runtime and bridge crates
//! so host applications can depend on `audio-session-workspace` alone. The
//! `desktop-shims` feature (on by default) lets [`core_runtime::config::CoreConfig`]
//! fall back to the desktop network monitor and background handler.

pub use bridge_traits;
pub use core_playback;
pub use core_runtime;

pub use core_playback::{
    AudioItem, PlaybackError, PlaybackMode, PlaybackState, Player, PlayerConfig, PlayerSnapshot,
    QualityTier,
};
