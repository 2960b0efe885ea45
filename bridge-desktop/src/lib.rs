//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `NetworkMonitor` using a polling TCP probe
//! - `BackgroundTaskHandler` that grants and tracks allowances (desktop is never suspended)
//! - `NowPlayingSession` that logs published metadata and relays media keys
//!
//! There is no desktop `DecodeEngine` here; hosts plug in their own audio
//! pipeline.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{DesktopBackgroundHandler, DesktopNetworkMonitor, LoggingNowPlayingSession};
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .decode_engine(Arc::new(MyEngine::new()))
//!     .network_monitor(Arc::new(DesktopNetworkMonitor::new()))
//!     .background_tasks(Arc::new(DesktopBackgroundHandler::new()))
//!     .now_playing(Arc::new(LoggingNowPlayingSession::new()))
//!     .build()?;
//! ```

mod background;
mod network;
mod now_playing;

pub use background::DesktopBackgroundHandler;
pub use network::DesktopNetworkMonitor;
pub use now_playing::LoggingNowPlayingSession;
