//! # Core Configuration Module
//!
//! Dependency-injection bundle of the bridge implementations the playback
//! core needs.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds every collaborator the player talks to. It enforces
//! fail-fast validation so a missing capability is reported when the host
//! wires the player, not the first time a track is played.
//!
//! ## Required Dependencies
//!
//! - `DecodeEngine` - The decode/render engine. There is no default.
//!
//! ## Optional Dependencies (with platform defaults)
//!
//! - `NetworkMonitor` - Reachability (desktop default: polling probe)
//! - `BackgroundTaskHandler` - Background allowance (desktop default: no-op tracker)
//! - `Clock` - Wall-clock time (default: `SystemClock`)
//! - `NowPlayingSession` - Media surface integration (no default; skipped when absent)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for
//! `NetworkMonitor` and `BackgroundTaskHandler` are injected automatically if
//! not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .decode_engine(Arc::new(MyEngine::new()))
//!     .now_playing(Arc::new(MyMediaSession::new()))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // Panics with an actionable error message: no decode engine
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing decode engine");
//! ```

use crate::error::{Error, Result};
use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
use bridge_traits::{
    BackgroundTaskHandler, Clock, DecodeEngine, NetworkMonitor, NowPlayingSession, SystemClock,
};
use std::sync::Arc;

/// Core configuration for the playback core.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Decode/render engine (required)
    pub decode_engine: Arc<dyn DecodeEngine>,

    /// Reachability source
    pub network_monitor: Arc<dyn NetworkMonitor>,

    /// Background execution allowance
    pub background_tasks: Arc<dyn BackgroundTaskHandler>,

    /// OS media surface (optional)
    pub now_playing: Option<Arc<dyn NowPlayingSession>>,

    /// Wall-clock source used for connection-loss durations
    pub clock: Arc<dyn Clock>,

    /// Capacity of the observer event bus
    pub event_bus_capacity: usize,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("decode_engine", &"DecodeEngine { ... }")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .field("background_tasks", &"BackgroundTaskHandler { ... }")
            .field(
                "now_playing",
                &self
                    .now_playing
                    .as_ref()
                    .map(|_| "NowPlayingSession { ... }"),
            )
            .field("event_bus_capacity", &self.event_bus_capacity)
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks that the event bus capacity is within `1..=10_000`.
    pub fn validate(&self) -> Result<()> {
        if self.event_bus_capacity == 0 {
            return Err(Error::Config(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        if self.event_bus_capacity > 10_000 {
            return Err(Error::Config(
                "Event bus capacity exceeds maximum of 10,000 events".to_string(),
            ));
        }

        Ok(())
    }
}

fn decode_engine_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "DecodeEngine".to_string(),
        message: "A DecodeEngine implementation is required to play audio. \
                 Inject the platform engine adapter (AVPlayer, ExoPlayer, or a desktop pipeline) \
                 with .decode_engine()."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn network_monitor_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NetworkMonitor".to_string(),
        message: "NetworkMonitor implementation is required to react to connection loss. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default DesktopNetworkMonitor. \
                 Mobile: inject platform reachability (NWPathMonitor/ConnectivityManager)."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn background_tasks_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "BackgroundTaskHandler".to_string(),
        message: "BackgroundTaskHandler implementation is required to keep buffering in the background. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default DesktopBackgroundHandler. \
                 Mobile: inject the platform background task API."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    use bridge_desktop::DesktopNetworkMonitor;

    let monitor: Arc<dyn NetworkMonitor> = Arc::new(DesktopNetworkMonitor::new());
    Ok(monitor)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Err(network_monitor_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_background_tasks() -> Result<Arc<dyn BackgroundTaskHandler>> {
    use bridge_desktop::DesktopBackgroundHandler;

    let handler: Arc<dyn BackgroundTaskHandler> = Arc::new(DesktopBackgroundHandler::new());
    Ok(handler)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_background_tasks() -> Result<Arc<dyn BackgroundTaskHandler>> {
    Err(background_tasks_missing_error())
}

/// Builder for [`CoreConfig`].
#[derive(Default)]
pub struct CoreConfigBuilder {
    decode_engine: Option<Arc<dyn DecodeEngine>>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    background_tasks: Option<Arc<dyn BackgroundTaskHandler>>,
    now_playing: Option<Arc<dyn NowPlayingSession>>,
    clock: Option<Arc<dyn Clock>>,
    event_bus_capacity: Option<usize>,
}

impl CoreConfigBuilder {
    /// Sets the decode engine (required).
    pub fn decode_engine(mut self, engine: Arc<dyn DecodeEngine>) -> Self {
        self.decode_engine = Some(engine);
        self
    }

    /// Sets the network monitor implementation.
    ///
    /// If not provided, the desktop default is used when the `desktop-shims`
    /// feature is enabled.
    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    /// Sets the background task handler implementation.
    ///
    /// If not provided, the desktop default is used when the `desktop-shims`
    /// feature is enabled.
    pub fn background_tasks(mut self, handler: Arc<dyn BackgroundTaskHandler>) -> Self {
        self.background_tasks = Some(handler);
        self
    }

    /// Sets the now-playing session (optional).
    pub fn now_playing(mut self, session: Arc<dyn NowPlayingSession>) -> Self {
        self.now_playing = Some(session);
        self
    }

    /// Sets the clock (defaults to `SystemClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the observer event bus capacity (defaults to 100).
    pub fn event_bus_capacity(mut self, capacity: usize) -> Self {
        self.event_bus_capacity = Some(capacity);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - The decode engine is missing
    /// - A bridge without a platform default is missing
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let decode_engine = self
            .decode_engine
            .ok_or_else(decode_engine_missing_error)?;

        let network_monitor = match self.network_monitor {
            Some(monitor) => monitor,
            None => provide_default_network_monitor()?,
        };

        let background_tasks = match self.background_tasks {
            Some(handler) => handler,
            None => provide_default_background_tasks()?,
        };

        let config = CoreConfig {
            decode_engine,
            network_monitor,
            background_tasks,
            now_playing: self.now_playing,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            event_bus_capacity: self
                .event_bus_capacity
                .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::background::{BackgroundTaskId, LifecycleState};
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::network::{NetworkChangeStream, NetworkInfo, NetworkType};
    use bridge_traits::playback::{AudioSource, EngineInstance, LoadOptions};
    use bridge_traits::BridgeError;

    struct NullEngine;

    impl DecodeEngine for NullEngine {
        fn load(
            &self,
            _source: &AudioSource,
            _options: &LoadOptions,
        ) -> BridgeResult<Box<dyn EngineInstance>> {
            Err(BridgeError::NotAvailable("null engine".to_string()))
        }
    }

    struct StaticMonitor;

    #[async_trait]
    impl NetworkMonitor for StaticMonitor {
        async fn get_network_info(&self) -> BridgeResult<NetworkInfo> {
            Ok(NetworkInfo::connected(NetworkType::WiFi))
        }

        async fn subscribe_changes(&self) -> BridgeResult<Box<dyn NetworkChangeStream>> {
            Err(BridgeError::NotAvailable("static monitor".to_string()))
        }
    }

    struct NoopBackground;

    impl BackgroundTaskHandler for NoopBackground {
        fn begin_background_task(&self) -> Option<BackgroundTaskId> {
            None
        }

        fn end_background_task(&self, _id: BackgroundTaskId) {}

        fn lifecycle_state(&self) -> LifecycleState {
            LifecycleState::Background
        }
    }

    fn complete_builder() -> CoreConfigBuilder {
        CoreConfig::builder()
            .decode_engine(Arc::new(NullEngine))
            .network_monitor(Arc::new(StaticMonitor))
            .background_tasks(Arc::new(NoopBackground))
    }

    #[test]
    fn test_builder_requires_decode_engine() {
        let err = CoreConfig::builder().build().unwrap_err();
        match err {
            Error::CapabilityMissing { capability, .. } => assert_eq!(capability, "DecodeEngine"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_builder_with_all_bridges() {
        let config = complete_builder().build().unwrap();
        assert!(config.now_playing.is_none());
        assert_eq!(config.event_bus_capacity, DEFAULT_EVENT_BUFFER_SIZE);
        assert_eq!(
            config.background_tasks.lifecycle_state(),
            LifecycleState::Background
        );
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let err = complete_builder().event_bus_capacity(0).build().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_excessive_capacity() {
        let err = complete_builder()
            .event_bus_capacity(20_000)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_build_with_desktop_defaults() {
        let config = CoreConfig::builder()
            .decode_engine(Arc::new(NullEngine))
            .build()
            .unwrap();
        assert_eq!(
            config.background_tasks.lifecycle_state(),
            LifecycleState::Foreground
        );
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_builder_requires_network_monitor_without_shims() {
        let err = CoreConfig::builder()
            .decode_engine(Arc::new(NullEngine))
            .build()
            .unwrap_err();
        match err {
            Error::CapabilityMissing { capability, .. } => {
                assert_eq!(capability, "NetworkMonitor")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
