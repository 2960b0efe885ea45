//! Fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_desktop::{DesktopBackgroundHandler, LoggingNowPlayingSession};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::{
    AudioSource, BridgeError, BufferingPolicy, DecodeEngine, EngineInstance, EngineNotification,
    EngineNotificationStream, EngineStatus, LoadOptions, ManualClock, NetworkChangeStream,
    NetworkInfo, NetworkMonitor, NetworkType, SeekCompletion, SeekTolerance, TimeRange,
};
use chrono::{TimeZone, Utc};
use core_playback::producers::Envelope;
use core_playback::{
    AudioItem, Event, EventSink, PlayerConfig, QualityTier, Reachability, SessionController,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, Receiver};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

// ============================================================================
// Decode engine
// ============================================================================

/// Observable state of one fake engine instance.
pub struct FakeInstance {
    pub source: Mutex<AudioSource>,
    pub options: LoadOptions,
    pub rate: Mutex<f32>,
    pub volume: Mutex<f32>,
    pub status: Mutex<EngineStatus>,
    pub position: Mutex<Option<Duration>>,
    pub duration: Mutex<Option<Duration>>,
    pub seekable: Mutex<Option<TimeRange>>,
    pub loaded: Mutex<Option<TimeRange>>,
    pub buffer_empty: AtomicBool,
    pub seeks: Mutex<Vec<Duration>>,
    pub rates: Mutex<Vec<f32>>,
    pub played_immediately: AtomicBool,
    pub policy: Mutex<Option<BufferingPolicy>>,
    notify: mpsc::UnboundedSender<EngineNotification>,
    stream: Mutex<Option<mpsc::UnboundedReceiver<EngineNotification>>>,
}

impl FakeInstance {
    fn new(source: AudioSource, options: LoadOptions) -> Self {
        let (notify, stream) = mpsc::unbounded_channel();
        Self {
            source: Mutex::new(source),
            options,
            rate: Mutex::new(0.0),
            volume: Mutex::new(options.volume),
            status: Mutex::new(EngineStatus::Unknown),
            position: Mutex::new(Some(Duration::ZERO)),
            duration: Mutex::new(None),
            seekable: Mutex::new(None),
            loaded: Mutex::new(None),
            buffer_empty: AtomicBool::new(false),
            seeks: Mutex::new(Vec::new()),
            rates: Mutex::new(Vec::new()),
            played_immediately: AtomicBool::new(false),
            policy: Mutex::new(None),
            notify,
            stream: Mutex::new(Some(stream)),
        }
    }

    pub fn notify(&self, notification: EngineNotification) {
        let _ = self.notify.send(notification);
    }

    pub fn set_ready(&self) {
        *self.status.lock() = EngineStatus::ReadyToPlay;
    }

    pub fn set_position(&self, position: Duration) {
        *self.position.lock() = Some(position);
    }

    pub fn set_duration(&self, duration: Duration) {
        *self.duration.lock() = Some(duration);
    }

    pub fn set_seekable(&self, earliest: Duration, latest: Duration) {
        *self.seekable.lock() = Some(TimeRange::new(earliest, latest));
    }

    pub fn set_buffer_empty(&self, empty: bool) {
        self.buffer_empty.store(empty, Ordering::SeqCst);
    }

    pub fn current_rate(&self) -> f32 {
        *self.rate.lock()
    }

    pub fn last_seek(&self) -> Option<Duration> {
        self.seeks.lock().last().copied()
    }

    pub fn locator(&self) -> String {
        self.source.lock().locator()
    }
}

struct FakeHandle(Arc<FakeInstance>);

struct FakeStream(mpsc::UnboundedReceiver<EngineNotification>);

#[async_trait]
impl EngineNotificationStream for FakeStream {
    async fn next(&mut self) -> Option<EngineNotification> {
        self.0.recv().await
    }
}

struct EmptyStream;

#[async_trait]
impl EngineNotificationStream for EmptyStream {
    async fn next(&mut self) -> Option<EngineNotification> {
        None
    }
}

impl EngineInstance for FakeHandle {
    fn set_rate(&self, rate: f32) {
        *self.0.rate.lock() = rate;
        self.0.rates.lock().push(rate);
    }

    fn rate(&self) -> f32 {
        *self.0.rate.lock()
    }

    fn play_immediately(&self, rate: f32) {
        self.0.played_immediately.store(true, Ordering::SeqCst);
        self.set_rate(rate);
    }

    fn set_volume(&self, volume: f32) {
        *self.0.volume.lock() = volume;
    }

    fn replace_source(&self, source: &AudioSource) -> BridgeResult<()> {
        *self.0.source.lock() = source.clone();
        Ok(())
    }

    fn seek(&self, to: Duration, _tolerance: SeekTolerance, completion: Option<SeekCompletion>) {
        self.0.seeks.lock().push(to);
        *self.0.position.lock() = Some(to);
        if let Some(completion) = completion {
            completion(true);
        }
    }

    fn status(&self) -> EngineStatus {
        self.0.status.lock().clone()
    }

    fn current_position(&self) -> Option<Duration> {
        *self.0.position.lock()
    }

    fn duration(&self) -> Option<Duration> {
        *self.0.duration.lock()
    }

    fn seekable_range(&self) -> Option<TimeRange> {
        *self.0.seekable.lock()
    }

    fn loaded_range(&self) -> Option<TimeRange> {
        *self.0.loaded.lock()
    }

    fn is_buffer_empty(&self) -> bool {
        self.0.buffer_empty.load(Ordering::SeqCst)
    }

    fn set_buffering_policy(&self, policy: BufferingPolicy) {
        *self.0.policy.lock() = Some(policy);
    }

    fn notifications(&self) -> Box<dyn EngineNotificationStream> {
        match self.0.stream.lock().take() {
            Some(stream) => Box::new(FakeStream(stream)),
            None => Box::new(EmptyStream),
        }
    }
}

/// Engine that records every instance it creates.
#[derive(Default)]
pub struct FakeEngine {
    instances: Mutex<Vec<Arc<FakeInstance>>>,
    fail_loads: AtomicBool,
}

impl FakeEngine {
    pub fn instances(&self) -> Vec<Arc<FakeInstance>> {
        self.instances.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.instances.lock().len()
    }

    /// Most recent instance.
    pub fn latest(&self) -> Arc<FakeInstance> {
        self.instances
            .lock()
            .last()
            .cloned()
            .expect("engine has not loaded anything")
    }

    pub fn fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }
}

impl DecodeEngine for FakeEngine {
    fn load(
        &self,
        source: &AudioSource,
        options: &LoadOptions,
    ) -> BridgeResult<Box<dyn EngineInstance>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(BridgeError::Engine("unsupported format".into()));
        }
        let instance = Arc::new(FakeInstance::new(source.clone(), *options));
        self.instances.lock().push(Arc::clone(&instance));
        Ok(Box::new(FakeHandle(instance)))
    }
}

// ============================================================================
// Network
// ============================================================================

/// Network monitor whose status the test flips.
pub struct FakeNetwork {
    info: Mutex<NetworkInfo>,
    changes: broadcast::Sender<NetworkInfo>,
}

impl FakeNetwork {
    pub fn new(info: NetworkInfo) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            info: Mutex::new(info),
            changes,
        }
    }

    pub fn online() -> Self {
        Self::new(NetworkInfo::connected(NetworkType::WiFi))
    }

    pub fn offline() -> Self {
        Self::new(NetworkInfo::disconnected())
    }

    pub fn set(&self, info: NetworkInfo) {
        *self.info.lock() = info.clone();
        let _ = self.changes.send(info);
    }
}

struct FakeChanges(broadcast::Receiver<NetworkInfo>);

#[async_trait]
impl NetworkChangeStream for FakeChanges {
    async fn next(&mut self) -> Option<NetworkInfo> {
        self.0.recv().await.ok()
    }
}

#[async_trait]
impl NetworkMonitor for FakeNetwork {
    async fn get_network_info(&self) -> BridgeResult<NetworkInfo> {
        Ok(self.info.lock().clone())
    }

    async fn subscribe_changes(&self) -> BridgeResult<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(FakeChanges(self.changes.subscribe())))
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Collaborators {
    pub engine: Arc<FakeEngine>,
    pub network: Arc<FakeNetwork>,
    pub background: Arc<DesktopBackgroundHandler>,
    pub now_playing: Arc<LoggingNowPlayingSession>,
    pub clock: Arc<ManualClock>,
}

impl Collaborators {
    pub fn new(network: FakeNetwork) -> Self {
        Self {
            engine: Arc::new(FakeEngine::default()),
            network: Arc::new(network),
            background: Arc::new(DesktopBackgroundHandler::new()),
            now_playing: Arc::new(LoggingNowPlayingSession::new()),
            clock: Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            )),
        }
    }

    pub fn core_config(&self) -> CoreConfig {
        CoreConfig::builder()
            .decode_engine(self.engine.clone())
            .network_monitor(self.network.clone())
            .background_tasks(self.background.clone())
            .now_playing(self.now_playing.clone())
            .clock(self.clock.clone())
            .build()
            .unwrap()
    }
}

/// A controller driven by hand: the test delivers events explicitly.
pub struct Harness {
    pub controller: SessionController,
    pub envelopes: mpsc::UnboundedReceiver<Envelope>,
    pub bus: Receiver<CoreEvent>,
    pub deps: Collaborators,
}

impl Harness {
    pub fn new(config: PlayerConfig) -> Self {
        Self::with_network(config, FakeNetwork::online(), Reachability::ReachableViaWiFi)
    }

    pub fn offline(config: PlayerConfig) -> Self {
        Self::with_network(config, FakeNetwork::offline(), Reachability::Unreachable)
    }

    pub fn with_network(config: PlayerConfig, network: FakeNetwork, initial: Reachability) -> Self {
        let deps = Collaborators::new(network);
        let bus = EventBus::new(256);
        let receiver = bus.subscribe();
        let (sink, envelopes) = EventSink::new();
        let controller =
            SessionController::new(&deps.core_config(), config, initial, sink, bus).unwrap();
        Self {
            controller,
            envelopes,
            bus: receiver,
            deps,
        }
    }

    pub fn instance(&self) -> Arc<FakeInstance> {
        self.deps.engine.latest()
    }

    /// Events that are still current, without handling them.
    pub fn pending(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(envelope) = self.envelopes.try_recv() {
            if envelope.is_current() {
                events.push(envelope.into_event());
            }
        }
        events
    }

    /// Handle every current event, like the player task does.
    pub async fn pump(&mut self) {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        while let Ok(envelope) = self.envelopes.try_recv() {
            if envelope.is_current() {
                self.controller.handle(envelope.into_event());
            }
        }
    }

    /// Deliver an engine notification straight to the controller.
    pub fn engine(&mut self, notification: EngineNotification) {
        self.controller.handle(Event::Engine(notification));
    }

    /// Bring the current instance to a playing state.
    pub fn make_ready(&mut self) {
        self.instance().set_ready();
        self.engine(EngineNotification::ReadyToPlay);
    }

    pub fn bus_events(&mut self) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.bus.try_recv() {
            events.push(event);
        }
        events
    }
}

// ============================================================================
// Items & configs
// ============================================================================

pub fn remote_item(name: &str) -> AudioItem {
    AudioItem::with_source(AudioSource::remote(format!(
        "https://cdn.example.com/{name}.mp3"
    )))
}

pub fn local_item(name: &str) -> AudioItem {
    AudioItem::with_source(AudioSource::local(format!("/music/{name}.flac")))
}

/// Item with a source for every tier.
pub fn tiered_item(name: &str) -> AudioItem {
    AudioItem::new([
        (
            QualityTier::Low,
            AudioSource::remote(format!("https://cdn.example.com/{name}-64.mp3")),
        ),
        (
            QualityTier::Medium,
            AudioSource::remote(format!("https://cdn.example.com/{name}-128.mp3")),
        ),
        (
            QualityTier::High,
            AudioSource::remote(format!("https://cdn.example.com/{name}-320.mp3")),
        ),
    ])
    .unwrap()
}

pub fn config() -> PlayerConfig {
    PlayerConfig::default()
}
