//! # Session Controller
//!
//! The playback state machine. It owns the [`PlaybackState`], the current
//! item and quality, the queue, the engine instance and every event
//! producer, and reconciles producer events and user commands into state
//! transitions.
//!
//! ## Overview
//!
//! ```text
//!                 ┌──────────────────── assign item ─────────────────────┐
//!                 │ (reachable or offline)            (unreachable)      │
//!                 ▼                                                      ▼
//! Stopped ──> Buffering ──ready──> Playing <──resume── Paused   WaitingForConnection
//!                 ▲                   │  └────pause────>▲                │
//!                 │                   │ stall           │                │
//!                 └───────────────────┘                 │   connection retrieved
//!                                                       │   (within budget)
//!                 any ──retry budget spent──> Failed    │                │
//!                 any ──stop()──> Stopped               └── Buffering <──┘
//! ```
//!
//! ## Serialization
//!
//! The controller is synchronous and not shared: the [`Player`](crate::Player)
//! task owns it and is the only caller of its commands and of
//! [`SessionController::handle`], so no two transitions interleave.
//!
//! ## Side effects of a state change
//!
//! - a background execution allowance is held while `Buffering`
//! - dynamic metadata is pushed to the now-playing session
//! - delegates receive `(from, to)`
//! - reaching `Playing` resets the retry budget and stops the retry timer

mod handlers;
mod remote;

pub(crate) use remote::command_status;

use crate::config::{BufferingStrategy, PlayerConfig, SeekingBehavior};
use crate::delegate::{EventBusDelegate, PlayerDelegate};
use crate::error::{PlaybackError, Result};
use crate::item::{AudioItem, ItemId, QualityTier};
use crate::producers::{
    EngineNotifier, EventProducer, EventSink, ItemWatcher, NetworkEventProducer, QualityProducer,
    Reachability, RetryProducer, SeekProducer,
};
use crate::quality::QualityController;
use crate::queue::{PlaybackMode, PlaybackQueue};
use crate::retry::RetryController;
use crate::state::{FailureReason, PlaybackState};
use bridge_traits::{
    AudioSource, BackgroundTaskHandler, BackgroundTaskId, Clock, DecodeEngine, DynamicMetadata,
    EngineInstance, LoadOptions, MediaType, NetworkInfo, NowPlayingSession, SeekCompletion,
    SeekTolerance, StaticMetadata, TimeRange,
};
use chrono::{DateTime, Utc};
use core_runtime::config::CoreConfig;
use core_runtime::events::EventBus;
use core_runtime::logging::{redact_url, strip_path};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Fields mutated only by the controller.
#[derive(Debug, Default)]
struct Session {
    state: PlaybackState,
    current_item: Option<AudioItem>,
    current_quality: QualityTier,
    state_before_buffering: Option<PlaybackState>,
    state_when_connection_lost: Option<PlaybackState>,
    connection_lost_at: Option<DateTime<Utc>>,
    paused_for_interruption: bool,
    quality_change_in_progress: bool,
    background_task: Option<BackgroundTaskId>,
}

/// Point-in-time summary of a session for hosts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub item_id: Option<ItemId>,
    pub item_index: Option<usize>,
    pub queue_len: usize,
    pub quality: QualityTier,
    pub position: Option<Duration>,
    pub duration: Option<Duration>,
    pub rate: f32,
    pub mode: PlaybackMode,
}

/// The playback state machine.
pub struct SessionController {
    config: PlayerConfig,
    session: Session,
    queue: Option<PlaybackQueue>,
    instance: Option<Box<dyn EngineInstance>>,
    rate: f32,
    volume: f32,
    mode: PlaybackMode,

    engine: Arc<dyn DecodeEngine>,
    background: Arc<dyn BackgroundTaskHandler>,
    now_playing: Option<Arc<dyn NowPlayingSession>>,
    clock: Arc<dyn Clock>,
    delegates: Vec<Arc<dyn PlayerDelegate>>,

    network: NetworkEventProducer,
    seek_timer: SeekProducer,
    quality: QualityProducer,
    retry: RetryProducer,
    engine_notifier: EngineNotifier,
    item_watcher: ItemWatcher,
}

impl SessionController {
    /// Build a controller whose producers deliver to `sink`.
    ///
    /// `initial` is the reachability known at construction; the network
    /// producer keeps it current once an item is playing.
    pub fn new(
        core: &CoreConfig,
        config: PlayerConfig,
        initial: Reachability,
        sink: EventSink,
        bus: EventBus,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let seek_interval = match config.seeking_behavior {
            SeekingBehavior::ChangeTimeEvery { interval, .. } => interval,
            SeekingBehavior::MultiplyRate { .. } => Duration::from_secs(10),
        };

        Ok(Self {
            session: Session {
                current_quality: config.default_quality,
                ..Session::default()
            },
            queue: None,
            instance: None,
            rate: config.rate,
            volume: config.volume,
            mode: config.playback_mode,

            engine: Arc::clone(&core.decode_engine),
            background: Arc::clone(&core.background_tasks),
            now_playing: core.now_playing.clone(),
            clock: Arc::clone(&core.clock),
            delegates: vec![Arc::new(EventBusDelegate::new(bus))],

            network: NetworkEventProducer::new(
                Arc::clone(&core.network_monitor),
                Arc::clone(&core.clock),
                initial,
                sink.clone(),
            ),
            seek_timer: SeekProducer::new(seek_interval, sink.clone()),
            quality: QualityProducer::new(QualityController::from_config(&config), sink.clone()),
            retry: RetryProducer::new(RetryController::from_config(&config), sink.clone()),
            engine_notifier: EngineNotifier::new(sink.clone()),
            item_watcher: ItemWatcher::new(sink),

            config,
        })
    }

    /// Register another delegate. Every delegate must admit an item for it
    /// to be played.
    pub fn add_delegate(&mut self, delegate: Arc<dyn PlayerDelegate>) {
        self.delegates.push(delegate);
    }

    /// Record reachability without emitting an event.
    pub fn refresh_reachability(&mut self, info: &NetworkInfo) {
        self.network.refresh(info);
    }

    // ========================================================================
    // Queue Commands
    // ========================================================================

    /// Replace the queue with `items` and start at `start_index`.
    ///
    /// An empty list stops the session.
    pub fn play(&mut self, items: Vec<AudioItem>, start_index: usize) -> Result<()> {
        if items.is_empty() {
            self.stop();
            return Ok(());
        }

        let mut queue = PlaybackQueue::new(items, self.mode);
        queue.start_at(start_index)?;

        let delegates = &self.delegates;
        let first = queue.next(&|item| admits(delegates, item));
        self.queue = Some(queue);

        match first {
            Some(item) => self.set_current_item(item),
            None => {
                info!("No queued item was admitted");
                self.stop();
            }
        }
        Ok(())
    }

    /// Append items, or start playing them when there is no queue.
    pub fn add(&mut self, items: Vec<AudioItem>) -> Result<()> {
        match self.queue.as_mut() {
            Some(queue) => {
                queue.add(items);
                Ok(())
            }
            None => self.play(items, 0),
        }
    }

    /// Remove the item at `index` in play order.
    pub fn remove_item(&mut self, index: usize) -> Result<AudioItem> {
        match self.queue.as_mut() {
            Some(queue) => queue.remove(index),
            None => Err(PlaybackError::InvalidIndex { index, len: 0 }),
        }
    }

    /// Play the next admitted item, if any.
    pub fn next(&mut self) {
        let delegates = &self.delegates;
        let candidate = self
            .queue
            .as_mut()
            .and_then(|queue| queue.next(&|item| admits(delegates, item)));
        if let Some(item) = candidate {
            self.set_current_item(item);
        }
    }

    /// Play the previous item, or rewind the current one.
    pub fn previous(&mut self) {
        let delegates = &self.delegates;
        let candidate = self
            .queue
            .as_mut()
            .and_then(|queue| queue.previous(&|item| admits(delegates, item)));
        match candidate {
            Some(item) => self.set_current_item(item),
            None => self.seek(Duration::ZERO, false, SeekTolerance::default(), None),
        }
    }

    /// Play the next item, or stop when the queue is done.
    pub fn next_or_stop(&mut self) {
        let delegates = &self.delegates;
        let candidate = self
            .queue
            .as_mut()
            .and_then(|queue| queue.next(&|item| admits(delegates, item)));
        match candidate {
            Some(item) => self.set_current_item(item),
            None => self.stop(),
        }
    }

    /// Change the queue mode. Shuffle draws a new order.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
        if let Some(queue) = self.queue.as_mut() {
            queue.set_mode(mode);
        }
    }

    // ========================================================================
    // Transport Commands
    // ========================================================================

    /// Start or continue playback of the current item.
    ///
    /// Clears any recorded pause so a pending reload plays once ready.
    pub fn resume(&mut self) {
        if self.session.current_item.is_none() {
            return;
        }
        self.session.paused_for_interruption = false;
        if self.session.state.is_playing() {
            return;
        }
        if self
            .session
            .state_when_connection_lost
            .as_ref()
            .is_some_and(PlaybackState::is_paused)
        {
            self.session.state_when_connection_lost = Some(PlaybackState::Buffering);
        }
        if self
            .session
            .state_before_buffering
            .as_ref()
            .is_some_and(PlaybackState::is_paused)
        {
            self.session.state_before_buffering = None;
        }

        match &self.instance {
            Some(instance) => {
                instance.set_rate(self.rate);
                // Buffering stays Buffering until the engine is ready.
                if !self.session.state.is_playing() && !self.session.state.is_buffering() {
                    self.set_state(PlaybackState::Playing);
                }
            }
            None => self.retry_or_play_next(),
        }

        self.retry.start();
    }

    /// Pause playback and remember the intent across reloads.
    pub fn pause(&mut self) {
        if self.session.current_item.is_none() {
            return;
        }
        // A reload after reconnecting or buffering must not auto-play.
        if let Some(state) = self.session.state_when_connection_lost.as_mut() {
            *state = PlaybackState::Paused;
        }
        if self.session.state.is_buffering() || self.session.state_before_buffering.is_some() {
            self.session.state_before_buffering = Some(PlaybackState::Paused);
        }
        if let Some(instance) = &self.instance {
            instance.set_rate(0.0);
        }
        self.set_state(PlaybackState::Paused);
        self.retry.stop();

        // Keep buffering while the host is in the background.
        self.begin_background();
    }

    /// Resume when stopped or paused, pause when playing.
    pub fn toggle_play_pause(&mut self) {
        match self.session.state {
            PlaybackState::Stopped | PlaybackState::Paused => self.resume(),
            PlaybackState::Playing => self.pause(),
            _ => {}
        }
    }

    /// Tear down the item, the queue and the engine instance.
    pub fn stop(&mut self) {
        self.retry.stop();
        self.seek_timer.stop();
        self.release_instance();
        self.item_watcher.set_item(None);
        self.network.stop();

        self.session.current_item = None;
        self.queue = None;
        self.session.state_before_buffering = None;
        self.session.state_when_connection_lost = None;
        self.session.connection_lost_at = None;
        self.session.paused_for_interruption = false;
        self.session.quality_change_in_progress = false;
        self.retry.reset();

        if let Some(now_playing) = &self.now_playing {
            now_playing.session_end();
        }
        self.set_state(PlaybackState::Stopped);
        self.end_background();
    }

    /// Seek the current item.
    ///
    /// With `adapt_to_seekable_range`, a target outside the seekable range
    /// is clamped to the nearest edge, kept `seek_padding` inside it. The
    /// completion reports `false` when the engine is not ready.
    pub fn seek(
        &mut self,
        to: Duration,
        adapt_to_seekable_range: bool,
        tolerance: SeekTolerance,
        completion: Option<SeekCompletion>,
    ) {
        let Some(range) = self.current_item_seekable_range() else {
            self.seek_safely(to, tolerance, completion);
            return;
        };

        let padding = self.config.seek_padding;
        if !adapt_to_seekable_range || range.contains(to) {
            self.seek_safely(to, tolerance, completion);
        } else if to < range.earliest {
            self.seek_to_seekable_range_start(padding, completion);
        } else {
            self.seek_to_seekable_range_end(padding, completion);
        }
    }

    pub fn seek_to_seekable_range_start(
        &mut self,
        padding: Duration,
        completion: Option<SeekCompletion>,
    ) {
        let Some(range) = self.current_item_seekable_range() else {
            if let Some(completion) = completion {
                completion(false);
            }
            return;
        };
        let position = (range.earliest + padding).min(range.latest);
        self.seek_safely(position, SeekTolerance::default(), completion);
    }

    pub fn seek_to_seekable_range_end(
        &mut self,
        padding: Duration,
        completion: Option<SeekCompletion>,
    ) {
        let Some(range) = self.current_item_seekable_range() else {
            if let Some(completion) = completion {
                completion(false);
            }
            return;
        };
        let position = range.latest.saturating_sub(padding).max(range.earliest);
        self.seek_safely(position, SeekTolerance::default(), completion);
    }

    fn seek_safely(
        &mut self,
        to: Duration,
        tolerance: SeekTolerance,
        completion: Option<SeekCompletion>,
    ) {
        let Some(instance) = &self.instance else {
            if let Some(completion) = completion {
                completion(false);
            }
            return;
        };

        match completion {
            None => instance.seek(to, tolerance, None),
            Some(completion) => {
                if instance.status() != bridge_traits::EngineStatus::ReadyToPlay {
                    debug!("Seek requested before the engine is ready");
                    completion(false);
                    return;
                }
                instance.seek(to, tolerance, Some(completion));
            }
        }
        debug!(position_ms = to.as_millis() as u64, "Seek issued");
        self.publish_dynamic_metadata();
    }

    /// Set the playback rate, applied to the engine while playing.
    pub fn set_rate(&mut self, rate: f32) {
        self.rate = rate;
        if self.session.state.is_playing() {
            if let Some(instance) = &self.instance {
                instance.set_rate(rate);
            }
            self.publish_dynamic_metadata();
        }
    }

    /// Set the volume of the current and future engine instances.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
        if let Some(instance) = &self.instance {
            instance.set_volume(volume);
        }
    }

    /// Replace the configuration; live producers pick up the new limits.
    pub fn apply_config(&mut self, config: PlayerConfig) -> Result<()> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;
        let previous = std::mem::replace(&mut self.config, config);

        self.quality.reconfigure(&self.config);
        self.retry.reconfigure(&self.config);
        if let SeekingBehavior::ChangeTimeEvery { interval, .. } = self.config.seeking_behavior {
            self.seek_timer.set_interval(interval);
        }
        if let Some(instance) = &self.instance {
            instance.set_buffering_policy(self.config.buffering_strategy.policy());
        }

        if previous.rate != self.config.rate {
            self.set_rate(self.config.rate);
        }
        if previous.volume != self.config.volume {
            self.set_volume(self.config.volume);
        }
        if previous.playback_mode != self.config.playback_mode {
            self.set_mode(self.config.playback_mode);
        }
        info!("Player configuration applied");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn state(&self) -> &PlaybackState {
        &self.session.state
    }

    pub fn current_item(&self) -> Option<&AudioItem> {
        self.session.current_item.as_ref()
    }

    pub fn current_quality(&self) -> QualityTier {
        self.session.current_quality
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Queued items in play order.
    pub fn items(&self) -> Vec<AudioItem> {
        self.queue.as_ref().map(|q| q.items()).unwrap_or_default()
    }

    /// Position of the current item in the list it was queued with.
    pub fn current_item_index(&self) -> Option<usize> {
        let current = self.session.current_item.as_ref()?;
        self.queue
            .as_ref()?
            .original_items()
            .iter()
            .position(|item| item == current)
    }

    pub fn has_next(&self) -> bool {
        self.queue.as_ref().is_some_and(|q| q.has_next())
    }

    pub fn has_previous(&self) -> bool {
        self.queue.as_ref().is_some_and(|q| q.has_previous())
    }

    pub fn current_item_progression(&self) -> Option<Duration> {
        self.instance.as_ref()?.current_position()
    }

    pub fn current_item_duration(&self) -> Option<Duration> {
        self.instance.as_ref()?.duration()
    }

    /// Seekable range, or the current position as an empty range when the
    /// engine does not report one.
    pub fn current_item_seekable_range(&self) -> Option<TimeRange> {
        let instance = self.instance.as_ref()?;
        instance.seekable_range().or_else(|| {
            instance
                .current_position()
                .map(|position| TimeRange::new(position, position))
        })
    }

    pub fn current_item_loaded_range(&self) -> Option<TimeRange> {
        self.instance.as_ref()?.loaded_range()
    }

    /// Interruptions counted in the current quality window.
    pub fn interruption_count(&self) -> usize {
        self.quality.interruption_count()
    }

    pub fn retry_attempts(&self) -> usize {
        self.retry.attempts()
    }

    pub fn is_retrying(&self) -> bool {
        self.retry.is_producing()
    }

    pub fn reachability(&self) -> Reachability {
        self.network.reachability()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            state: self.session.state.clone(),
            item_id: self.session.current_item.as_ref().map(|item| item.id()),
            item_index: self.current_item_index(),
            queue_len: self.queue.as_ref().map(|q| q.len()).unwrap_or(0),
            quality: self.session.current_quality,
            position: self.current_item_progression(),
            duration: self.current_item_duration(),
            rate: self.rate,
            mode: self.mode,
        }
    }

    // ========================================================================
    // Item Assignment
    // ========================================================================

    /// Make `item` current and load it into a fresh engine instance.
    fn set_current_item(&mut self, item: AudioItem) {
        let previous = self.session.current_item.take();
        self.release_instance();
        self.activate_session();

        self.session.current_item = Some(item.clone());
        self.item_watcher.set_item(Some(item.clone()));
        self.network.start();
        self.publish_static_metadata();

        let Some((quality, source)) = item
            .source_for(self.session.current_quality)
            .map(|(tier, source)| (tier, source.clone()))
        else {
            return;
        };

        if self.network.is_reachable() || source.is_offline() {
            self.set_state(PlaybackState::Buffering);
        } else {
            info!(item = %item.id(), "Network unreachable, waiting for connection");
            self.session.state_when_connection_lost = Some(PlaybackState::Buffering);
            self.session.connection_lost_at = Some(self.clock.now());
            self.set_state(PlaybackState::WaitingForConnection);
            self.begin_background();
            return;
        }

        self.session.paused_for_interruption = false;

        let policy = self.config.buffering_strategy.policy();
        let options = LoadOptions {
            volume: self.volume,
            buffering: policy,
            preferred_forward_buffer: match self.config.buffering_strategy {
                BufferingStrategy::FillThenPlay => self.config.preferred_buffer_duration,
                _ => Duration::ZERO,
            },
        };

        match self.engine.load(&source, &options) {
            Ok(instance) => {
                info!(
                    item = %item.id(),
                    quality = %quality,
                    source = %loggable_locator(&source),
                    "Item loaded"
                );
                instance.set_volume(self.volume);
                instance.set_buffering_policy(policy);
                self.engine_notifier.set_stream(instance.notifications());
                self.session.current_quality = quality;
                self.instance = Some(instance);

                self.engine_notifier.start();
                self.quality.start();
                self.item_watcher.start();

                if previous.as_ref() != Some(&item) {
                    for delegate in &self.delegates {
                        delegate.on_will_start_playing(&item);
                    }
                }
                if let Some(instance) = &self.instance {
                    instance.set_rate(self.rate);
                }
            }
            Err(e) => {
                error!(
                    error = %e,
                    source = %loggable_locator(&source),
                    "Decode engine failed to load item"
                );
                self.fail(FailureReason::EngineUnavailable(e.to_string()));
            }
        }
    }

    /// Drop the engine instance and stop the producers tied to it.
    fn release_instance(&mut self) {
        if let Some(instance) = self.instance.take() {
            instance.set_rate(0.0);
        }
        self.engine_notifier.stop();
        self.quality.stop();
        self.item_watcher.stop();
    }

    /// Reload the current item unless it is already playing, then seek back
    /// to where it was.
    fn retry_or_play_next(&mut self) {
        if self.session.state.is_playing() {
            self.retry.stop();
            self.retry.reset();
            return;
        }
        let Some(item) = self.session.current_item.clone() else {
            return;
        };

        let position = self.current_item_progression();
        debug!(item = %item.id(), ?position, "Retrying current item");
        self.set_current_item(item);

        // Best effort: the fresh instance may not be able to seek there yet.
        if let (Some(position), Some(instance)) = (position, &self.instance) {
            instance.seek(position, SeekTolerance::default(), None);
        }
    }

    fn fail(&mut self, reason: FailureReason) {
        warn!(%reason, "Playback failed");
        self.retry.stop();
        self.seek_timer.stop();
        self.release_instance();
        self.network.stop();
        self.set_state(PlaybackState::Failed(reason));
    }

    // ========================================================================
    // State & Side Effects
    // ========================================================================

    /// Whether playback should start once the engine is ready: only if the
    /// user did not pause at any checkpoint along the way.
    fn should_resume_playing(&self) -> bool {
        let session = &self.session;
        !session.state.is_paused()
            && session
                .state_when_connection_lost
                .as_ref()
                .map_or(true, |state| !state.is_paused())
            && session
                .state_before_buffering
                .as_ref()
                .map_or(true, |state| !state.is_paused())
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.session.state == state {
            return;
        }
        let from = std::mem::replace(&mut self.session.state, state.clone());

        // Held while the session waits on data or the network.
        match state {
            PlaybackState::Buffering | PlaybackState::WaitingForConnection => {
                self.begin_background()
            }
            PlaybackState::Playing | PlaybackState::Stopped | PlaybackState::Failed(_) => {
                self.end_background()
            }
            PlaybackState::Paused if from.is_buffering() => self.end_background(),
            PlaybackState::Paused => {}
        }

        if state.is_playing() {
            self.retry.reset();
            self.retry.stop();
        }

        self.publish_dynamic_metadata();

        info!(from = %from, to = %state, "Playback state changed");
        for delegate in &self.delegates {
            delegate.on_state_change(&from, &state);
        }
        if let PlaybackState::Failed(reason) = &state {
            for delegate in &self.delegates {
                delegate.on_failure(self.session.current_item.as_ref(), reason);
            }
        }
    }

    fn begin_background(&mut self) {
        if self.session.background_task.is_none() {
            self.session.background_task = self.background.begin_background_task();
        }
    }

    fn end_background(&mut self) {
        if let Some(id) = self.session.background_task.take() {
            self.background.end_background_task(id);
        }
    }

    fn activate_session(&self) {
        if let Some(now_playing) = &self.now_playing {
            if let Err(e) = now_playing.session_start() {
                warn!(error = %e, "Now-playing session could not be activated");
            }
        }
    }

    fn dynamic_metadata(&self) -> Option<DynamicMetadata> {
        let instance = self.instance.as_ref()?;
        Some(DynamicMetadata {
            rate: instance.rate(),
            position: instance.current_position()?,
            duration: instance.duration()?,
        })
    }

    fn publish_dynamic_metadata(&self) {
        if let Some(now_playing) = &self.now_playing {
            now_playing.publish_dynamic_metadata(
                self.session.state.is_playing(),
                self.dynamic_metadata().as_ref(),
            );
        }
    }

    fn publish_static_metadata(&self) {
        let (Some(now_playing), Some(item)) = (&self.now_playing, &self.session.current_item)
        else {
            return;
        };
        let metadata = item.metadata();
        now_playing.publish_static_metadata(&StaticMetadata {
            asset: item
                .highest_quality_source()
                .map(|(_, source)| source.locator())
                .unwrap_or_default(),
            media_type: MediaType::Audio,
            is_live_stream: !item.is_offline(),
            title: metadata.title,
            artist: metadata.artist,
            artwork: metadata.artwork,
            album: metadata.album,
            track_count: metadata.track_count,
            track_number: metadata.track_number,
        });
    }

    /// Count an interruption unless it comes from our own quality swap.
    fn record_interruption(&mut self) {
        if self.session.quality_change_in_progress {
            return;
        }
        self.quality.record_interruption();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.session.current_item.is_some() || !self.session.state.is_stopped() {
            self.stop();
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.session.state)
            .field("current_item", &self.session.current_item)
            .field("quality", &self.session.current_quality)
            .field("queue", &self.queue)
            .finish()
    }
}

fn admits(delegates: &[Arc<dyn PlayerDelegate>], item: &AudioItem) -> bool {
    delegates.iter().all(|delegate| delegate.should_play(item))
}

/// Locator safe to log: file names only, no query strings.
fn loggable_locator(source: &AudioSource) -> String {
    match source {
        AudioSource::LocalFile { path } => strip_path(&path.to_string_lossy()).to_string(),
        AudioSource::RemoteStream { url, .. } => redact_url(url),
        other => other.locator(),
    }
}
