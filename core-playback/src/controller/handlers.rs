//! Reactions to producer events.

use super::SessionController;
use crate::config::{BufferingStrategy, SeekingBehavior};
use crate::events::{Event, MetadataEvent, NetworkEvent, QualityEvent, RetryEvent, SeekEvent};
use crate::producers::EventProducer;
use crate::quality::QualityController;
use crate::state::{FailureReason, PlaybackState};
use bridge_traits::{EngineNotification, EngineStatus, SeekTolerance, StreamMetadata, TimeRange};
use std::time::Duration;
use tracing::{debug, info, warn};

impl SessionController {
    /// Apply one producer event.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Network(event) => self.handle_network_event(event),
            Event::Seek(event) => self.handle_seek_event(event),
            Event::Quality(event) => self.handle_quality_event(event),
            Event::Retry(event) => self.handle_retry_event(event),
            Event::Engine(notification) => self.handle_engine_notification(notification),
            Event::Item(event) => self.handle_item_event(event),
        }
    }

    // ========================================================================
    // Network
    // ========================================================================

    fn handle_network_event(&mut self, event: NetworkEvent) {
        match event {
            NetworkEvent::ConnectionLost => {
                for delegate in &self.delegates {
                    delegate.on_connectivity_change(event, None);
                }
                self.on_connection_lost();
            }
            NetworkEvent::ConnectionRetrieved => {
                let lost_for = self.session.connection_lost_at.map(|lost_at| {
                    (self.clock.now() - lost_at).to_std().unwrap_or(Duration::ZERO)
                });
                for delegate in &self.delegates {
                    delegate.on_connectivity_change(event, lost_for);
                }
                self.on_connection_retrieved(lost_for);
            }
            NetworkEvent::NetworkChanged => {
                for delegate in &self.delegates {
                    delegate.on_connectivity_change(event, None);
                }
            }
        }
    }

    fn on_connection_lost(&mut self) {
        let Some(item) = &self.session.current_item else {
            return;
        };
        if self.session.state.is_waiting_for_connection() {
            return;
        }
        let offline = item
            .source_for(self.session.current_quality)
            .is_some_and(|(_, source)| source.is_offline());
        if offline {
            debug!("Connection lost while playing an offline source");
            return;
        }

        self.session.state_when_connection_lost = Some(self.session.state.clone());
        self.session.connection_lost_at =
            Some(self.network.connection_lost_at().unwrap_or_else(|| self.clock.now()));

        let buffer_empty = self
            .instance
            .as_ref()
            .is_some_and(|instance| instance.is_buffer_empty());
        let active = self.session.state.is_playing() || self.session.state.is_buffering();
        if buffer_empty && active {
            if self.session.state.is_playing() {
                self.record_interruption();
            }
            self.set_state(PlaybackState::WaitingForConnection);
            self.begin_background();
        }
    }

    fn on_connection_retrieved(&mut self, lost_for: Option<Duration>) {
        if self.session.current_item.is_none() {
            return;
        }
        let Some(state_when_lost) = self.session.state_when_connection_lost.clone() else {
            return;
        };
        if !self.config.resume_after_connection_loss {
            self.session.state_when_connection_lost = None;
            return;
        }

        let within_budget =
            lost_for.map_or(true, |lost_for| lost_for < self.config.maximum_connection_loss_time);
        if within_budget && !state_when_lost.is_stopped() {
            info!(?lost_for, "Connection retrieved, resuming");
            self.retry_or_play_next();
        } else {
            info!(?lost_for, "Connection retrieved too late to resume");
            self.session.state_when_connection_lost = None;
        }
    }

    // ========================================================================
    // Timers
    // ========================================================================

    fn handle_seek_event(&mut self, event: SeekEvent) {
        let SeekingBehavior::ChangeTimeEvery { delta, .. } = self.config.seeking_behavior else {
            return;
        };
        let Some(position) = self.current_item_progression() else {
            return;
        };
        let target = match event {
            SeekEvent::SeekBackward => position.saturating_sub(delta),
            SeekEvent::SeekForward => position + delta,
        };
        self.seek(target, false, SeekTolerance::default(), None);
    }

    fn handle_quality_event(&mut self, event: QualityEvent) {
        if !self.config.adjust_quality_automatically {
            return;
        }
        if let Some(tier) = QualityController::adjust(self.session.current_quality, event) {
            self.change_quality(tier);
        }
    }

    /// Swap the engine source for the exact `tier`, keeping the position.
    fn change_quality(&mut self, tier: crate::item::QualityTier) {
        let Some(item) = self.session.current_item.clone() else {
            return;
        };
        let Some(source) = item.sources().get(&tier).cloned() else {
            debug!(%tier, "Item has no source for quality");
            return;
        };
        let Some(instance) = &self.instance else {
            return;
        };

        let position = instance.current_position();
        self.session.quality_change_in_progress = true;
        if let Err(e) = instance.replace_source(&source) {
            warn!(error = %e, %tier, "Quality change failed");
            self.session.quality_change_in_progress = false;
            return;
        }
        if let Some(position) = position {
            instance.seek(position, SeekTolerance::default(), None);
        }

        let from = std::mem::replace(&mut self.session.current_quality, tier);
        info!(%from, to = %tier, "Quality changed");
        for delegate in &self.delegates {
            delegate.on_quality_changed(&item, from, tier);
        }
    }

    fn handle_retry_event(&mut self, event: RetryEvent) {
        match event {
            RetryEvent::RetryAvailable => self.retry_or_play_next(),
            RetryEvent::RetryFailed => self.fail(FailureReason::MaximumRetryCountHit),
        }
    }

    fn handle_item_event(&mut self, event: MetadataEvent) {
        let is_current = self
            .session
            .current_item
            .as_ref()
            .is_some_and(|item| item.id() == event.item);
        if is_current {
            self.publish_static_metadata();
        }
    }

    // ========================================================================
    // Engine
    // ========================================================================

    fn handle_engine_notification(&mut self, notification: EngineNotification) {
        match notification {
            EngineNotification::StartedBuffering
            | EngineNotification::Stalled
            | EngineNotification::BufferEmpty => self.on_stall(),
            EngineNotification::ReadyToPlay => self.on_ready_to_play(),
            EngineNotification::Progressed(time) => self.on_progress(time),
            EngineNotification::DurationFound(duration) => self.on_duration_found(duration),
            EngineNotification::LoadedRange(range) => self.on_loaded_range(range),
            EngineNotification::MetadataLoaded(metadata) => self.on_metadata_loaded(metadata),
            EngineNotification::EndedPlaying(None) => self.next_or_stop(),
            EngineNotification::EndedPlaying(Some(error)) => {
                self.fail(FailureReason::EngineError(error))
            }
            EngineNotification::InterruptionBegan => self.on_interruption_began(),
            EngineNotification::InterruptionEnded { should_resume } => {
                self.on_interruption_ended(should_resume)
            }
            EngineNotification::RouteChanged => {
                let stopped = self
                    .instance
                    .as_ref()
                    .is_some_and(|instance| instance.rate() == 0.0);
                if self.session.state.is_playing() && stopped {
                    self.set_state(PlaybackState::Paused);
                }
            }
            EngineNotification::RateChanged(rate) => self.on_rate_changed(rate),
            EngineNotification::SessionReset => self.on_session_reset(),
            other => debug!(?other, "Unhandled engine notification"),
        }
    }

    fn on_stall(&mut self) {
        let Some(item) = self.session.current_item.clone() else {
            return;
        };
        let state = self.session.state.clone();
        if state.is_stopped() || state.is_failed() {
            return;
        }

        if state.is_playing() {
            self.record_interruption();
        }
        // Keep the first checkpoint if we are already waiting.
        if !state.is_buffering() && !state.is_waiting_for_connection() {
            self.session.state_before_buffering = Some(state.clone());
        }

        let offline = item
            .source_for(self.session.current_quality)
            .is_some_and(|(_, source)| source.is_offline());
        if self.network.is_reachable() || offline {
            self.set_state(PlaybackState::Buffering);
        } else {
            self.set_state(PlaybackState::WaitingForConnection);
        }

        if state.is_playing() {
            self.retry.start();
        }
    }

    fn on_ready_to_play(&mut self) {
        self.session.quality_change_in_progress = false;
        if self.session.current_item.is_none() {
            return;
        }
        self.resolve_buffering();
        self.retry.stop();
        self.end_background();
    }

    /// Leave a buffering phase: play unless the user paused along the way.
    fn resolve_buffering(&mut self) {
        let resume = self.should_resume_playing();
        self.session.state_before_buffering = None;
        self.session.state_when_connection_lost = None;

        if resume {
            self.set_state(PlaybackState::Playing);
            if let Some(instance) = &self.instance {
                instance.set_rate(self.rate);
            }
        } else {
            if let Some(instance) = &self.instance {
                instance.set_rate(0.0);
            }
            self.set_state(PlaybackState::Paused);
        }
    }

    fn on_progress(&mut self, time: Duration) {
        let Some(item) = self.session.current_item.clone() else {
            return;
        };
        let duration = self
            .current_item_duration()
            .filter(|duration| !duration.is_zero());

        // Engines do not always report readiness before progress.
        let ready = self
            .instance
            .as_ref()
            .is_some_and(|instance| instance.status() == EngineStatus::ReadyToPlay);
        if self.session.state.is_buffering() && ready {
            self.resolve_buffering();
            self.end_background();
        }

        let percentage = match duration {
            Some(duration) => (time.as_secs_f64() / duration.as_secs_f64() * 100.0) as f32,
            None => 0.0,
        };
        for delegate in &self.delegates {
            delegate.on_progress(&item, time, percentage);
        }
    }

    fn on_duration_found(&mut self, duration: Duration) {
        let Some(item) = self.session.current_item.clone() else {
            return;
        };
        self.publish_dynamic_metadata();
        for delegate in &self.delegates {
            delegate.on_duration_found(&item, duration);
        }
    }

    fn on_loaded_range(&mut self, range: TimeRange) {
        let Some(item) = self.session.current_item.clone() else {
            return;
        };
        for delegate in &self.delegates {
            delegate.on_buffered_range(&item, range);
        }

        if self.config.buffering_strategy != BufferingStrategy::FillThenPlay
            || !self.session.state.is_buffering()
        {
            return;
        }
        let position = self.current_item_progression().unwrap_or(range.earliest);
        let loaded_ahead = range.latest.saturating_sub(position);
        if loaded_ahead >= self.config.preferred_buffer_duration {
            debug!(loaded_ms = loaded_ahead.as_millis() as u64, "Preferred buffer filled");
            self.play_immediately();
        }
    }

    fn play_immediately(&mut self) {
        self.session.state_before_buffering = None;
        self.session.state_when_connection_lost = None;
        self.set_state(PlaybackState::Playing);
        if let Some(instance) = &self.instance {
            instance.play_immediately(self.rate);
        }
        self.retry.stop();
        self.end_background();
    }

    fn on_metadata_loaded(&mut self, metadata: StreamMetadata) {
        let Some(item) = self.session.current_item.clone() else {
            return;
        };
        if metadata.is_empty() {
            return;
        }
        let filled = item.fill_missing_metadata(&metadata);
        if !filled.is_empty() {
            for delegate in &self.delegates {
                delegate.on_metadata_filled(&item, &filled);
            }
        }
    }

    fn on_interruption_began(&mut self) {
        if !self.session.state.is_playing() && !self.session.state.is_buffering() {
            return;
        }
        self.begin_background();
        self.pause();
        self.session.paused_for_interruption = true;
    }

    fn on_interruption_ended(&mut self, should_resume: bool) {
        if !self.session.paused_for_interruption {
            return;
        }
        if self.config.resume_after_interruption && should_resume {
            self.resume();
        }
        self.session.paused_for_interruption = false;
        self.end_background();
    }

    /// A zero rate while backgrounded and retrying means the host stopped
    /// the engine under us.
    fn on_rate_changed(&mut self, rate: f32) {
        if rate != 0.0 || !self.session.state.is_playing() {
            return;
        }
        if !self.background.lifecycle_state().is_foreground() && self.retry.is_producing() {
            info!("Engine halted in background");
            self.set_state(PlaybackState::Paused);
        }
    }

    fn on_session_reset(&mut self) {
        warn!("Audio session was reset by the host");
        self.activate_session();
        self.set_state(PlaybackState::Stopped);
        self.record_interruption();
        self.retry_or_play_next();
    }
}
