//! # Quality Controller
//!
//! Decides when the stream quality should step down or up, based on how
//! often playback was interrupted recently.
//!
//! ## Policy
//!
//! - Every interruption is timestamped into a sliding [`InterruptionWindow`].
//! - Once the number of interruptions inside the window meets the threshold
//!   (see [`ThresholdMode`]) the controller answers `GoDown` and the window
//!   starts over.
//! - When a full window goes by without any interruption the controller
//!   answers `GoUp`.
//! - A decision moves exactly one tier; at either end it is a no-op.

use crate::config::{PlayerConfig, ThresholdMode};
use crate::events::QualityEvent;
use crate::item::QualityTier;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Timestamps of recent interruptions within a trailing duration.
#[derive(Debug, Clone)]
pub struct InterruptionWindow {
    span: Duration,
    timestamps: VecDeque<Instant>,
}

impl InterruptionWindow {
    pub fn new(span: Duration) -> Self {
        Self {
            span,
            timestamps: VecDeque::new(),
        }
    }

    pub fn span(&self) -> Duration {
        self.span
    }

    pub fn record(&mut self, at: Instant) {
        self.prune(at);
        self.timestamps.push_back(at);
    }

    /// Number of interruptions younger than the window at `now`.
    pub fn count(&mut self, now: Instant) -> usize {
        self.prune(now);
        self.timestamps.len()
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
    }

    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.saturating_duration_since(*oldest) >= self.span {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Interruption-driven quality policy.
#[derive(Debug, Clone)]
pub struct QualityController {
    window: InterruptionWindow,
    threshold: usize,
    mode: ThresholdMode,
}

impl QualityController {
    pub fn new(span: Duration, threshold: usize, mode: ThresholdMode) -> Self {
        Self {
            window: InterruptionWindow::new(span),
            threshold,
            mode,
        }
    }

    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(
            config.quality_time_window,
            config.quality_interruption_threshold,
            config.quality_threshold_mode,
        )
    }

    /// Apply new limits; interruptions already counted are kept.
    pub fn reconfigure(&mut self, config: &PlayerConfig) {
        self.window.span = config.quality_time_window;
        self.threshold = config.quality_interruption_threshold;
        self.mode = config.quality_threshold_mode;
    }

    pub fn window_span(&self) -> Duration {
        self.window.span()
    }

    pub fn interruption_count(&mut self, now: Instant) -> usize {
        self.window.count(now)
    }

    /// Count an interruption; answers `GoDown` when the threshold is met.
    pub fn record_interruption(&mut self, at: Instant) -> Option<QualityEvent> {
        self.window.record(at);
        let count = self.window.count(at);
        debug!(count, threshold = self.threshold, "Interruption recorded");

        if self.mode.is_met(count, self.threshold) {
            self.window.clear();
            Some(QualityEvent::GoDown)
        } else {
            None
        }
    }

    /// Called when a full window elapsed; answers `GoUp` if it was calm.
    pub fn window_elapsed(&mut self, now: Instant) -> Option<QualityEvent> {
        (self.window.count(now) == 0).then_some(QualityEvent::GoUp)
    }

    /// Tier after applying `event` to `current`, or `None` at the boundary.
    pub fn adjust(current: QualityTier, event: QualityEvent) -> Option<QualityTier> {
        match event {
            QualityEvent::GoUp => current.higher(),
            QualityEvent::GoDown => current.lower(),
        }
    }
}
