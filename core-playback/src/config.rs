//! # Player Configuration
//!
//! Tunables of the playback core: connection loss tolerance, quality
//! adaptation, retry budget, buffering and seeking behaviour.

use crate::item::QualityTier;
use crate::queue::PlaybackMode;
use bridge_traits::{BufferingPolicy, RemoteCommand};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the engine should buffer before starting playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferingStrategy {
    /// Let the engine decide when enough data is loaded.
    #[default]
    Default,
    /// Load `preferred_buffer_duration` ahead, then start playback.
    FillThenPlay,
    /// Start as soon as any data is available.
    PlayWhenNonEmpty,
}

impl BufferingStrategy {
    pub fn policy(&self) -> BufferingPolicy {
        match self {
            BufferingStrategy::Default => BufferingPolicy::Automatic,
            BufferingStrategy::FillThenPlay => BufferingPolicy::Manual,
            BufferingStrategy::PlayWhenNonEmpty => BufferingPolicy::Eager,
        }
    }
}

/// How remote "hold to seek" commands move the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeekingBehavior {
    /// Multiply the rate by `factor` while the button is held.
    MultiplyRate { factor: f32 },
    /// Jump by `delta` every `interval` while the button is held.
    ChangeTimeEvery { interval: Duration, delta: Duration },
}

impl Default for SeekingBehavior {
    fn default() -> Self {
        SeekingBehavior::MultiplyRate { factor: 2.0 }
    }
}

/// When the interruption counter triggers a downgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Downgrade once the count reaches the threshold (`count >= threshold`).
    #[default]
    Reached,
    /// Downgrade once the count goes past the threshold (`count > threshold`).
    Exceeded,
}

impl ThresholdMode {
    pub fn is_met(&self, count: usize, threshold: usize) -> bool {
        match self {
            ThresholdMode::Reached => count >= threshold,
            ThresholdMode::Exceeded => count > threshold,
        }
    }
}

/// Player configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Longest connection loss after which playback resumes on its own.
    ///
    /// Default: 60 seconds.
    #[serde(default = "default_maximum_connection_loss_time")]
    pub maximum_connection_loss_time: Duration,

    /// Whether the quality tier follows interruption frequency.
    ///
    /// Default: true.
    #[serde(default = "default_true")]
    pub adjust_quality_automatically: bool,

    /// Tier used for a freshly assigned item.
    ///
    /// Default: medium.
    #[serde(default = "default_quality")]
    pub default_quality: QualityTier,

    /// Sliding window over which interruptions are counted.
    ///
    /// Default: 10 minutes.
    #[serde(default = "default_quality_time_window")]
    pub quality_time_window: Duration,

    /// Interruptions inside the window that trigger a downgrade.
    ///
    /// Default: 5.
    #[serde(default = "default_quality_interruption_threshold")]
    pub quality_interruption_threshold: usize,

    #[serde(default)]
    pub quality_threshold_mode: ThresholdMode,

    /// Recovery attempts allowed before the session fails.
    ///
    /// Default: 10.
    #[serde(default = "default_maximum_retry_count")]
    pub maximum_retry_count: usize,

    /// Delay between two recovery attempts.
    ///
    /// Default: 10 seconds.
    #[serde(default = "default_retry_timeout")]
    pub retry_timeout: Duration,

    #[serde(default = "default_true")]
    pub resume_after_interruption: bool,

    #[serde(default = "default_true")]
    pub resume_after_connection_loss: bool,

    #[serde(default)]
    pub buffering_strategy: BufferingStrategy,

    /// Amount loaded ahead before playback starts under `FillThenPlay`.
    ///
    /// Default: 60 seconds.
    #[serde(default = "default_preferred_buffer_duration")]
    pub preferred_buffer_duration: Duration,

    #[serde(default)]
    pub seeking_behavior: SeekingBehavior,

    /// Margin kept from the edges when clamping a seek to the seekable range.
    ///
    /// Default: 1 second.
    #[serde(default = "default_seek_padding")]
    pub seek_padding: Duration,

    /// Jump used by skip remote commands.
    ///
    /// Default: 15 seconds.
    #[serde(default = "default_skip_interval")]
    pub skip_interval: Duration,

    #[serde(default = "default_rate")]
    pub rate: f32,

    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Commands registered with the now-playing session.
    #[serde(default = "default_remote_commands")]
    pub remote_commands: Vec<RemoteCommand>,

    /// Registered commands shown as disabled.
    #[serde(default)]
    pub disabled_remote_commands: Vec<RemoteCommand>,

    #[serde(default)]
    pub playback_mode: PlaybackMode,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            maximum_connection_loss_time: default_maximum_connection_loss_time(),
            adjust_quality_automatically: default_true(),
            default_quality: default_quality(),
            quality_time_window: default_quality_time_window(),
            quality_interruption_threshold: default_quality_interruption_threshold(),
            quality_threshold_mode: ThresholdMode::default(),
            maximum_retry_count: default_maximum_retry_count(),
            retry_timeout: default_retry_timeout(),
            resume_after_interruption: default_true(),
            resume_after_connection_loss: default_true(),
            buffering_strategy: BufferingStrategy::default(),
            preferred_buffer_duration: default_preferred_buffer_duration(),
            seeking_behavior: SeekingBehavior::default(),
            seek_padding: default_seek_padding(),
            skip_interval: default_skip_interval(),
            rate: default_rate(),
            volume: default_volume(),
            remote_commands: default_remote_commands(),
            disabled_remote_commands: Vec::new(),
            playback_mode: PlaybackMode::default(),
        }
    }
}

impl PlayerConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.maximum_connection_loss_time.is_zero() {
            return Err("maximum_connection_loss_time must be > 0".to_string());
        }

        if self.quality_time_window.is_zero() {
            return Err("quality_time_window must be > 0".to_string());
        }

        if self.quality_interruption_threshold == 0 {
            return Err("quality_interruption_threshold must be > 0".to_string());
        }

        if self.retry_timeout.is_zero() {
            return Err("retry_timeout must be > 0".to_string());
        }

        if !(self.rate.is_finite() && self.rate > 0.0) {
            return Err("rate must be a positive number".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err("volume must be between 0.0 and 1.0".to_string());
        }

        match self.seeking_behavior {
            SeekingBehavior::MultiplyRate { factor } => {
                if !(factor.is_finite() && factor > 0.0) {
                    return Err("seeking factor must be a positive number".to_string());
                }
            }
            SeekingBehavior::ChangeTimeEvery { interval, delta } => {
                if interval.is_zero() || delta.is_zero() {
                    return Err("seeking interval and delta must be > 0".to_string());
                }
            }
        }

        if self.remote_commands.is_empty() {
            return Err("at least one remote command must be registered".to_string());
        }

        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_maximum_connection_loss_time() -> Duration {
    Duration::from_secs(60)
}

fn default_quality() -> QualityTier {
    QualityTier::Medium
}

fn default_quality_time_window() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_quality_interruption_threshold() -> usize {
    5
}

fn default_maximum_retry_count() -> usize {
    10
}

fn default_retry_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_preferred_buffer_duration() -> Duration {
    Duration::from_secs(60)
}

fn default_seek_padding() -> Duration {
    Duration::from_secs(1)
}

fn default_skip_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_rate() -> f32 {
    1.0
}

fn default_volume() -> f32 {
    1.0
}

fn default_remote_commands() -> Vec<RemoteCommand> {
    RemoteCommand::all()
}
