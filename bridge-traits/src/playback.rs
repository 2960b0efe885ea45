//! Playback bridge traits and supporting audio types.
//!
//! These abstractions describe the decode/render engine the playback core
//! drives. The core never touches samples: it loads a source into an engine
//! instance, sets its rate, seeks, queries its timeline and listens to the
//! notifications the instance emits. Host applications provide concrete
//! implementations (AVPlayer, ExoPlayer, a symphonia/cpal pipeline, ...).

use crate::error::Result;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// High-level audio source descriptor provided to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioSource {
    /// Local file accessible to the host runtime.
    LocalFile { path: PathBuf },
    /// Remote HTTP(S) stream to be fetched by the host.
    RemoteStream {
        url: String,
        headers: HashMap<String, String>,
    },
    /// In-memory audio buffer supplied by the caller.
    MemoryBuffer { data: Bytes },
}

impl AudioSource {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        AudioSource::LocalFile { path: path.into() }
    }

    pub fn remote(url: impl Into<String>) -> Self {
        AudioSource::RemoteStream {
            url: url.into(),
            headers: HashMap::new(),
        }
    }

    /// Determine whether the source represents remote content.
    pub fn is_remote(&self) -> bool {
        matches!(self, AudioSource::RemoteStream { .. })
    }

    /// Whether the source can be played without network access.
    ///
    /// Local files and memory buffers always can. Remote locators count as
    /// offline when they use the `file` scheme or point at the loopback host.
    pub fn is_offline(&self) -> bool {
        match self {
            AudioSource::LocalFile { .. } | AudioSource::MemoryBuffer { .. } => true,
            AudioSource::RemoteStream { url, .. } => match Url::parse(url) {
                Ok(parsed) => {
                    parsed.scheme() == "file"
                        || matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1"))
                }
                Err(_) => false,
            },
        }
    }

    /// Raw locator string (file path or URL).
    pub fn locator(&self) -> String {
        match self {
            AudioSource::LocalFile { path } => path.display().to_string(),
            AudioSource::RemoteStream { url, .. } => url.clone(),
            AudioSource::MemoryBuffer { data } => format!("memory://{}-bytes", data.len()),
        }
    }
}

/// Half-open time interval on the item timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub earliest: Duration,
    pub latest: Duration,
}

impl TimeRange {
    pub fn new(earliest: Duration, latest: Duration) -> Self {
        Self { earliest, latest }
    }

    pub fn contains(&self, position: Duration) -> bool {
        position >= self.earliest && position <= self.latest
    }

    pub fn span(&self) -> Duration {
        self.latest.saturating_sub(self.earliest)
    }
}

/// How far from the requested position the engine may land.
///
/// `None` means unbounded, which lets the engine pick the nearest sync point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeekTolerance {
    pub before: Option<Duration>,
    pub after: Option<Duration>,
}

impl SeekTolerance {
    /// Sample-accurate seek.
    pub fn exact() -> Self {
        Self {
            before: Some(Duration::ZERO),
            after: Some(Duration::ZERO),
        }
    }
}

/// Engine-side buffering behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferingPolicy {
    /// Let the engine decide when to start playing.
    #[default]
    Automatic,
    /// Never start automatically; the core calls `play_immediately`.
    Manual,
    /// Start as soon as any data is available.
    Eager,
}

/// Coarse engine readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Unknown,
    ReadyToPlay,
    Failed(String),
}

/// Options applied when creating an engine instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    /// Initial volume (0.0 = muted, 1.0 = unity gain).
    pub volume: f32,
    pub buffering: BufferingPolicy,
    /// Hint for adapters to pre-buffer this much audio ahead.
    pub preferred_forward_buffer: Duration,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            volume: 1.0,
            buffering: BufferingPolicy::Automatic,
            preferred_forward_buffer: Duration::ZERO,
        }
    }
}

/// Artwork attached to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub data: Bytes,
    pub mime_type: Option<String>,
}

/// Descriptive tags discovered in the stream itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub track_count: Option<u32>,
    pub artwork: Option<Artwork>,
    /// Tags without a dedicated field (genre, comment, ...).
    pub extra: HashMap<String, String>,
}

impl StreamMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.track_number.is_none()
            && self.track_count.is_none()
            && self.artwork.is_none()
            && self.extra.is_empty()
    }
}

/// Notification emitted by an engine instance.
///
/// New variants may be added; consumers must ignore the ones they do not know.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EngineNotification {
    /// The engine started buffering.
    StartedBuffering,
    /// Playback stalled because the buffer ran dry.
    Stalled,
    /// The playback buffer became empty.
    BufferEmpty,
    /// The engine can start rendering.
    ReadyToPlay,
    /// The effective rate changed.
    RateChanged(f32),
    /// Periodic position report.
    Progressed(Duration),
    /// The duration of the item became known.
    DurationFound(Duration),
    /// The loaded (buffered) range grew.
    LoadedRange(TimeRange),
    /// Tags were found in the stream.
    MetadataLoaded(StreamMetadata),
    /// The item ended, with an error message when it failed.
    EndedPlaying(Option<String>),
    /// Another application took over audio output.
    InterruptionBegan,
    /// The interruption ended; `should_resume` is the system's hint.
    InterruptionEnded { should_resume: bool },
    /// The audio route changed (headphones unplugged, ...).
    RouteChanged,
    /// The platform media services were reset.
    SessionReset,
}

/// Called with `true` when a seek finished, `false` when it was interrupted or impossible.
pub type SeekCompletion = Box<dyn FnOnce(bool) + Send + 'static>;

/// A loaded item inside the decode engine.
///
/// All calls are expected to return quickly; long-running work happens on the
/// engine's own threads and is reported through [`EngineNotificationStream`].
pub trait EngineInstance: Send + Sync {
    fn set_rate(&self, rate: f32);

    fn rate(&self) -> f32;

    /// Start playing at `rate` even if the buffer is not considered full.
    fn play_immediately(&self, rate: f32) {
        self.set_rate(rate);
    }

    fn set_volume(&self, volume: f32);

    /// Swap the underlying source while keeping the instance.
    fn replace_source(&self, source: &AudioSource) -> Result<()>;

    fn seek(&self, to: Duration, tolerance: SeekTolerance, completion: Option<SeekCompletion>);

    fn status(&self) -> EngineStatus;

    fn current_position(&self) -> Option<Duration>;

    fn duration(&self) -> Option<Duration>;

    fn seekable_range(&self) -> Option<TimeRange>;

    fn loaded_range(&self) -> Option<TimeRange>;

    fn is_buffer_empty(&self) -> bool;

    fn set_buffering_policy(&self, policy: BufferingPolicy);

    /// Subscribe to this instance's notifications.
    fn notifications(&self) -> Box<dyn EngineNotificationStream>;
}

/// Decode/render engine able to create instances.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::playback::{AudioSource, DecodeEngine, LoadOptions};
///
/// fn start(engine: &dyn DecodeEngine) -> bridge_traits::error::Result<()> {
///     let instance = engine.load(&AudioSource::remote("https://example.com/a.mp3"), &LoadOptions::default())?;
///     instance.set_rate(1.0);
///     Ok(())
/// }
/// ```
pub trait DecodeEngine: Send + Sync {
    fn load(&self, source: &AudioSource, options: &LoadOptions) -> Result<Box<dyn EngineInstance>>;
}

/// Stream of engine notifications
#[async_trait::async_trait]
pub trait EngineNotificationStream: Send {
    /// Returns `None` once the instance is gone.
    async fn next(&mut self) -> Option<EngineNotification>;
}
