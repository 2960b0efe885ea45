//! # Playback Session Demo
//!
//! Drives a [`Player`] against a simulated decode engine that "plays" local
//! files by ticking a clock, so the whole state machine can be watched from a
//! terminal without any audio hardware.
//!
//! Run with: `cargo run --example session_demo --package core-playback`

use async_trait::async_trait;
use bridge_traits::{
    AudioSource, BufferingPolicy, DecodeEngine, EngineInstance, EngineNotification,
    EngineNotificationStream, EngineStatus, LoadOptions, RemoteCommandEvent, SeekCompletion,
    SeekTolerance, TimeRange,
};
use bridge_desktop::{DesktopBackgroundHandler, DesktopNetworkMonitor, LoggingNowPlayingSession};
use core_playback::{AudioItem, PlaybackState, Player, PlayerConfig, QualityTier, Result};
use core_runtime::config::CoreConfig;
use core_runtime::events::CoreEvent;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const TICK: Duration = Duration::from_millis(250);

// ============================================================================
// Simulated engine
// ============================================================================

struct Timeline {
    rate: f32,
    position: Duration,
    duration: Duration,
}

struct SimulatedInstance {
    timeline: Arc<Mutex<Timeline>>,
    stream: Mutex<Option<mpsc::UnboundedReceiver<EngineNotification>>>,
}

struct SimulatedStream(Option<mpsc::UnboundedReceiver<EngineNotification>>);

#[async_trait]
impl EngineNotificationStream for SimulatedStream {
    async fn next(&mut self) -> Option<EngineNotification> {
        match self.0.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }
}

impl EngineInstance for SimulatedInstance {
    fn set_rate(&self, rate: f32) {
        self.timeline.lock().rate = rate;
    }

    fn rate(&self) -> f32 {
        self.timeline.lock().rate
    }

    fn set_volume(&self, _volume: f32) {}

    fn replace_source(&self, source: &AudioSource) -> bridge_traits::error::Result<()> {
        println!("   engine: switching to {}", source.locator());
        Ok(())
    }

    fn seek(&self, to: Duration, _tolerance: SeekTolerance, completion: Option<SeekCompletion>) {
        let mut timeline = self.timeline.lock();
        timeline.position = to.min(timeline.duration);
        drop(timeline);
        if let Some(done) = completion {
            done(true);
        }
    }

    fn status(&self) -> EngineStatus {
        EngineStatus::ReadyToPlay
    }

    fn current_position(&self) -> Option<Duration> {
        Some(self.timeline.lock().position)
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.timeline.lock().duration)
    }

    fn seekable_range(&self) -> Option<TimeRange> {
        Some(TimeRange::new(Duration::ZERO, self.timeline.lock().duration))
    }

    fn loaded_range(&self) -> Option<TimeRange> {
        self.seekable_range()
    }

    fn is_buffer_empty(&self) -> bool {
        false
    }

    fn set_buffering_policy(&self, _policy: BufferingPolicy) {}

    fn notifications(&self) -> Box<dyn EngineNotificationStream> {
        Box::new(SimulatedStream(self.stream.lock().take()))
    }
}

/// Every load yields a short track that becomes ready after one tick.
struct SimulatedEngine {
    track_length: Duration,
}

impl DecodeEngine for SimulatedEngine {
    fn load(
        &self,
        source: &AudioSource,
        _options: &LoadOptions,
    ) -> bridge_traits::error::Result<Box<dyn EngineInstance>> {
        println!("   engine: loading {}", source.locator());
        let (tx, rx) = mpsc::unbounded_channel();
        let timeline = Arc::new(Mutex::new(Timeline {
            rate: 0.0,
            position: Duration::ZERO,
            duration: self.track_length,
        }));

        tokio::spawn(drive(Arc::clone(&timeline), tx));

        Ok(Box::new(SimulatedInstance {
            timeline,
            stream: Mutex::new(Some(rx)),
        }))
    }
}

async fn drive(timeline: Arc<Mutex<Timeline>>, tx: mpsc::UnboundedSender<EngineNotification>) {
    tokio::time::sleep(TICK).await;
    let duration = timeline.lock().duration;
    let _ = tx.send(EngineNotification::DurationFound(duration));
    let _ = tx.send(EngineNotification::ReadyToPlay);

    loop {
        tokio::time::sleep(TICK).await;
        let (position, finished) = {
            let mut t = timeline.lock();
            if t.rate > 0.0 {
                t.position = (t.position + TICK.mul_f32(t.rate * 8.0)).min(t.duration);
            }
            (t.position, t.position >= t.duration)
        };
        if tx.send(EngineNotification::Progressed(position)).is_err() {
            return;
        }
        if finished {
            let _ = tx.send(EngineNotification::EndedPlaying(None));
            return;
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))?;

    println!("Audio Session - Player Demo\n");

    let now_playing = Arc::new(LoggingNowPlayingSession::new());
    let core = CoreConfig::builder()
        .decode_engine(Arc::new(SimulatedEngine {
            track_length: Duration::from_secs(20),
        }))
        .network_monitor(Arc::new(DesktopNetworkMonitor::new()))
        .background_tasks(Arc::new(DesktopBackgroundHandler::new()))
        .now_playing(now_playing.clone())
        .build()?;

    let player = Player::spawn(core, PlayerConfig::default()).await?;
    let mut events = player.subscribe();

    tokio::spawn(async move {
        while let Ok(CoreEvent::Playback(event)) = events.recv().await {
            println!("   event: {}", event.description());
        }
    });

    let items = vec![
        AudioItem::new([
            (QualityTier::Low, AudioSource::local("/music/intro-64.m4a")),
            (QualityTier::High, AudioSource::local("/music/intro-320.m4a")),
        ])?,
        AudioItem::with_source(AudioSource::local("/music/outro.flac")),
    ];
    items[0].set_title(Some("Intro".to_string()));
    items[1].set_title(Some("Outro".to_string()));

    println!("Starting queue of {} items...", items.len());
    player.play(items, 0).await?;

    let mut watch = player.watch();
    let _ = watch.wait_for(|s| s.state == PlaybackState::Playing).await;
    println!("Playing {:?}", player.current_item().await?.and_then(|i| i.title()));

    tokio::time::sleep(Duration::from_secs(1)).await;
    println!("\nRemote pause: {:?}", now_playing.dispatch(RemoteCommandEvent::Pause));
    tokio::time::sleep(Duration::from_millis(500)).await;
    println!("Remote play: {:?}\n", now_playing.dispatch(RemoteCommandEvent::Play));

    let _ = watch
        .wait_for(|s| s.item_index == Some(1) && s.state == PlaybackState::Playing)
        .await;
    println!("\nAdvanced to {:?}", player.current_item().await?.and_then(|i| i.title()));

    let _ = watch.wait_for(|s| s.state == PlaybackState::Stopped).await;
    println!("\nQueue finished: {:?}", player.snapshot());

    player.shutdown().await?;
    Ok(())
}
