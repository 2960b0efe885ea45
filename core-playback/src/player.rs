//! # Player
//!
//! Async handle to a playback session.
//!
//! ## Overview
//!
//! [`Player::spawn`] moves a [`SessionController`] into a dedicated tokio
//! task. That task is the session's only executor: it drains user commands
//! sent through the handle and events delivered by the producers, one at a
//! time, so every transition observes the result of the previous one.
//!
//! ```text
//!  Player (clone) ──commands──┐
//!  Remote handler ──commands──┤
//!                             ▼
//!                       ┌────────────┐   handle(event)   ┌───────────────────┐
//!  Producers ──events──>│ Player task├──────────────────>│ SessionController │
//!                       └─────┬──────┘                   └───────────────────┘
//!                             └──> watch<PlayerSnapshot>
//! ```
//!
//! Envelopes from a producer that was stopped after emitting are dropped
//! before they reach the controller.
//!
//! ## Usage
//!
//! ```ignore
//! let player = Player::spawn(core_config, PlayerConfig::default()).await?;
//! let mut events = player.subscribe();
//!
//! player.play(vec![AudioItem::with_source(AudioSource::remote(url))], 0).await?;
//! player.pause().await?;
//! ```

use crate::config::PlayerConfig;
use crate::controller::{command_status, PlayerSnapshot, SessionController};
use crate::delegate::PlayerDelegate;
use crate::error::{PlaybackError, Result};
use crate::item::{AudioItem, QualityTier};
use crate::producers::{Envelope, EventSink, Reachability};
use crate::queue::PlaybackMode;
use crate::state::PlaybackState;
use bridge_traits::{
    CommandHandler, CommandStatus, NetworkMonitor, RemoteCommandEvent, SeekTolerance, TimeRange,
};
use core_runtime::config::CoreConfig;
use core_runtime::events::{CoreEvent, EventBus, EventStream, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, trace};

type Job = Box<dyn FnOnce(&mut SessionController) + Send>;

enum Command {
    Run(Job),
    Shutdown(oneshot::Sender<()>),
}

/// Cloneable handle to a running playback session.
#[derive(Clone)]
pub struct Player {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: watch::Receiver<PlayerSnapshot>,
    bus: EventBus,
    network: Arc<dyn NetworkMonitor>,
}

impl Player {
    /// Start a session with the given collaborators and settings.
    pub async fn spawn(core: CoreConfig, config: PlayerConfig) -> Result<Self> {
        Self::spawn_with_delegate(core, config, None).await
    }

    /// Start a session with an additional delegate.
    ///
    /// The delegate is called from the player task and must not block.
    pub async fn spawn_with_delegate(
        core: CoreConfig,
        config: PlayerConfig,
        delegate: Option<Arc<dyn PlayerDelegate>>,
    ) -> Result<Self> {
        core.validate()?;
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        let info = core.network_monitor.get_network_info().await?;
        let initial = Reachability::from(&info);
        debug!(?initial, "Initial reachability");

        let bus = EventBus::new(core.event_bus_capacity);
        let (sink, events) = EventSink::new();
        let (commands, command_rx) = mpsc::unbounded_channel();

        let mut controller =
            SessionController::new(&core, config.clone(), initial, sink, bus.clone())?;
        if let Some(delegate) = delegate {
            controller.add_delegate(delegate);
        }
        let (snapshot_tx, snapshot) = watch::channel(controller.snapshot());

        if let Some(now_playing) = &core.now_playing {
            let handler = remote_command_handler(commands.downgrade(), snapshot.clone());
            now_playing
                .configure(
                    &config.remote_commands,
                    &config.disabled_remote_commands,
                    handler,
                )
                .map_err(PlaybackError::NowPlaying)?;
        }

        tokio::spawn(run(controller, command_rx, events, snapshot_tx));
        info!("Player started");

        Ok(Self {
            commands,
            snapshot,
            bus,
            network: Arc::clone(&core.network_monitor),
        })
    }

    /// Run `f` on the controller inside the player task.
    async fn call<R, F>(&self, f: F) -> Result<R>
    where
        R: Send + 'static,
        F: FnOnce(&mut SessionController) -> R + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Run(Box::new(move |controller| {
                let _ = tx.send(f(controller));
            })))
            .map_err(|_| PlaybackError::PlayerClosed)?;
        rx.await.map_err(|_| PlaybackError::PlayerClosed)
    }

    // ========================================================================
    // Queue
    // ========================================================================

    /// Replace the queue and start playing at `start_index`.
    pub async fn play(&self, items: Vec<AudioItem>, start_index: usize) -> Result<()> {
        let info = self.network.get_network_info().await.ok();
        self.call(move |controller| {
            if let Some(info) = &info {
                controller.refresh_reachability(info);
            }
            controller.play(items, start_index)
        })
        .await?
    }

    /// Append items; plays them if nothing is queued.
    pub async fn add(&self, items: Vec<AudioItem>) -> Result<()> {
        let info = self.network.get_network_info().await.ok();
        self.call(move |controller| {
            if let Some(info) = &info {
                controller.refresh_reachability(info);
            }
            controller.add(items)
        })
        .await?
    }

    pub async fn remove_item(&self, index: usize) -> Result<AudioItem> {
        self.call(move |controller| controller.remove_item(index)).await?
    }

    pub async fn next(&self) -> Result<()> {
        self.call(|controller| controller.next()).await
    }

    pub async fn previous(&self) -> Result<()> {
        self.call(|controller| controller.previous()).await
    }

    pub async fn set_mode(&self, mode: PlaybackMode) -> Result<()> {
        self.call(move |controller| controller.set_mode(mode)).await
    }

    // ========================================================================
    // Transport
    // ========================================================================

    pub async fn resume(&self) -> Result<()> {
        self.call(|controller| controller.resume()).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.call(|controller| controller.pause()).await
    }

    pub async fn toggle_play_pause(&self) -> Result<()> {
        self.call(|controller| controller.toggle_play_pause()).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.call(|controller| controller.stop()).await
    }

    /// Seek and wait for the engine to report whether it landed.
    pub async fn seek(
        &self,
        to: Duration,
        adapt_to_seekable_range: bool,
        tolerance: SeekTolerance,
    ) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.call(move |controller| {
            controller.seek(
                to,
                adapt_to_seekable_range,
                tolerance,
                Some(Box::new(move |finished: bool| {
                    let _ = tx.send(finished);
                })),
            )
        })
        .await?;
        Ok(rx.await.unwrap_or(false))
    }

    pub async fn seek_to_seekable_range_start(&self, padding: Duration) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.call(move |controller| {
            controller.seek_to_seekable_range_start(
                padding,
                Some(Box::new(move |finished: bool| {
                    let _ = tx.send(finished);
                })),
            )
        })
        .await?;
        Ok(rx.await.unwrap_or(false))
    }

    pub async fn seek_to_seekable_range_end(&self, padding: Duration) -> Result<bool> {
        let (tx, rx) = oneshot::channel();
        self.call(move |controller| {
            controller.seek_to_seekable_range_end(
                padding,
                Some(Box::new(move |finished: bool| {
                    let _ = tx.send(finished);
                })),
            )
        })
        .await?;
        Ok(rx.await.unwrap_or(false))
    }

    pub async fn set_rate(&self, rate: f32) -> Result<()> {
        self.call(move |controller| controller.set_rate(rate)).await
    }

    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        self.call(move |controller| controller.set_volume(volume)).await
    }

    /// Replace the session settings.
    pub async fn reconfigure(&self, config: PlayerConfig) -> Result<()> {
        self.call(move |controller| controller.apply_config(config)).await?
    }

    /// Execute a remote command as if it came from the media surface.
    pub async fn handle_remote_command(&self, event: RemoteCommandEvent) -> Result<CommandStatus> {
        self.call(move |controller| controller.handle_remote_command(event)).await
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn state(&self) -> Result<PlaybackState> {
        self.call(|controller| controller.state().clone()).await
    }

    pub async fn current_item(&self) -> Result<Option<AudioItem>> {
        self.call(|controller| controller.current_item().cloned()).await
    }

    pub async fn current_quality(&self) -> Result<QualityTier> {
        self.call(|controller| controller.current_quality()).await
    }

    /// Queued items in play order.
    pub async fn items(&self) -> Result<Vec<AudioItem>> {
        self.call(|controller| controller.items()).await
    }

    pub async fn current_item_index(&self) -> Result<Option<usize>> {
        self.call(|controller| controller.current_item_index()).await
    }

    pub async fn current_item_progression(&self) -> Result<Option<Duration>> {
        self.call(|controller| controller.current_item_progression()).await
    }

    pub async fn current_item_duration(&self) -> Result<Option<Duration>> {
        self.call(|controller| controller.current_item_duration()).await
    }

    pub async fn current_item_seekable_range(&self) -> Result<Option<TimeRange>> {
        self.call(|controller| controller.current_item_seekable_range()).await
    }

    pub async fn current_item_loaded_range(&self) -> Result<Option<TimeRange>> {
        self.call(|controller| controller.current_item_loaded_range()).await
    }

    /// Latest snapshot published by the player task.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that is notified after every handled command or event.
    pub fn watch(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot.clone()
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.bus.subscribe()
    }

    pub fn events(&self) -> EventStream {
        EventStream::new(self.bus.subscribe())
    }

    /// Stop playback and end the player task.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(Command::Shutdown(tx))
            .map_err(|_| PlaybackError::PlayerClosed)?;
        rx.await.map_err(|_| PlaybackError::PlayerClosed)
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("snapshot", &*self.snapshot.borrow())
            .finish()
    }
}

/// Handler for the now-playing surface.
///
/// The status is decided from the latest snapshot; the command itself runs
/// on the player task.
fn remote_command_handler(
    commands: mpsc::WeakUnboundedSender<Command>,
    snapshot: watch::Receiver<PlayerSnapshot>,
) -> CommandHandler {
    Arc::new(move |event: RemoteCommandEvent| {
        let has_item = snapshot.borrow().item_id.is_some();
        let status = command_status(has_item, &event);
        if status != CommandStatus::Success {
            return status;
        }
        let Some(commands) = commands.upgrade() else {
            return CommandStatus::CommandFailed;
        };
        let job: Job = Box::new(move |controller| {
            controller.handle_remote_command(event);
        });
        match commands.send(Command::Run(job)) {
            Ok(()) => CommandStatus::Success,
            Err(_) => CommandStatus::CommandFailed,
        }
    })
}

async fn run(
    mut controller: SessionController,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut events: mpsc::UnboundedReceiver<Envelope>,
    snapshot: watch::Sender<PlayerSnapshot>,
) {
    loop {
        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(Command::Run(job)) => job(&mut controller),
                Some(Command::Shutdown(done)) => {
                    controller.stop();
                    snapshot.send_replace(controller.snapshot());
                    let _ = done.send(());
                    break;
                }
                None => {
                    controller.stop();
                    break;
                }
            },
            Some(envelope) = events.recv() => {
                if envelope.is_current() {
                    trace!(source = ?envelope.source(), "Handling event");
                    controller.handle(envelope.into_event());
                } else {
                    trace!(source = ?envelope.source(), "Dropped event of a stopped producer");
                }
            }
        }
        snapshot.send_replace(controller.snapshot());
    }
    info!("Player stopped");
}
