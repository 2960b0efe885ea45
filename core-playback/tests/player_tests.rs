mod support;

use bridge_traits::{
    CommandStatus, EngineNotification, NetworkInfo, NetworkType, RemoteCommandEvent, SeekPhase,
    SeekTolerance,
};
use core_playback::{
    PlaybackError, PlaybackMode, PlaybackState, Player, PlayerConfig, PlayerSnapshot,
    SeekingBehavior,
};
use core_runtime::events::{CoreEvent, PlaybackEvent};
use std::time::Duration;
use support::*;
use tokio::sync::watch;
use tokio::time::timeout;

async fn wait_for(
    watch: &mut watch::Receiver<PlayerSnapshot>,
    predicate: impl Fn(&PlayerSnapshot) -> bool,
) -> PlayerSnapshot {
    timeout(Duration::from_secs(5), watch.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for player state")
        .expect("player task ended")
        .clone()
}

async fn spawn(config: PlayerConfig, network: FakeNetwork) -> (Player, Collaborators) {
    let deps = Collaborators::new(network);
    let player = Player::spawn(deps.core_config(), config).await.unwrap();
    (player, deps)
}

/// Player with one item loaded and the engine ready.
async fn spawn_playing(config: PlayerConfig) -> (Player, Collaborators) {
    let (player, deps) = spawn(config, FakeNetwork::online()).await;
    let mut watch = player.watch();
    player.play(vec![remote_item("a")], 0).await.unwrap();

    let instance = deps.engine.latest();
    instance.set_ready();
    instance.notify(EngineNotification::ReadyToPlay);
    wait_for(&mut watch, |s| s.state == PlaybackState::Playing).await;
    (player, deps)
}

#[tokio::test]
async fn test_engine_notifications_drive_state() {
    let (player, deps) = spawn(config(), FakeNetwork::online()).await;
    let mut events = player.subscribe();
    let mut watch = player.watch();

    player.play(vec![remote_item("a")], 0).await.unwrap();
    assert_eq!(player.state().await.unwrap(), PlaybackState::Buffering);

    let instance = deps.engine.latest();
    instance.set_ready();
    instance.notify(EngineNotification::ReadyToPlay);
    let snapshot = wait_for(&mut watch, |s| s.state == PlaybackState::Playing).await;
    assert_eq!(snapshot.queue_len, 1);

    let first = events.recv().await.unwrap();
    assert!(matches!(
        first,
        CoreEvent::Playback(PlaybackEvent::StateChanged { .. })
    ));
}

#[tokio::test]
async fn test_remote_commands_reach_the_session() {
    let (player, deps) = spawn_playing(config()).await;
    let mut watch = player.watch();

    let status = deps.now_playing.dispatch(RemoteCommandEvent::Pause);
    assert_eq!(status, CommandStatus::Success);
    wait_for(&mut watch, |s| s.state == PlaybackState::Paused).await;

    deps.now_playing.dispatch(RemoteCommandEvent::Play);
    wait_for(&mut watch, |s| s.state == PlaybackState::Playing).await;

    deps.now_playing.dispatch(RemoteCommandEvent::ChangeRepeatMode(bridge_traits::RepeatType::One));
    wait_for(&mut watch, |s| s.mode == PlaybackMode::RepeatOne).await;
}

#[tokio::test]
async fn test_remote_command_without_item_is_not_actionable() {
    let (_player, deps) = spawn(config(), FakeNetwork::online()).await;
    assert_eq!(
        deps.now_playing.dispatch(RemoteCommandEvent::TogglePlayPause),
        CommandStatus::NoActionableNowPlayingItem
    );
    assert_eq!(
        deps.now_playing.dispatch(RemoteCommandEvent::Stop),
        CommandStatus::Success
    );
}

#[tokio::test]
async fn test_remote_skip_uses_configured_interval() {
    let (player, deps) = spawn_playing(config()).await;
    let instance = deps.engine.latest();
    instance.set_seekable(Duration::ZERO, Duration::from_secs(300));
    instance.set_position(Duration::from_secs(40));

    let status = player
        .handle_remote_command(RemoteCommandEvent::SkipForward(Duration::ZERO))
        .await
        .unwrap();
    assert_eq!(status, CommandStatus::Success);
    assert_eq!(instance.last_seek(), Some(Duration::from_secs(55)));

    player
        .handle_remote_command(RemoteCommandEvent::SkipBackward(Duration::from_secs(50)))
        .await
        .unwrap();
    assert_eq!(instance.last_seek(), Some(Duration::from_secs(5)));
}

#[tokio::test]
async fn test_hold_to_seek_multiplies_rate() {
    let (player, deps) = spawn_playing(config()).await;
    let instance = deps.engine.latest();

    player
        .handle_remote_command(RemoteCommandEvent::SeekForward(SeekPhase::Begin))
        .await
        .unwrap();
    assert_eq!(instance.current_rate(), 2.0);
    player
        .handle_remote_command(RemoteCommandEvent::SeekForward(SeekPhase::End))
        .await
        .unwrap();
    assert_eq!(instance.current_rate(), 1.0);

    player
        .handle_remote_command(RemoteCommandEvent::SeekBackward(SeekPhase::Begin))
        .await
        .unwrap();
    assert_eq!(instance.current_rate(), -2.0);
    player
        .handle_remote_command(RemoteCommandEvent::SeekBackward(SeekPhase::End))
        .await
        .unwrap();
    assert_eq!(instance.current_rate(), 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_hold_to_seek_steps_on_a_timer() {
    let mut cfg = config();
    cfg.seeking_behavior = SeekingBehavior::ChangeTimeEvery {
        interval: Duration::from_secs(1),
        delta: Duration::from_secs(5),
    };
    let (player, deps) = spawn_playing(cfg).await;
    let instance = deps.engine.latest();
    instance.set_position(Duration::from_secs(30));

    player
        .handle_remote_command(RemoteCommandEvent::SeekForward(SeekPhase::Begin))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(3500)).await;
    player
        .handle_remote_command(RemoteCommandEvent::SeekForward(SeekPhase::End))
        .await
        .unwrap();
    assert_eq!(instance.last_seek(), Some(Duration::from_secs(45)));

    tokio::time::sleep(Duration::from_secs(5)).await;
    player.state().await.unwrap();
    assert_eq!(instance.seeks.lock().len(), 3);
}

#[tokio::test]
async fn test_network_loss_and_recovery() {
    let (player, deps) = spawn_playing(config()).await;
    let mut watch = player.watch();
    deps.engine.latest().set_buffer_empty(true);

    deps.network.set(NetworkInfo::disconnected());
    wait_for(&mut watch, |s| s.state == PlaybackState::WaitingForConnection).await;

    deps.network.set(NetworkInfo::connected(NetworkType::Cellular));
    wait_for(&mut watch, |s| s.state == PlaybackState::Buffering).await;
    assert_eq!(deps.engine.load_count(), 2);

    let instance = deps.engine.latest();
    instance.set_ready();
    instance.notify(EngineNotification::ReadyToPlay);
    wait_for(&mut watch, |s| s.state == PlaybackState::Playing).await;
}

#[tokio::test]
async fn test_play_refreshes_reachability() {
    let (player, deps) = spawn(config(), FakeNetwork::offline()).await;
    deps.network.set(NetworkInfo::connected(NetworkType::WiFi));

    player.play(vec![remote_item("a")], 0).await.unwrap();
    assert_eq!(player.state().await.unwrap(), PlaybackState::Buffering);
    assert_eq!(deps.engine.load_count(), 1);
}

#[tokio::test]
async fn test_seek_waits_for_completion() {
    let (player, deps) = spawn_playing(config()).await;
    let landed = player
        .seek(Duration::from_secs(12), false, SeekTolerance::exact())
        .await
        .unwrap();
    assert!(landed);
    assert_eq!(
        player.current_item_progression().await.unwrap(),
        Some(Duration::from_secs(12))
    );
    assert_eq!(deps.engine.latest().last_seek(), Some(Duration::from_secs(12)));
}

#[tokio::test]
async fn test_reconfigure_rejects_invalid_settings() {
    let (player, _deps) = spawn(config(), FakeNetwork::online()).await;
    let mut cfg = config();
    cfg.volume = 3.0;
    assert!(matches!(
        player.reconfigure(cfg).await,
        Err(PlaybackError::InvalidConfig(_))
    ));
}

#[tokio::test]
async fn test_spawn_rejects_invalid_config() {
    let deps = Collaborators::new(FakeNetwork::online());
    let mut cfg = config();
    cfg.maximum_retry_count = 0;
    cfg.rate = -1.0;
    let err = Player::spawn(deps.core_config(), cfg).await.unwrap_err();
    assert!(err.is_configuration_error());
}

#[tokio::test]
async fn test_shutdown_stops_session_and_closes_handle() {
    let (player, deps) = spawn_playing(config()).await;
    player.shutdown().await.unwrap();

    assert_eq!(player.snapshot().state, PlaybackState::Stopped);
    assert!(!deps.now_playing.is_active());
    assert!(matches!(
        player.pause().await,
        Err(PlaybackError::PlayerClosed)
    ));
    assert_eq!(
        deps.now_playing.dispatch(RemoteCommandEvent::Stop),
        CommandStatus::CommandFailed
    );
}
