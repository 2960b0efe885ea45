//! Remote commands from the now-playing surface.

use super::SessionController;
use crate::config::SeekingBehavior;
use crate::producers::EventProducer;
use crate::queue::PlaybackMode;
use bridge_traits::{CommandStatus, RemoteCommandEvent, RepeatType, SeekPhase, SeekTolerance};
use std::time::Duration;
use tracing::debug;

/// Status a command gets before it is executed.
///
/// Only commands that act on the current item need one; a rate must be a
/// finite number.
pub(crate) fn command_status(has_item: bool, event: &RemoteCommandEvent) -> CommandStatus {
    match event {
        RemoteCommandEvent::ChangePlaybackRate(rate) if !rate.is_finite() => {
            CommandStatus::CommandFailed
        }
        RemoteCommandEvent::Stop
        | RemoteCommandEvent::ChangeRepeatMode(_)
        | RemoteCommandEvent::ChangePlaybackRate(_) => CommandStatus::Success,
        _ if !has_item => CommandStatus::NoActionableNowPlayingItem,
        _ => CommandStatus::Success,
    }
}

impl SessionController {
    /// Execute a remote command.
    pub fn handle_remote_command(&mut self, event: RemoteCommandEvent) -> CommandStatus {
        let status = command_status(self.session.current_item.is_some(), &event);
        if status != CommandStatus::Success {
            debug!(command = ?event.command(), ?status, "Remote command rejected");
            return status;
        }
        debug!(command = ?event.command(), "Remote command");

        match event {
            RemoteCommandEvent::Play => {
                if self.session.state.is_paused() {
                    self.resume();
                }
            }
            RemoteCommandEvent::Pause => {
                if self.session.state.is_playing() {
                    self.pause();
                }
            }
            RemoteCommandEvent::Stop => self.stop(),
            RemoteCommandEvent::TogglePlayPause => self.toggle_play_pause(),
            RemoteCommandEvent::NextTrack => self.next(),
            RemoteCommandEvent::PreviousTrack => self.previous(),
            RemoteCommandEvent::ChangeRepeatMode(repeat) => self.set_mode(match repeat {
                RepeatType::Off => PlaybackMode::Normal,
                RepeatType::One => PlaybackMode::RepeatOne,
                RepeatType::All => PlaybackMode::RepeatAll,
            }),
            RemoteCommandEvent::ChangePlaybackRate(rate) => self.set_rate(rate),
            RemoteCommandEvent::ChangePlaybackPosition(position) => {
                self.seek(position, false, SeekTolerance::default(), None)
            }
            RemoteCommandEvent::SeekBackward(phase) => self.remote_seek(phase, false),
            RemoteCommandEvent::SeekForward(phase) => self.remote_seek(phase, true),
            RemoteCommandEvent::SkipBackward(interval) => {
                let interval = self.skip_interval(interval);
                if let Some(position) = self.current_item_progression() {
                    self.seek(
                        position.saturating_sub(interval),
                        true,
                        SeekTolerance::default(),
                        None,
                    );
                }
            }
            RemoteCommandEvent::SkipForward(interval) => {
                let interval = self.skip_interval(interval);
                if let Some(position) = self.current_item_progression() {
                    self.seek(position + interval, true, SeekTolerance::default(), None);
                }
            }
        }
        CommandStatus::Success
    }

    fn skip_interval(&self, requested: Duration) -> Duration {
        if requested.is_zero() {
            self.config.skip_interval
        } else {
            requested
        }
    }

    /// Hold-to-seek, per the configured seeking behaviour.
    fn remote_seek(&mut self, phase: SeekPhase, forward: bool) {
        match (self.config.seeking_behavior, phase) {
            (SeekingBehavior::MultiplyRate { factor }, SeekPhase::Begin) => {
                let rate = self.rate * factor;
                self.set_rate(if forward { rate } else { -rate });
            }
            (SeekingBehavior::MultiplyRate { factor }, SeekPhase::End) => {
                let rate = self.rate / factor;
                self.set_rate(if forward { rate } else { -rate });
            }
            (SeekingBehavior::ChangeTimeEvery { .. }, SeekPhase::Begin) => {
                self.seek_timer.stop();
                self.seek_timer.set_backward(!forward);
                self.seek_timer.start();
            }
            (SeekingBehavior::ChangeTimeEvery { .. }, SeekPhase::End) => self.seek_timer.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_commands_need_an_item() {
        assert_eq!(
            command_status(false, &RemoteCommandEvent::Play),
            CommandStatus::NoActionableNowPlayingItem
        );
        assert_eq!(
            command_status(false, &RemoteCommandEvent::SkipForward(Duration::ZERO)),
            CommandStatus::NoActionableNowPlayingItem
        );
        assert_eq!(command_status(true, &RemoteCommandEvent::Play), CommandStatus::Success);
    }

    #[test]
    fn session_commands_work_without_an_item() {
        assert_eq!(command_status(false, &RemoteCommandEvent::Stop), CommandStatus::Success);
        assert_eq!(
            command_status(false, &RemoteCommandEvent::ChangeRepeatMode(RepeatType::All)),
            CommandStatus::Success
        );
        assert_eq!(
            command_status(false, &RemoteCommandEvent::ChangePlaybackRate(1.5)),
            CommandStatus::Success
        );
    }

    #[test]
    fn non_finite_rate_fails() {
        assert_eq!(
            command_status(true, &RemoteCommandEvent::ChangePlaybackRate(f32::NAN)),
            CommandStatus::CommandFailed
        );
    }
}
