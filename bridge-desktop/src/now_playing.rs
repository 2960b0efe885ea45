//! Now-Playing Session Implementation
//!
//! Desktop builds have no single OS media surface the core can rely on
//! (MPRIS, SMTC and MPNowPlayingInfoCenter all differ), so this session
//! records what the core publishes and lets the host feed media-key presses
//! back through [`LoggingNowPlayingSession::dispatch`].

use bridge_traits::{
    error::{BridgeError, Result},
    now_playing::{
        CommandHandler, CommandStatus, DynamicMetadata, NowPlayingSession, RemoteCommand,
        RemoteCommandEvent, StaticMetadata,
    },
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

#[derive(Default)]
struct SessionState {
    handler: Option<CommandHandler>,
    registered: Vec<RemoteCommand>,
    disabled: Vec<RemoteCommand>,
    active: bool,
    static_metadata: Option<StaticMetadata>,
    dynamic_metadata: Option<DynamicMetadata>,
    is_playing: bool,
}

/// Now-playing session that logs and remembers what it is given.
#[derive(Default)]
pub struct LoggingNowPlayingSession {
    state: Mutex<SessionState>,
}

impl LoggingNowPlayingSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a remote command to the configured handler.
    ///
    /// Commands that were not registered, or were disabled, fail without
    /// reaching the handler.
    pub fn dispatch(&self, event: RemoteCommandEvent) -> CommandStatus {
        let handler = {
            let state = self.state.lock();
            let command = event.command();
            if !state.registered.contains(&command) || state.disabled.contains(&command) {
                warn!(command = ?command, "Remote command not enabled");
                return CommandStatus::CommandFailed;
            }
            state.handler.clone()
        };

        match handler {
            Some(handler) => handler(event),
            None => CommandStatus::CommandFailed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    pub fn last_static_metadata(&self) -> Option<StaticMetadata> {
        self.state.lock().static_metadata.clone()
    }

    pub fn last_dynamic_metadata(&self) -> Option<DynamicMetadata> {
        self.state.lock().dynamic_metadata
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().is_playing
    }
}

impl NowPlayingSession for LoggingNowPlayingSession {
    fn configure(
        &self,
        registered: &[RemoteCommand],
        disabled: &[RemoteCommand],
        handler: CommandHandler,
    ) -> Result<()> {
        if registered.is_empty() {
            return Err(BridgeError::NoRegisteredCommands);
        }

        let mut state = self.state.lock();
        state.registered = registered.to_vec();
        state.disabled = disabled.to_vec();
        state.handler = Some(handler);
        info!(
            registered = registered.len(),
            disabled = disabled.len(),
            "Now-playing session configured"
        );
        Ok(())
    }

    fn session_start(&self) -> Result<()> {
        self.state.lock().active = true;
        debug!("Now-playing session started");
        Ok(())
    }

    fn session_end(&self) {
        let mut state = self.state.lock();
        state.active = false;
        state.static_metadata = None;
        state.dynamic_metadata = None;
        state.is_playing = false;
        debug!("Now-playing session ended");
    }

    fn publish_static_metadata(&self, metadata: &StaticMetadata) {
        debug!(
            title = metadata.title.as_deref().unwrap_or(""),
            artist = metadata.artist.as_deref().unwrap_or(""),
            live = metadata.is_live_stream,
            "Now-playing metadata"
        );
        self.state.lock().static_metadata = Some(metadata.clone());
    }

    fn publish_dynamic_metadata(&self, is_playing: bool, metadata: Option<&DynamicMetadata>) {
        let mut state = self.state.lock();
        state.is_playing = is_playing;
        if let Some(metadata) = metadata {
            state.dynamic_metadata = Some(*metadata);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_configure_requires_commands() {
        let session = LoggingNowPlayingSession::new();
        let handler: CommandHandler = Arc::new(|_| CommandStatus::Success);

        let err = session.configure(&[], &[], handler).unwrap_err();
        assert!(matches!(err, BridgeError::NoRegisteredCommands));
    }

    #[test]
    fn test_dispatch_respects_registration() {
        let session = LoggingNowPlayingSession::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let handler: CommandHandler = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            CommandStatus::Success
        });

        session
            .configure(
                &[RemoteCommand::Play, RemoteCommand::SkipForward],
                &[RemoteCommand::SkipForward],
                handler,
            )
            .unwrap();

        assert_eq!(session.dispatch(RemoteCommandEvent::Play), CommandStatus::Success);
        assert_eq!(
            session.dispatch(RemoteCommandEvent::SkipForward(Duration::from_secs(15))),
            CommandStatus::CommandFailed
        );
        assert_eq!(
            session.dispatch(RemoteCommandEvent::Stop),
            CommandStatus::CommandFailed
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_metadata_is_remembered_until_session_end() {
        let session = LoggingNowPlayingSession::new();
        session.session_start().unwrap();
        assert!(session.is_active());

        session.publish_static_metadata(&StaticMetadata {
            asset: "https://example.com/a.mp3".to_string(),
            title: Some("Intro".to_string()),
            ..Default::default()
        });
        session.publish_dynamic_metadata(
            true,
            Some(&DynamicMetadata {
                rate: 1.0,
                position: Duration::from_secs(3),
                duration: Duration::from_secs(200),
            }),
        );

        assert_eq!(
            session.last_static_metadata().unwrap().title.as_deref(),
            Some("Intro")
        );
        assert!(session.is_playing());
        assert_eq!(
            session.last_dynamic_metadata().unwrap().position,
            Duration::from_secs(3)
        );

        session.session_end();
        assert!(!session.is_active());
        assert!(session.last_static_metadata().is_none());
    }
}
