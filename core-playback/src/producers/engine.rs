//! Pass-through of decode engine notifications.

use super::{EventProducer, EventSink, ProducerKind, ProducerTask, Registration};
use crate::events::Event;
use bridge_traits::EngineNotificationStream;
use tracing::{debug, trace};

/// Forwards the notifications of one engine instance verbatim.
///
/// The stream is consumed by the running task: a new engine instance needs
/// a new call to [`EngineNotifier::set_stream`] before `start()`.
pub struct EngineNotifier {
    stream: Option<Box<dyn EngineNotificationStream>>,
    registration: Registration,
    task: ProducerTask,
}

impl EngineNotifier {
    pub fn new(sink: EventSink) -> Self {
        Self {
            stream: None,
            registration: Registration::new(ProducerKind::Engine, sink),
            task: ProducerTask::default(),
        }
    }

    /// Replace the stream to forward; stops forwarding the previous one.
    pub fn set_stream(&mut self, stream: Box<dyn EngineNotificationStream>) {
        self.stop();
        self.stream = Some(stream);
    }
}

impl EventProducer for EngineNotifier {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Engine
    }

    fn start(&mut self) {
        if self.task.is_running() {
            return;
        }
        let Some(mut stream) = self.stream.take() else {
            debug!("No engine stream to forward");
            return;
        };
        let emitter = self.registration.issue();

        self.task.spawn(move |cancel| async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    notification = stream.next() => match notification {
                        Some(notification) => {
                            trace!(?notification, "Engine notification");
                            if !emitter.emit(Event::Engine(notification)) {
                                break;
                            }
                        }
                        None => {
                            debug!("Engine notification stream ended");
                            break;
                        }
                    },
                }
            }
        });
    }

    fn stop(&mut self) {
        self.registration.revoke();
        self.task.cancel();
    }

    fn is_producing(&self) -> bool {
        self.task.is_running()
    }
}
