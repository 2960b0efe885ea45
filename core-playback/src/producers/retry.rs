//! Retry timer.

use super::{EventProducer, EventSink, ProducerKind, ProducerTask, Registration};
use crate::config::PlayerConfig;
use crate::events::RetryEvent;
use crate::retry::{RetryController, RetryDecision};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Emits `RetryAvailable` every retry timeout until the budget runs out,
/// then `RetryFailed` once and stops itself.
///
/// Starting does not reset the budget: an exhausted producer refuses to
/// start until [`RetryProducer::reset`] is called.
pub struct RetryProducer {
    controller: Arc<Mutex<RetryController>>,
    registration: Registration,
    task: ProducerTask,
}

impl RetryProducer {
    pub fn new(controller: RetryController, sink: EventSink) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            registration: Registration::new(ProducerKind::Retry, sink),
            task: ProducerTask::default(),
        }
    }

    /// Zero the attempt counter.
    pub fn reset(&self) {
        self.controller.lock().reset();
    }

    pub fn is_exhausted(&self) -> bool {
        self.controller.lock().is_exhausted()
    }

    pub fn attempts(&self) -> usize {
        self.controller.lock().attempts()
    }

    pub fn reconfigure(&self, config: &PlayerConfig) {
        self.controller.lock().reconfigure(config);
    }
}

impl EventProducer for RetryProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Retry
    }

    fn start(&mut self) {
        if self.task.is_running() {
            return;
        }
        if self.is_exhausted() {
            debug!("Retry budget exhausted, not starting");
            return;
        }

        let controller = Arc::clone(&self.controller);
        let emitter = self.registration.issue();

        self.task.spawn(move |cancel| async move {
            loop {
                let timeout = controller.lock().retry_timeout();
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(timeout) => {
                        let decision = controller.lock().register_attempt();
                        match decision {
                            RetryDecision::Retry { attempt } => {
                                info!(attempt, "Retry available");
                                if !emitter.emit(RetryEvent::RetryAvailable) {
                                    break;
                                }
                            }
                            RetryDecision::Exhausted => {
                                warn!("Retry budget exhausted");
                                emitter.emit(RetryEvent::RetryFailed);
                                break;
                            }
                        }
                    }
                }
            }
        });
        debug!("Retry producer started");
    }

    fn stop(&mut self) {
        self.registration.revoke();
        self.task.cancel();
    }

    fn is_producing(&self) -> bool {
        self.task.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::producers::Envelope;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn producer(max: usize) -> (RetryProducer, UnboundedReceiver<Envelope>) {
        let (sink, rx) = EventSink::new();
        (
            RetryProducer::new(RetryController::new(max, Duration::from_secs(10)), sink),
            rx,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn emits_maximum_then_fails_once() {
        let (mut retry, mut rx) = producer(3);
        retry.start();

        tokio::time::sleep(Duration::from_secs(120)).await;

        let mut events = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            events.push(envelope.into_event());
        }
        assert_eq!(
            events,
            vec![
                Event::Retry(RetryEvent::RetryAvailable),
                Event::Retry(RetryEvent::RetryAvailable),
                Event::Retry(RetryEvent::RetryAvailable),
                Event::Retry(RetryEvent::RetryFailed),
            ]
        );
        assert!(!retry.is_producing());
        assert!(retry.is_exhausted());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_producer_stays_silent_until_reset() {
        let (mut retry, mut rx) = producer(1);
        retry.start();
        tokio::time::sleep(Duration::from_secs(30)).await;
        while rx.try_recv().is_ok() {}

        retry.start();
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());

        retry.reset();
        retry.start();
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(
            rx.try_recv().unwrap().into_event(),
            Event::Retry(RetryEvent::RetryAvailable)
        );
        retry.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_keeps_the_attempt_count() {
        let (mut retry, _rx) = producer(5);
        retry.start();
        tokio::time::sleep(Duration::from_secs(25)).await;
        retry.stop();
        assert_eq!(retry.attempts(), 2);

        retry.start();
        tokio::time::sleep(Duration::from_secs(11)).await;
        retry.stop();
        assert_eq!(retry.attempts(), 3);
    }
}
