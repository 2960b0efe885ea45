//! Hold-to-seek timer.

use super::{EventProducer, EventSink, ProducerKind, ProducerTask, Registration};
use crate::events::SeekEvent;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Emits a seek event every `interval` while a remote seek button is held.
pub struct SeekProducer {
    interval: Duration,
    backward: bool,
    registration: Registration,
    task: ProducerTask,
}

impl SeekProducer {
    pub fn new(interval: Duration, sink: EventSink) -> Self {
        Self {
            interval,
            backward: false,
            registration: Registration::new(ProducerKind::Seek, sink),
            task: ProducerTask::default(),
        }
    }

    /// Direction of the next run. Takes effect on the next `start()`.
    pub fn set_backward(&mut self, backward: bool) {
        self.backward = backward;
    }

    pub fn is_backward(&self) -> bool {
        self.backward
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}

impl EventProducer for SeekProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Seek
    }

    fn start(&mut self) {
        if self.task.is_running() {
            return;
        }

        let period = self.interval;
        let event = if self.backward {
            SeekEvent::SeekBackward
        } else {
            SeekEvent::SeekForward
        };
        let emitter = self.registration.issue();

        self.task.spawn(move |cancel| async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticks.tick() => {
                        if !emitter.emit(event) {
                            break;
                        }
                    }
                }
            }
        });
        debug!(backward = self.backward, "Seek producer started");
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

    #[tokio::test(start_paused = true)]
    async fn ticks_in_the_configured_direction() {
        let (sink, mut rx) = EventSink::new();
        let mut producer = SeekProducer::new(Duration::from_secs(10), sink);
        producer.set_backward(true);
        producer.start();
        assert!(producer.is_producing());

        tokio::time::sleep(Duration::from_secs(25)).await;
        producer.stop();

        let mut events = Vec::new();
        while let Ok(envelope) = rx.try_recv() {
            events.push(envelope.into_event());
        }
        assert_eq!(
            events,
            vec![
                Event::Seek(SeekEvent::SeekBackward),
                Event::Seek(SeekEvent::SeekBackward)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_after_stop() {
        let (sink, mut rx) = EventSink::new();
        let mut producer = SeekProducer::new(Duration::from_secs(1), sink);
        producer.start();
        producer.stop();
        assert!(!producer.is_producing());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
