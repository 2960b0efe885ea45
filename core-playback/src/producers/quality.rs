//! Quality-check timer.

use super::{Emitter, EventProducer, EventSink, ProducerKind, ProducerTask, Registration};
use crate::config::PlayerConfig;
use crate::events::QualityEvent;
use crate::quality::QualityController;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Drives a [`QualityController`] over time.
///
/// Each interruption re-arms a timer of one window. If the timer fires
/// without another interruption the producer emits `GoUp`; an interruption
/// that meets the threshold emits `GoDown`.
pub struct QualityProducer {
    controller: Arc<Mutex<QualityController>>,
    rearm: Arc<Notify>,
    emitter: Option<Emitter>,
    registration: Registration,
    task: ProducerTask,
}

impl QualityProducer {
    pub fn new(controller: QualityController, sink: EventSink) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            rearm: Arc::new(Notify::new()),
            emitter: None,
            registration: Registration::new(ProducerKind::Quality, sink),
            task: ProducerTask::default(),
        }
    }

    /// Count an interruption and restart the window timer.
    ///
    /// Returns the decision that was emitted, if any.
    pub fn record_interruption(&self) -> Option<QualityEvent> {
        let decision = self.controller.lock().record_interruption(Instant::now());
        self.rearm.notify_one();

        if let (Some(event), Some(emitter)) = (decision, &self.emitter) {
            info!(?event, "Interruption threshold met");
            emitter.emit(event);
        }
        decision
    }

    pub fn interruption_count(&self) -> usize {
        self.controller.lock().interruption_count(Instant::now())
    }

    pub fn reconfigure(&self, config: &PlayerConfig) {
        self.controller.lock().reconfigure(config);
        self.rearm.notify_one();
    }
}

impl EventProducer for QualityProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Quality
    }

    fn start(&mut self) {
        if self.task.is_running() {
            return;
        }

        let controller = Arc::clone(&self.controller);
        let rearm = Arc::clone(&self.rearm);
        let emitter = self.registration.issue();
        self.emitter = Some(emitter.clone());

        self.task.spawn(move |cancel| async move {
            loop {
                let window = controller.lock().window_span();
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = rearm.notified() => continue,
                    _ = sleep(window) => {
                        let decision = controller.lock().window_elapsed(Instant::now());
                        if let Some(event) = decision {
                            debug!(?event, "Quality window elapsed without interruption");
                            if !emitter.emit(event) {
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    fn stop(&mut self) {
        self.registration.revoke();
        self.emitter = None;
        self.task.cancel();
    }

    fn is_producing(&self) -> bool {
        self.task.is_running()
    }
}
