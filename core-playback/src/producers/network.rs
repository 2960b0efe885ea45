//! Reachability producer.

use super::{Emitter, EventProducer, EventSink, ProducerKind, ProducerTask, Registration};
use crate::events::NetworkEvent;
use bridge_traits::{Clock, NetworkInfo, NetworkMonitor, NetworkStatus, NetworkType};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Connectivity as the session sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Unreachable,
    ReachableViaWiFi,
    ReachableViaCellular,
}

impl Reachability {
    pub fn is_reachable(&self) -> bool {
        !matches!(self, Reachability::Unreachable)
    }
}

impl From<&NetworkInfo> for Reachability {
    fn from(info: &NetworkInfo) -> Self {
        match (info.status, info.network_type) {
            (NetworkStatus::Connected, Some(NetworkType::Cellular)) => {
                Reachability::ReachableViaCellular
            }
            (NetworkStatus::Connected, _) => Reachability::ReachableViaWiFi,
            (NetworkStatus::Disconnected, _) | (NetworkStatus::Indeterminate, _) => {
                Reachability::Unreachable
            }
        }
    }
}

#[derive(Debug)]
struct Snapshot {
    status: Reachability,
    connection_lost_at: Option<DateTime<Utc>>,
}

/// Turns reachability changes into [`NetworkEvent`]s.
///
/// The last known status is shared with the controller, which reads it when
/// assigning an item. The wall-clock time of the latest loss is kept for the
/// connection-loss budget.
pub struct NetworkEventProducer {
    monitor: Arc<dyn NetworkMonitor>,
    clock: Arc<dyn Clock>,
    snapshot: Arc<RwLock<Snapshot>>,
    registration: Registration,
    task: ProducerTask,
}

impl NetworkEventProducer {
    pub fn new(
        monitor: Arc<dyn NetworkMonitor>,
        clock: Arc<dyn Clock>,
        initial: Reachability,
        sink: EventSink,
    ) -> Self {
        let connection_lost_at = (!initial.is_reachable()).then(|| clock.now());
        Self {
            monitor,
            clock,
            snapshot: Arc::new(RwLock::new(Snapshot {
                status: initial,
                connection_lost_at,
            })),
            registration: Registration::new(ProducerKind::Network, sink),
            task: ProducerTask::default(),
        }
    }

    pub fn reachability(&self) -> Reachability {
        self.snapshot.read().status
    }

    pub fn is_reachable(&self) -> bool {
        self.reachability().is_reachable()
    }

    /// When the network was last lost, if it ever was.
    pub fn connection_lost_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().connection_lost_at
    }

    /// Record a status without emitting anything.
    ///
    /// Used to refresh the snapshot while the producer is not running.
    pub fn refresh(&self, info: &NetworkInfo) {
        observe(&self.snapshot, self.clock.as_ref(), Reachability::from(info));
    }
}

/// Apply a new status and derive the event it implies.
fn observe(
    snapshot: &RwLock<Snapshot>,
    clock: &dyn Clock,
    status: Reachability,
) -> Option<NetworkEvent> {
    let mut snapshot = snapshot.write();
    let previous = snapshot.status;
    if previous == status {
        return None;
    }
    snapshot.status = status;

    if !status.is_reachable() {
        snapshot.connection_lost_at = Some(clock.now());
        Some(NetworkEvent::ConnectionLost)
    } else if !previous.is_reachable() {
        Some(NetworkEvent::ConnectionRetrieved)
    } else {
        Some(NetworkEvent::NetworkChanged)
    }
}

impl EventProducer for NetworkEventProducer {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Network
    }

    fn start(&mut self) {
        if self.task.is_running() {
            return;
        }

        let monitor = Arc::clone(&self.monitor);
        let clock = Arc::clone(&self.clock);
        let snapshot = Arc::clone(&self.snapshot);
        let emitter = self.registration.issue();

        self.task.spawn(move |cancel| async move {
            let mut changes = match monitor.subscribe_changes().await {
                Ok(changes) => changes,
                Err(e) => {
                    warn!(error = %e, "Network change subscription failed");
                    return;
                }
            };

            // Catch up with anything that changed while nobody was listening.
            if let Ok(info) = monitor.get_network_info().await {
                deliver(&snapshot, clock.as_ref(), &emitter, &info);
            }

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    info = changes.next() => match info {
                        Some(info) => deliver(&snapshot, clock.as_ref(), &emitter, &info),
                        None => {
                            debug!("Network change stream ended");
                            break;
                        }
                    },
                }
            }
        });
        debug!("Network producer started");
    }

    fn stop(&mut self) {
        self.registration.revoke();
        self.task.cancel();
        debug!("Network producer stopped");
    }

    fn is_producing(&self) -> bool {
        self.task.is_running()
    }
}

fn deliver(snapshot: &RwLock<Snapshot>, clock: &dyn Clock, emitter: &Emitter, info: &NetworkInfo) {
    if let Some(event) = observe(snapshot, clock, Reachability::from(info)) {
        info!(?event, status = ?info.status, "Reachability changed");
        emitter.emit(event);
    }
}
