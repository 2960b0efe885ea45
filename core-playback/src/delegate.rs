//! # Player Delegate
//!
//! Callbacks the session controller makes while playing. All methods have
//! no-op defaults so an implementation only overrides what it needs.
//!
//! [`EventBusDelegate`] is always installed: it mirrors every callback on
//! the runtime [`EventBus`] so hosts can observe playback by subscribing
//! instead of implementing the trait.

use crate::events::NetworkEvent;
use crate::item::{AudioItem, MetadataField, QualityTier};
use crate::state::{FailureReason, PlaybackState};
use bridge_traits::TimeRange;
use core_runtime::events::{
    ConnectivityEvent, CoreEvent, EventBus, ItemEvent, PlaybackEvent,
};
use std::time::Duration;

/// Observer and admission policy of a playback session.
pub trait PlayerDelegate: Send + Sync {
    fn on_state_change(&self, _from: &PlaybackState, _to: &PlaybackState) {}

    /// A newly assigned item is about to be loaded.
    fn on_will_start_playing(&self, _item: &AudioItem) {}

    fn on_progress(&self, _item: &AudioItem, _time: Duration, _percentage: f32) {}

    fn on_duration_found(&self, _item: &AudioItem, _duration: Duration) {}

    /// Stream metadata filled fields the item did not have.
    fn on_metadata_filled(&self, _item: &AudioItem, _fields: &[MetadataField]) {}

    fn on_buffered_range(&self, _item: &AudioItem, _range: TimeRange) {}

    fn on_quality_changed(&self, _item: &AudioItem, _from: QualityTier, _to: QualityTier) {}

    fn on_failure(&self, _item: Option<&AudioItem>, _reason: &FailureReason) {}

    /// Reachability changed. `lost_for` is set when a loss ended.
    fn on_connectivity_change(&self, _event: NetworkEvent, _lost_for: Option<Duration>) {}

    /// Admission predicate for queue candidates.
    fn should_play(&self, _item: &AudioItem) -> bool {
        true
    }
}

/// Publishes delegate callbacks as [`CoreEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBusDelegate {
    bus: EventBus,
}

impl EventBusDelegate {
    pub fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn publish(&self, event: CoreEvent) {
        // No subscriber is not an error.
        self.bus.emit(event).ok();
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

impl PlayerDelegate for EventBusDelegate {
    fn on_state_change(&self, from: &PlaybackState, to: &PlaybackState) {
        self.publish(CoreEvent::Playback(PlaybackEvent::StateChanged {
            from: from.to_string(),
            to: to.to_string(),
        }));
    }

    fn on_will_start_playing(&self, item: &AudioItem) {
        self.publish(CoreEvent::Playback(PlaybackEvent::WillStartPlaying {
            item_id: item.id().to_string(),
        }));
    }

    fn on_progress(&self, item: &AudioItem, time: Duration, percentage: f32) {
        self.publish(CoreEvent::Playback(PlaybackEvent::Progressed {
            item_id: item.id().to_string(),
            position_ms: millis(time),
            percentage,
        }));
    }

    fn on_duration_found(&self, item: &AudioItem, duration: Duration) {
        self.publish(CoreEvent::Playback(PlaybackEvent::DurationFound {
            item_id: item.id().to_string(),
            duration_ms: millis(duration),
        }));
    }

    fn on_metadata_filled(&self, item: &AudioItem, fields: &[MetadataField]) {
        self.publish(CoreEvent::Item(ItemEvent::MetadataFilled {
            item_id: item.id().to_string(),
            fields: fields.iter().map(|f| f.label().to_string()).collect(),
        }));
    }

    fn on_buffered_range(&self, item: &AudioItem, range: TimeRange) {
        self.publish(CoreEvent::Playback(PlaybackEvent::BufferedRange {
            item_id: item.id().to_string(),
            earliest_ms: millis(range.earliest),
            latest_ms: millis(range.latest),
        }));
    }

    fn on_quality_changed(&self, item: &AudioItem, from: QualityTier, to: QualityTier) {
        self.publish(CoreEvent::Item(ItemEvent::QualityChanged {
            item_id: item.id().to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }));
    }

    fn on_failure(&self, item: Option<&AudioItem>, reason: &FailureReason) {
        self.publish(CoreEvent::Playback(PlaybackEvent::Failed {
            item_id: item.map(|i| i.id().to_string()),
            reason: reason.to_string(),
        }));
    }

    fn on_connectivity_change(&self, event: NetworkEvent, lost_for: Option<Duration>) {
        let event = match event {
            NetworkEvent::ConnectionLost => ConnectivityEvent::ConnectionLost,
            NetworkEvent::ConnectionRetrieved => ConnectivityEvent::ConnectionRetrieved {
                after_ms: lost_for.map(millis),
            },
            NetworkEvent::NetworkChanged => ConnectivityEvent::NetworkChanged,
        };
        self.publish(CoreEvent::Connectivity(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::AudioSource;

    #[tokio::test]
    async fn mirrors_callbacks_on_the_bus() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();
        let delegate = EventBusDelegate::new(bus);
        let item = AudioItem::with_source(AudioSource::local("/music/a.flac"));

        delegate.on_state_change(&PlaybackState::Stopped, &PlaybackState::Buffering);
        delegate.on_progress(&item, Duration::from_millis(1500), 25.0);
        delegate.on_connectivity_change(
            NetworkEvent::ConnectionRetrieved,
            Some(Duration::from_secs(30)),
        );

        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::StateChanged {
                from: "Stopped".into(),
                to: "Buffering".into()
            })
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::Playback(PlaybackEvent::Progressed {
                item_id: item.id().to_string(),
                position_ms: 1500,
                percentage: 25.0
            })
        );
        assert_eq!(
            rx.recv().await.unwrap(),
            CoreEvent::Connectivity(ConnectivityEvent::ConnectionRetrieved {
                after_ms: Some(30_000)
            })
        );
    }

    #[test]
    fn admits_everything_by_default() {
        let delegate = EventBusDelegate::new(EventBus::new(4));
        let item = AudioItem::with_source(AudioSource::local("/music/a.flac"));
        assert!(delegate.should_play(&item));
        delegate.on_failure(Some(&item), &FailureReason::MaximumRetryCountHit);
    }
}
