//! Relays metadata changes of the current item.

use super::{EventProducer, EventSink, ProducerKind, ProducerTask, Registration};
use crate::events::MetadataEvent;
use crate::item::AudioItem;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

/// Emits one event per metadata field change of the watched item.
///
/// The watcher owns no metadata; it only relays the item's own change
/// channel.
pub struct ItemWatcher {
    item: Option<AudioItem>,
    registration: Registration,
    task: ProducerTask,
}

impl ItemWatcher {
    pub fn new(sink: EventSink) -> Self {
        Self {
            item: None,
            registration: Registration::new(ProducerKind::Item, sink),
            task: ProducerTask::default(),
        }
    }

    /// Watch another item; stops watching the previous one.
    pub fn set_item(&mut self, item: Option<AudioItem>) {
        self.stop();
        self.item = item;
    }
}

impl EventProducer for ItemWatcher {
    fn kind(&self) -> ProducerKind {
        ProducerKind::Item
    }

    fn start(&mut self) {
        if self.task.is_running() {
            return;
        }
        let Some(item) = &self.item else {
            return;
        };
        let id = item.id();
        let mut changes = item.subscribe();
        let emitter = self.registration.issue();

        self.task.spawn(move |cancel| async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    change = changes.recv() => match change {
                        Ok(field) => {
                            if !emitter.emit(MetadataEvent { item: id, field }) {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "Metadata watcher lagged");
                        }
                        Err(RecvError::Closed) => break,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Event;
    use crate::item::MetadataField;
    use bridge_traits::AudioSource;

    #[tokio::test]
    async fn relays_field_changes() {
        let (sink, mut rx) = EventSink::new();
        let item = AudioItem::with_source(AudioSource::local("/music/a.flac"));
        let mut watcher = ItemWatcher::new(sink);
        watcher.set_item(Some(item.clone()));
        watcher.start();
        tokio::task::yield_now().await;

        item.set_title(Some("Song".into()));
        item.set_album(Some("Record".into()));

        let events = [rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        assert_eq!(
            events.map(|e| e.into_event()),
            [
                Event::Item(MetadataEvent {
                    item: item.id(),
                    field: MetadataField::Title
                }),
                Event::Item(MetadataEvent {
                    item: item.id(),
                    field: MetadataField::Album
                }),
            ]
        );
        watcher.stop();
    }

    #[tokio::test]
    async fn switching_items_ignores_the_old_one() {
        let (sink, mut rx) = EventSink::new();
        let old = AudioItem::with_source(AudioSource::local("/music/a.flac"));
        let new = AudioItem::with_source(AudioSource::local("/music/b.flac"));
        let mut watcher = ItemWatcher::new(sink);
        watcher.set_item(Some(old.clone()));
        watcher.start();
        watcher.set_item(Some(new.clone()));
        watcher.start();
        tokio::task::yield_now().await;

        old.set_title(Some("Old".into()));
        new.set_title(Some("New".into()));

        let envelope = rx.recv().await.unwrap();
        assert!(envelope.is_current());
        assert_eq!(
            envelope.into_event(),
            Event::Item(MetadataEvent {
                item: new.id(),
                field: MetadataField::Title
            })
        );
    }
}
