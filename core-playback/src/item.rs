//! # Audio Items
//!
//! An [`AudioItem`] is what the queue holds and the session plays: a unique
//! identity, one source per quality tier and descriptive metadata that may
//! arrive after the item was created.
//!
//! ## Metadata changes
//!
//! Metadata lives behind a lock inside the shared item, so any holder of a
//! handle can update it. Every setter publishes the changed
//! [`MetadataField`] on a broadcast channel; the item watcher relays those
//! changes to the session so the now-playing surface can be refreshed.
//! Readers always see the last write.

use crate::error::{PlaybackError, Result};
use bridge_traits::{Artwork, AudioSource, StreamMetadata};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

const METADATA_CHANNEL_CAPACITY: usize = 16;

// ============================================================================
// Identity & Quality
// ============================================================================

/// Unique identifier of an audio item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Alternative encodings of the same item, ordered by fidelity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityTier {
    /// Next tier up, or `None` at the top.
    pub fn higher(&self) -> Option<QualityTier> {
        match self {
            QualityTier::Low => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::High),
            QualityTier::High => None,
        }
    }

    /// Next tier down, or `None` at the bottom.
    pub fn lower(&self) -> Option<QualityTier> {
        match self {
            QualityTier::Low => None,
            QualityTier::Medium => Some(QualityTier::Low),
            QualityTier::High => Some(QualityTier::Medium),
        }
    }

    /// Lookup order when the exact tier has no source.
    fn fallback_order(&self) -> [QualityTier; 3] {
        match self {
            QualityTier::High => [QualityTier::High, QualityTier::Medium, QualityTier::Low],
            QualityTier::Medium => [QualityTier::Medium, QualityTier::Low, QualityTier::High],
            QualityTier::Low => [QualityTier::Low, QualityTier::Medium, QualityTier::High],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// A descriptive field of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    Title,
    Artist,
    Album,
    TrackCount,
    TrackNumber,
    Artwork,
}

impl MetadataField {
    pub fn label(&self) -> &'static str {
        match self {
            MetadataField::Title => "title",
            MetadataField::Artist => "artist",
            MetadataField::Album => "album",
            MetadataField::TrackCount => "track_count",
            MetadataField::TrackNumber => "track_number",
            MetadataField::Artwork => "artwork",
        }
    }
}

/// Descriptive metadata of an item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_count: Option<u32>,
    pub track_number: Option<u32>,
    pub artwork: Option<Artwork>,
}

// ============================================================================
// Audio Item
// ============================================================================

struct ItemInner {
    id: ItemId,
    sources: BTreeMap<QualityTier, AudioSource>,
    metadata: RwLock<ItemMetadata>,
    changes: broadcast::Sender<MetadataField>,
}

/// Shared handle to a playable item.
///
/// Cloning is cheap; clones refer to the same item and compare equal.
#[derive(Clone)]
pub struct AudioItem {
    inner: Arc<ItemInner>,
}

impl AudioItem {
    /// Create an item from quality-tagged sources.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::NoSources`] when `sources` is empty.
    pub fn new(sources: impl IntoIterator<Item = (QualityTier, AudioSource)>) -> Result<Self> {
        let sources: BTreeMap<_, _> = sources.into_iter().collect();
        if sources.is_empty() {
            return Err(PlaybackError::NoSources);
        }

        let (changes, _) = broadcast::channel(METADATA_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(ItemInner {
                id: ItemId::new(),
                sources,
                metadata: RwLock::new(ItemMetadata::default()),
                changes,
            }),
        })
    }

    /// Create an item with a single source, filed under the medium tier.
    pub fn with_source(source: AudioSource) -> Self {
        let (changes, _) = broadcast::channel(METADATA_CHANNEL_CAPACITY);
        let mut sources = BTreeMap::new();
        sources.insert(QualityTier::Medium, source);
        Self {
            inner: Arc::new(ItemInner {
                id: ItemId::new(),
                sources,
                metadata: RwLock::new(ItemMetadata::default()),
                changes,
            }),
        }
    }

    pub fn id(&self) -> ItemId {
        self.inner.id
    }

    pub fn sources(&self) -> &BTreeMap<QualityTier, AudioSource> {
        &self.inner.sources
    }

    /// Source for `tier`, falling back to the closest available tier.
    pub fn source_for(&self, tier: QualityTier) -> Option<(QualityTier, &AudioSource)> {
        tier.fallback_order()
            .into_iter()
            .find_map(|t| self.inner.sources.get(&t).map(|source| (t, source)))
    }

    pub fn highest_quality_source(&self) -> Option<(QualityTier, &AudioSource)> {
        self.source_for(QualityTier::High)
    }

    /// Whether the item can play without network access.
    pub fn is_offline(&self) -> bool {
        self.highest_quality_source()
            .map(|(_, source)| source.is_offline())
            .unwrap_or(false)
    }

    /// Snapshot of the current metadata.
    pub fn metadata(&self) -> ItemMetadata {
        self.inner.metadata.read().clone()
    }

    pub fn title(&self) -> Option<String> {
        self.inner.metadata.read().title.clone()
    }

    pub fn artist(&self) -> Option<String> {
        self.inner.metadata.read().artist.clone()
    }

    pub fn album(&self) -> Option<String> {
        self.inner.metadata.read().album.clone()
    }

    pub fn set_title(&self, title: Option<String>) {
        self.inner.metadata.write().title = title;
        self.notify(MetadataField::Title);
    }

    pub fn set_artist(&self, artist: Option<String>) {
        self.inner.metadata.write().artist = artist;
        self.notify(MetadataField::Artist);
    }

    pub fn set_album(&self, album: Option<String>) {
        self.inner.metadata.write().album = album;
        self.notify(MetadataField::Album);
    }

    pub fn set_track_count(&self, count: Option<u32>) {
        self.inner.metadata.write().track_count = count;
        self.notify(MetadataField::TrackCount);
    }

    pub fn set_track_number(&self, number: Option<u32>) {
        self.inner.metadata.write().track_number = number;
        self.notify(MetadataField::TrackNumber);
    }

    pub fn set_artwork(&self, artwork: Option<Artwork>) {
        self.inner.metadata.write().artwork = artwork;
        self.notify(MetadataField::Artwork);
    }

    /// Copy fields from stream metadata that the item does not have yet.
    ///
    /// Returns the fields that were filled, in a stable order.
    pub fn fill_missing_metadata(&self, stream: &StreamMetadata) -> Vec<MetadataField> {
        let mut filled = Vec::new();
        {
            let mut metadata = self.inner.metadata.write();

            if metadata.title.is_none() && stream.title.is_some() {
                metadata.title = stream.title.clone();
                filled.push(MetadataField::Title);
            }
            if metadata.artist.is_none() && stream.artist.is_some() {
                metadata.artist = stream.artist.clone();
                filled.push(MetadataField::Artist);
            }
            if metadata.album.is_none() && stream.album.is_some() {
                metadata.album = stream.album.clone();
                filled.push(MetadataField::Album);
            }
            if metadata.track_count.is_none() && stream.track_count.is_some() {
                metadata.track_count = stream.track_count;
                filled.push(MetadataField::TrackCount);
            }
            if metadata.track_number.is_none() && stream.track_number.is_some() {
                metadata.track_number = stream.track_number;
                filled.push(MetadataField::TrackNumber);
            }
            if metadata.artwork.is_none() && stream.artwork.is_some() {
                metadata.artwork = stream.artwork.clone();
                filled.push(MetadataField::Artwork);
            }
        }

        for field in &filled {
            self.notify(*field);
        }
        filled
    }

    /// Subscribe to metadata changes.
    pub fn subscribe(&self) -> broadcast::Receiver<MetadataField> {
        self.inner.changes.subscribe()
    }

    fn notify(&self, field: MetadataField) {
        // No receivers is fine: nobody is watching this item.
        let _ = self.inner.changes.send(field);
    }
}

impl PartialEq for AudioItem {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for AudioItem {}

impl Hash for AudioItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for AudioItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioItem")
            .field("id", &self.inner.id)
            .field("tiers", &self.inner.sources.keys().collect::<Vec<_>>())
            .field("title", &self.inner.metadata.read().title)
            .finish()
    }
}
