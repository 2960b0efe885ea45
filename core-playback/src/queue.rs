//! # Playback Queue
//!
//! Ordered items plus a cursor and a [`PlaybackMode`].
//!
//! ## Overview
//!
//! The queue keeps items in insertion order and a separate play order (the
//! identity outside of shuffle, a permutation in shuffle). The cursor walks
//! the play order:
//!
//! - `Before(i)`: nothing selected yet, position `i` is the next candidate
//! - `At(i)`: position `i` is the current item
//! - `Exhausted`: the end was reached, `next()` returns nothing
//!
//! `next()` and `previous()` take an admission predicate and skip every
//! candidate it rejects, in the direction of travel, until one is accepted
//! or the queue runs out.
//!
//! ## Shuffle
//!
//! Only the upcoming part of the play order (after the cursor) is shuffled,
//! so what was already played stays reachable through `previous()`. It is
//! reshuffled whenever the mode is set or items are added or removed.
//! Leaving shuffle restores insertion order and keeps the cursor on the same
//! item.

use crate::error::{PlaybackError, Result};
use crate::item::AudioItem;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Order in which queued items are played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackMode {
    /// Play items in order, then stop.
    #[default]
    Normal,
    /// Keep playing the current item.
    RepeatOne,
    /// Play items in order and start over at the end.
    RepeatAll,
    /// Play items in random order, then stop.
    Shuffle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Before(usize),
    At(usize),
    Exhausted,
}

/// Queue of items with a cursor and a playback mode.
pub struct PlaybackQueue {
    entries: Vec<AudioItem>,
    order: Vec<usize>,
    cursor: Cursor,
    mode: PlaybackMode,
    rng: StdRng,
}

impl std::fmt::Debug for PlaybackQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackQueue")
            .field("len", &self.entries.len())
            .field("order", &self.order)
            .field("cursor", &self.cursor)
            .field("mode", &self.mode)
            .finish()
    }
}

impl PlaybackQueue {
    pub fn new(items: Vec<AudioItem>, mode: PlaybackMode) -> Self {
        Self::with_rng(items, mode, StdRng::from_entropy())
    }

    /// Queue with a deterministic shuffle order.
    pub fn with_seed(items: Vec<AudioItem>, mode: PlaybackMode, seed: u64) -> Self {
        Self::with_rng(items, mode, StdRng::seed_from_u64(seed))
    }

    fn with_rng(items: Vec<AudioItem>, mode: PlaybackMode, rng: StdRng) -> Self {
        let order = (0..items.len()).collect();
        let mut queue = Self {
            entries: items,
            order,
            cursor: Cursor::Exhausted,
            mode,
            rng,
        };
        queue.cursor = queue.before(0);
        queue.reshuffle_upcoming();
        queue
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Items in play order.
    pub fn items(&self) -> Vec<AudioItem> {
        self.order.iter().map(|&e| self.entries[e].clone()).collect()
    }

    /// Items in insertion order.
    pub fn original_items(&self) -> &[AudioItem] {
        &self.entries
    }

    /// Play-order position of the current item.
    pub fn current_index(&self) -> Option<usize> {
        match self.cursor {
            Cursor::At(i) => Some(i),
            _ => None,
        }
    }

    pub fn current(&self) -> Option<&AudioItem> {
        self.current_index().map(|i| &self.entries[self.order[i]])
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }

    /// Make the item at `index` (insertion order) the next candidate.
    ///
    /// In shuffle the chosen item is moved to the front of the play order
    /// so the rest of the queue still follows it.
    pub fn start_at(&mut self, index: usize) -> Result<()> {
        let len = self.entries.len();
        if index >= len {
            return Err(PlaybackError::InvalidIndex { index, len });
        }

        if self.mode == PlaybackMode::Shuffle {
            if let Some(pos) = self.order.iter().position(|&e| e == index) {
                let entry = self.order.remove(pos);
                self.order.insert(0, entry);
            }
            self.cursor = Cursor::Before(0);
        } else {
            self.cursor = Cursor::Before(index);
        }
        Ok(())
    }

    /// Advance to the next admitted item.
    pub fn next(&mut self, admit: &dyn Fn(&AudioItem) -> bool) -> Option<AudioItem> {
        let len = self.order.len();
        if len == 0 {
            self.cursor = Cursor::Exhausted;
            return None;
        }

        match (self.mode, self.cursor) {
            (_, Cursor::Exhausted) if self.mode != PlaybackMode::RepeatAll => None,
            (PlaybackMode::RepeatOne, Cursor::At(i)) => self.admitted_at(i, admit),
            (PlaybackMode::RepeatAll, cursor) => {
                let start = match cursor {
                    Cursor::At(i) => i + 1,
                    Cursor::Before(i) => i,
                    Cursor::Exhausted => 0,
                };
                for step in 0..len {
                    let pos = (start + step) % len;
                    if let Some(item) = self.admitted_at(pos, admit) {
                        self.cursor = Cursor::At(pos);
                        return Some(item);
                    }
                }
                None
            }
            (_, cursor) => {
                let start = match cursor {
                    Cursor::At(i) => i + 1,
                    Cursor::Before(i) => i,
                    Cursor::Exhausted => len,
                };
                for pos in start..len {
                    if let Some(item) = self.admitted_at(pos, admit) {
                        self.cursor = Cursor::At(pos);
                        return Some(item);
                    }
                }
                self.cursor = Cursor::Exhausted;
                None
            }
        }
    }

    /// Step back to the previous admitted item.
    ///
    /// At the start of the queue (outside repeat-all) nothing is returned and
    /// the cursor stays where it was.
    pub fn previous(&mut self, admit: &dyn Fn(&AudioItem) -> bool) -> Option<AudioItem> {
        let len = self.order.len();
        if len == 0 {
            return None;
        }

        match (self.mode, self.cursor) {
            (PlaybackMode::RepeatOne, Cursor::At(i)) => self.admitted_at(i, admit),
            (PlaybackMode::RepeatAll, cursor) => {
                let end = match cursor {
                    Cursor::At(i) | Cursor::Before(i) => i,
                    Cursor::Exhausted => len,
                };
                for step in 1..=len {
                    let pos = (end + len * 2 - step) % len;
                    if let Some(item) = self.admitted_at(pos, admit) {
                        self.cursor = Cursor::At(pos);
                        return Some(item);
                    }
                }
                None
            }
            (_, cursor) => {
                let end = match cursor {
                    Cursor::At(i) | Cursor::Before(i) => i.min(len),
                    Cursor::Exhausted => len,
                };
                for pos in (0..end).rev() {
                    if let Some(item) = self.admitted_at(pos, admit) {
                        self.cursor = Cursor::At(pos);
                        return Some(item);
                    }
                }
                None
            }
        }
    }

    /// Whether `next()` could return an item, ignoring admission.
    pub fn has_next(&self) -> bool {
        let len = self.order.len();
        match (self.mode, self.cursor) {
            (_, _) if len == 0 => false,
            (PlaybackMode::RepeatAll, _) => true,
            (PlaybackMode::RepeatOne, Cursor::At(_)) => true,
            (_, Cursor::At(i)) => i + 1 < len,
            (_, Cursor::Before(i)) => i < len,
            (_, Cursor::Exhausted) => false,
        }
    }

    /// Whether `previous()` could return an item, ignoring admission.
    pub fn has_previous(&self) -> bool {
        let len = self.order.len();
        match (self.mode, self.cursor) {
            (_, _) if len == 0 => false,
            (PlaybackMode::RepeatAll, _) => true,
            (PlaybackMode::RepeatOne, Cursor::At(_)) => true,
            (_, Cursor::At(i)) | (_, Cursor::Before(i)) => i > 0,
            (_, Cursor::Exhausted) => true,
        }
    }

    /// Append items at the end of the queue.
    ///
    /// An exhausted queue resumes with the first added item.
    pub fn add(&mut self, items: Vec<AudioItem>) {
        if items.is_empty() {
            return;
        }

        let old_len = self.order.len();
        for item in items {
            self.entries.push(item);
            self.order.push(self.entries.len() - 1);
        }
        if self.cursor == Cursor::Exhausted {
            self.cursor = Cursor::Before(old_len);
        }
        self.reshuffle_upcoming();
    }

    /// Remove the item at `index` (play order).
    ///
    /// Removing the current item leaves the cursor in front of the item that
    /// followed it.
    pub fn remove(&mut self, index: usize) -> Result<AudioItem> {
        let len = self.order.len();
        if index >= len {
            return Err(PlaybackError::InvalidIndex { index, len });
        }

        let entry = self.order.remove(index);
        let item = self.entries.remove(entry);
        for e in self.order.iter_mut() {
            if *e > entry {
                *e -= 1;
            }
        }

        self.cursor = match self.cursor {
            Cursor::At(c) if index < c => Cursor::At(c - 1),
            Cursor::At(c) if index == c => self.before(c),
            Cursor::Before(c) if index < c => Cursor::Before(c - 1),
            Cursor::Before(c) => self.before(c),
            other => other,
        };
        self.reshuffle_upcoming();
        Ok(item)
    }

    /// Change the mode, reordering the upcoming items as needed.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        let old = self.mode;
        self.mode = mode;

        if old == PlaybackMode::Shuffle && mode != PlaybackMode::Shuffle {
            self.restore_order();
        } else {
            self.reshuffle_upcoming();
        }
    }

    fn admitted_at(&self, pos: usize, admit: &dyn Fn(&AudioItem) -> bool) -> Option<AudioItem> {
        let item = &self.entries[self.order[pos]];
        admit(item).then(|| item.clone())
    }

    fn before(&self, pos: usize) -> Cursor {
        let len = self.order.len();
        if pos < len {
            Cursor::Before(pos)
        } else if self.mode == PlaybackMode::RepeatAll && len > 0 {
            Cursor::Before(0)
        } else {
            Cursor::Exhausted
        }
    }

    fn reshuffle_upcoming(&mut self) {
        if self.mode != PlaybackMode::Shuffle {
            return;
        }
        let start = match self.cursor {
            Cursor::At(i) => i + 1,
            Cursor::Before(i) => i,
            Cursor::Exhausted => return,
        };
        if start < self.order.len() {
            self.order[start..].shuffle(&mut self.rng);
        }
    }

    fn restore_order(&mut self) {
        let previous = std::mem::replace(&mut self.order, (0..self.entries.len()).collect());
        self.cursor = match self.cursor {
            Cursor::At(i) => Cursor::At(previous[i]),
            Cursor::Before(i) if i < previous.len() => Cursor::Before(previous[i]),
            Cursor::Before(_) => self.before(previous.len()),
            Cursor::Exhausted => Cursor::Exhausted,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::AudioSource;
    use std::collections::HashSet;

    fn items(n: usize) -> Vec<AudioItem> {
        (0..n)
            .map(|i| {
                AudioItem::with_source(AudioSource::remote(format!("https://cdn.test/{i}.mp3")))
            })
            .collect()
    }

    fn all(_: &AudioItem) -> bool {
        true
    }

    #[test]
    fn normal_mode_walks_then_exhausts() {
        let list = items(3);
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::Normal);

        assert_eq!(queue.next(&all), Some(list[0].clone()));
        assert_eq!(queue.next(&all), Some(list[1].clone()));
        assert_eq!(queue.next(&all), Some(list[2].clone()));
        assert!(!queue.has_next());
        assert_eq!(queue.next(&all), None);
        assert!(queue.is_exhausted());
        assert_eq!(queue.next(&all), None);
    }

    #[test]
    fn rejected_items_are_skipped_in_both_directions() {
        let list = items(4);
        let rejected = list[1].id();
        let admit = move |item: &AudioItem| item.id() != rejected;
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::Normal);

        assert_eq!(queue.next(&admit), Some(list[0].clone()));
        assert_eq!(queue.next(&admit), Some(list[2].clone()));
        assert_eq!(queue.previous(&admit), Some(list[0].clone()));
    }

    #[test]
    fn all_rejected_exhausts() {
        let mut queue = PlaybackQueue::new(items(3), PlaybackMode::Normal);
        assert_eq!(queue.next(&|_| false), None);
        assert!(queue.is_exhausted());
    }

    #[test]
    fn previous_at_start_keeps_cursor() {
        let list = items(2);
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::Normal);
        queue.next(&all);
        assert_eq!(queue.previous(&all), None);
        assert_eq!(queue.current_index(), Some(0));
        assert_eq!(queue.next(&all), Some(list[1].clone()));
    }

    #[test]
    fn repeat_one_returns_current() {
        let list = items(3);
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::RepeatOne);
        queue.start_at(1).unwrap();
        assert_eq!(queue.next(&all), Some(list[1].clone()));
        assert_eq!(queue.next(&all), Some(list[1].clone()));
        assert_eq!(queue.previous(&all), Some(list[1].clone()));
        assert_eq!(queue.current_index(), Some(1));
    }

    #[test]
    fn repeat_all_visits_every_admitted_item_once_per_cycle() {
        let list = items(5);
        let rejected = list[3].id();
        let admit = move |item: &AudioItem| item.id() != rejected;
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::RepeatAll);

        for _cycle in 0..3 {
            let mut seen = HashSet::new();
            for _ in 0..4 {
                let item = queue.next(&admit).expect("repeat-all never exhausts");
                assert!(seen.insert(item.id()), "item visited twice in one cycle");
            }
            assert_eq!(seen.len(), 4);
            assert!(!seen.contains(&rejected));
        }
        assert!(!queue.is_exhausted());
    }

    #[test]
    fn repeat_all_previous_wraps() {
        let list = items(3);
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::RepeatAll);
        queue.next(&all);
        assert_eq!(queue.previous(&all), Some(list[2].clone()));
        assert_eq!(queue.previous(&all), Some(list[1].clone()));
    }

    #[test]
    fn shuffle_is_a_permutation_starting_with_chosen_item() {
        let list = items(8);
        let mut queue = PlaybackQueue::with_seed(list.clone(), PlaybackMode::Shuffle, 7);
        queue.start_at(5).unwrap();

        let first = queue.next(&all).unwrap();
        assert_eq!(first, list[5]);

        let mut seen: HashSet<_> = [first.id()].into_iter().collect();
        while let Some(item) = queue.next(&all) {
            assert!(seen.insert(item.id()));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn leaving_shuffle_restores_order_and_keeps_current() {
        let list = items(6);
        let mut queue = PlaybackQueue::with_seed(list.clone(), PlaybackMode::Shuffle, 3);
        queue.start_at(2).unwrap();
        queue.next(&all);
        queue.next(&all);
        let current = queue.current().cloned().unwrap();

        queue.set_mode(PlaybackMode::Normal);

        assert_eq!(queue.items(), list);
        assert_eq!(queue.current(), Some(&current));
    }

    #[test]
    fn entering_shuffle_keeps_played_part() {
        let list = items(6);
        let mut queue = PlaybackQueue::with_seed(list.clone(), PlaybackMode::Normal, 11);
        queue.next(&all);
        queue.next(&all);

        queue.set_mode(PlaybackMode::Shuffle);

        assert_eq!(queue.items()[..2], list[..2]);
        assert_eq!(queue.current(), Some(&list[1]));
        let upcoming: HashSet<_> = queue.items()[2..].iter().map(|i| i.id()).collect();
        let expected: HashSet<_> = list[2..].iter().map(|i| i.id()).collect();
        assert_eq!(upcoming, expected);
    }

    #[test]
    fn add_after_exhaustion_resumes_with_new_items() {
        let list = items(1);
        let extra = items(2);
        let mut queue = PlaybackQueue::new(list, PlaybackMode::Normal);
        queue.next(&all);
        assert_eq!(queue.next(&all), None);

        queue.add(extra.clone());
        assert_eq!(queue.next(&all), Some(extra[0].clone()));
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn removing_current_points_at_following_item() {
        let list = items(4);
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::Normal);
        queue.start_at(1).unwrap();
        queue.next(&all);

        let removed = queue.remove(1).unwrap();
        assert_eq!(removed, list[1]);
        assert_eq!(queue.current_index(), None);
        assert_eq!(queue.next(&all), Some(list[2].clone()));
    }

    #[test]
    fn removing_before_cursor_shifts_it() {
        let list = items(4);
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::Normal);
        queue.start_at(2).unwrap();
        queue.next(&all);

        queue.remove(0).unwrap();
        assert_eq!(queue.current_index(), Some(1));
        assert_eq!(queue.current(), Some(&list[2]));
    }

    #[test]
    fn removing_last_current_item() {
        let list = items(3);
        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::Normal);
        queue.start_at(2).unwrap();
        queue.next(&all);
        queue.remove(2).unwrap();
        assert!(queue.is_exhausted());
        assert_eq!(queue.previous(&all), Some(list[1].clone()));

        let mut queue = PlaybackQueue::new(list.clone(), PlaybackMode::RepeatAll);
        queue.start_at(2).unwrap();
        queue.next(&all);
        queue.remove(2).unwrap();
        assert_eq!(queue.next(&all), Some(list[0].clone()));
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut queue = PlaybackQueue::new(items(2), PlaybackMode::Normal);
        assert!(matches!(
            queue.start_at(2),
            Err(PlaybackError::InvalidIndex { index: 2, len: 2 })
        ));
        assert!(matches!(
            queue.remove(5),
            Err(PlaybackError::InvalidIndex { index: 5, len: 2 })
        ));
    }

    #[test]
    fn empty_queue_has_nothing() {
        let mut queue = PlaybackQueue::new(Vec::new(), PlaybackMode::RepeatAll);
        assert!(!queue.has_next());
        assert!(!queue.has_previous());
        assert_eq!(queue.next(&all), None);
        assert_eq!(queue.previous(&all), None);
    }
}
