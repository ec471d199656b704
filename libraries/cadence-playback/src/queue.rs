//! Play queue with marker-skipping navigation
//!
//! The browse layer hands the engine a fully resolved, ordered list of
//! [`QueueItem`]s. Non-track entries (album-cover markers, unexpanded
//! references) are never played; navigation skips over them, and running
//! off either end of the queue is a no-op rather than an error.

use cadence_core::QueueItem;

/// Ordered queue of items plus the playback cursor
///
/// The cursor is mutated only by the controller's load/advance operations;
/// `None` means nothing is loaded.
#[derive(Debug, Clone, Default)]
pub struct QueueModel {
    items: Vec<QueueItem>,
    cursor: Option<usize>,
}

impl QueueModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the queue contents, resetting the cursor
    pub fn set_items(&mut self, items: Vec<QueueItem>) {
        self.items = items;
        self.cursor = None;
    }

    /// Remove everything and reset the cursor
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = None;
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, index: usize) -> Option<&QueueItem> {
        self.items.get(index)
    }

    /// Current cursor position; `None` = nothing loaded
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        self.cursor = cursor;
    }

    /// Index of the nearest playable item at or after `index`
    ///
    /// Mirrors the "auto-skip cover markers" behavior: pointing a load at a
    /// marker resolves to the following track instead.
    pub fn resolve_load_target(&self, index: usize) -> Option<usize> {
        self.items
            .iter()
            .enumerate()
            .skip(index)
            .find(|(_, item)| item.is_playable())
            .map(|(i, _)| i)
    }

    /// Index of the next playable item strictly after `after`
    ///
    /// `None` as the starting point searches from the beginning of the
    /// queue. Returns `None` when navigation runs off the end.
    pub fn next_playable_after(&self, after: Option<usize>) -> Option<usize> {
        let start = after.map_or(0, |i| i + 1);
        self.resolve_load_target(start)
    }

    /// Index of the nearest playable item strictly before `before`
    pub fn previous_playable_before(&self, before: Option<usize>) -> Option<usize> {
        let end = before?;
        self.items[..end]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, item)| item.is_playable())
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{ItemKind, MediaSource};
    use std::path::PathBuf;

    fn track(name: &str) -> QueueItem {
        QueueItem::track(MediaSource::Local(PathBuf::from(format!("/m/{name}"))), name)
    }

    fn cover() -> QueueItem {
        QueueItem::marker(ItemKind::AlbumCoverMarker, "cover")
    }

    fn queue(items: Vec<QueueItem>) -> QueueModel {
        let mut q = QueueModel::new();
        q.set_items(items);
        q
    }

    #[test]
    fn next_skips_markers() {
        let q = queue(vec![track("a.mp3"), cover(), cover(), track("b.mp3")]);
        assert_eq!(q.next_playable_after(Some(0)), Some(3));
    }

    #[test]
    fn next_from_last_track_is_none() {
        let q = queue(vec![track("a.mp3"), track("b.mp3")]);
        assert_eq!(q.next_playable_after(Some(1)), None);
        // trailing markers don't change that
        let q = queue(vec![track("a.mp3"), cover()]);
        assert_eq!(q.next_playable_after(Some(0)), None);
    }

    #[test]
    fn next_from_nothing_loaded_finds_first_track() {
        let q = queue(vec![cover(), track("a.mp3")]);
        assert_eq!(q.next_playable_after(None), Some(1));
    }

    #[test]
    fn previous_skips_markers() {
        let q = queue(vec![track("a.mp3"), cover(), track("b.mp3")]);
        assert_eq!(q.previous_playable_before(Some(2)), Some(0));
        assert_eq!(q.previous_playable_before(Some(0)), None);
        assert_eq!(q.previous_playable_before(None), None);
    }

    #[test]
    fn load_target_resolves_forward() {
        let q = queue(vec![cover(), cover(), track("a.mp3")]);
        assert_eq!(q.resolve_load_target(0), Some(2));
        assert_eq!(q.resolve_load_target(2), Some(2));
        assert_eq!(q.resolve_load_target(3), None);
    }

    #[test]
    fn set_items_resets_cursor() {
        let mut q = queue(vec![track("a.mp3")]);
        q.set_cursor(Some(0));
        q.set_items(vec![track("b.mp3")]);
        assert_eq!(q.cursor(), None);
    }
}
