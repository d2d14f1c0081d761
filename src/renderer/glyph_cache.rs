use std::{collections::HashMap, num::NonZeroUsize};

use crate::glyph_id::GlyphId;

#[derive(Default, Clone, Copy)]
struct LruLinks {
    newer: Option<usize>,
    older: Option<usize>,
}

/// Fixed number of equally sized coverage slots with LRU eviction.
///
/// Slot data lives in one flat buffer; the links form a doubly linked list
/// from `head` (most recent) to `tail` (next to evict).
struct SlotTier {
    capacity: usize,
    block_size: usize,
    data: Vec<u8>,

    links: Vec<LruLinks>,
    head: Option<usize>,
    tail: Option<usize>,
    index: HashMap<GlyphId, usize, fxhash::FxBuildHasher>,
    free: Vec<usize>,
    keys: Vec<Option<GlyphId>>,
}

impl SlotTier {
    fn new(capacity: NonZeroUsize, block_size: NonZeroUsize) -> Self {
        let capacity = capacity.get();
        let block_size = block_size.get();

        Self {
            capacity,
            block_size,
            data: vec![0; capacity * block_size],
            links: vec![LruLinks::default(); capacity],
            head: None,
            tail: None,
            index: HashMap::with_capacity_and_hasher(capacity, fxhash::FxBuildHasher::default()),
            free: (0..capacity).collect(),
            keys: vec![None; capacity],
        }
    }

    fn clear(&mut self) {
        self.index.clear();
        self.free = (0..self.capacity).collect();
        self.keys.fill(None);
        self.head = None;
        self.tail = None;
    }

    /// Returns the cached coverage for `key`, filling a slot from `rasterize`
    /// on a miss. `len` is the number of meaningful bytes in the slot.
    fn get_or_insert_with(
        &mut self,
        key: &GlyphId,
        len: usize,
        rasterize: impl FnOnce() -> Vec<u8>,
    ) -> &[u8] {
        let len = len.min(self.block_size);

        let slot = match self.index.get(key).copied() {
            Some(slot) => {
                self.touch(slot);
                slot
            }
            None => {
                let slot = self.claim_slot();
                self.attach_to_head(slot, *key);

                let coverage = rasterize();
                let start = slot * self.block_size;
                let copy_len = coverage.len().min(len);
                self.data[start..start + copy_len].copy_from_slice(&coverage[..copy_len]);
                self.data[start + copy_len..start + len].fill(0);
                slot
            }
        };

        let start = slot * self.block_size;
        &self.data[start..start + len]
    }

    /// Takes a free slot, or evicts the least recently used one.
    fn claim_slot(&mut self) -> usize {
        if let Some(slot) = self.free.pop() {
            return slot;
        }

        // Capacity is non-zero and every slot is linked, so a tail exists.
        let Some(tail) = self.tail else {
            unreachable!("full tier without a tail");
        };
        self.detach(tail);
        if let Some(old_key) = self.keys[tail].take() {
            self.index.remove(&old_key);
        }
        tail
    }

    fn attach_to_head(&mut self, slot: usize, key: GlyphId) {
        self.links[slot] = LruLinks {
            newer: None,
            older: self.head,
        };
        if let Some(old_head) = self.head {
            self.links[old_head].newer = Some(slot);
        }
        self.head = Some(slot);
        if self.tail.is_none() {
            self.tail = Some(slot);
        }

        self.index.insert(key, slot);
        self.keys[slot] = Some(key);
    }

    /// Unlinks `slot`, keeping `head` and `tail` consistent.
    fn detach(&mut self, slot: usize) {
        let LruLinks { newer, older } = self.links[slot];

        match newer {
            Some(newer) => self.links[newer].older = older,
            None => self.head = older,
        }
        match older {
            Some(older) => self.links[older].newer = newer,
            None => self.tail = newer,
        }

        self.links[slot] = LruLinks::default();
    }

    fn touch(&mut self, slot: usize) {
        if self.head == Some(slot) {
            return;
        }

        self.detach(slot);
        if let Some(key) = self.keys[slot] {
            self.attach_to_head(slot, key);
        }
    }
}

/// Rasterized coverage of one glyph, row-major, one byte per pixel.
pub struct GlyphCacheItem<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Glyph coverage cache split into tiers by bitmap size.
///
/// A glyph goes into the smallest tier whose slots can hold its bitmap;
/// glyphs larger than every tier are rasterized on each use.
pub struct GlyphCache {
    /// Sorted by block size.
    tiers: Vec<SlotTier>,
    scratch: Vec<u8>,
}

impl Default for GlyphCache {
    /// Tiers sized for the 10–32px text an e-paper status screen uses.
    fn default() -> Self {
        let tier = |block_size: usize, capacity: usize| {
            (
                NonZeroUsize::new(block_size).unwrap_or(NonZeroUsize::MIN),
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )
        };
        Self::new(&[tier(256, 256), tier(1024, 128), tier(4096, 32)])
    }
}

impl GlyphCache {
    /// `tiers` lists `(block_size, capacity)` pairs in any order.
    pub fn new(tiers: &[(NonZeroUsize, NonZeroUsize)]) -> Self {
        let mut sorted = tiers.to_vec();
        sorted.sort_by_key(|(block_size, _)| *block_size);

        Self {
            tiers: sorted
                .into_iter()
                .map(|(block_size, capacity)| SlotTier::new(capacity, block_size))
                .collect(),
            scratch: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        for tier in &mut self.tiers {
            tier.clear();
        }
    }

    /// Coverage for `glyph_id`, rasterized with `font` on a miss.
    ///
    /// Returns `None` for glyphs without ink, such as spaces.
    pub fn get(&mut self, glyph_id: &GlyphId, font: &fontdue::Font) -> Option<GlyphCacheItem<'_>> {
        let glyph_index = glyph_id.glyph_index();
        let font_size = glyph_id.font_size();

        let metrics = font.metrics_indexed(glyph_index, font_size);
        let len = metrics.width * metrics.height;
        if len == 0 {
            return None;
        }

        let rasterize = || font.rasterize_indexed(glyph_index, font_size).1;
        let data = match self.tiers.iter_mut().find(|tier| tier.block_size >= len) {
            Some(tier) => tier.get_or_insert_with(glyph_id, len, rasterize),
            None => {
                self.scratch = rasterize();
                &self.scratch[..len.min(self.scratch.len())]
            }
        };

        Some(GlyphCacheItem {
            width: metrics.width,
            height: metrics.height,
            data,
        })
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn make_key(glyph_index: u16) -> GlyphId {
        GlyphId::new(fontdb::ID::dummy(), glyph_index, 12.0)
    }

    fn tier(capacity: usize, block_size: usize) -> SlotTier {
        SlotTier::new(
            NonZeroUsize::new(capacity).unwrap(),
            NonZeroUsize::new(block_size).unwrap(),
        )
    }

    #[test]
    fn miss_fills_and_hit_reuses() {
        let mut tier = tier(2, 4);
        let key = make_key(1);

        let data = tier.get_or_insert_with(&key, 4, || vec![1, 2, 3, 4]);
        assert_eq!(data, &[1, 2, 3, 4]);
        assert_eq!(tier.index.len(), 1);
        // Free slots are handed out from the back.
        assert_eq!(tier.head, Some(1));
        assert_eq!(tier.tail, Some(1));

        let data = tier.get_or_insert_with(&key, 4, || vec![9, 9, 9, 9]);
        assert_eq!(data, &[1, 2, 3, 4]);
        assert_eq!(tier.index.len(), 1);
    }

    #[test]
    fn short_coverage_is_zero_padded() {
        let mut tier = tier(1, 4);
        let key = make_key(1);
        tier.get_or_insert_with(&make_key(9), 4, || vec![7, 7, 7, 7]);

        // Reuses the slot that held 7s.
        let data = tier.get_or_insert_with(&key, 3, || vec![1]);
        assert_eq!(data, &[1, 0, 0]);
    }

    #[test]
    fn least_recently_used_slot_is_evicted() {
        let mut tier = tier(2, 1);
        let key1 = make_key(1);
        let key2 = make_key(2);
        let key3 = make_key(3);

        tier.get_or_insert_with(&key1, 1, || vec![1]);
        tier.get_or_insert_with(&key2, 1, || vec![2]);
        assert_eq!(tier.head, Some(0));
        assert_eq!(tier.tail, Some(1));
        assert_eq!(tier.links[0].older, Some(1));
        assert_eq!(tier.links[1].newer, Some(0));

        tier.get_or_insert_with(&key3, 1, || vec![3]);
        assert_eq!(tier.index.len(), 2);
        assert!(!tier.index.contains_key(&key1));
        assert_eq!(tier.head, Some(1));
        assert_eq!(tier.tail, Some(0));
        assert_eq!(tier.keys[1], Some(key3));
        assert_eq!(tier.keys[0], Some(key2));
    }

    #[test]
    fn hit_moves_entry_to_the_front() {
        let mut tier = tier(3, 1);
        let key1 = make_key(1);
        let key2 = make_key(2);
        let key3 = make_key(3);
        let key4 = make_key(4);

        tier.get_or_insert_with(&key1, 1, || vec![1]);
        tier.get_or_insert_with(&key2, 1, || vec![2]);
        tier.get_or_insert_with(&key3, 1, || vec![3]);

        // key1 was the tail; touching it makes key2 the next victim.
        tier.get_or_insert_with(&key1, 1, || vec![99]);
        assert_eq!(tier.keys[tier.head.unwrap()], Some(key1));
        assert_eq!(tier.keys[tier.tail.unwrap()], Some(key2));

        tier.get_or_insert_with(&key4, 1, || vec![4]);
        assert!(tier.index.contains_key(&key1));
        assert!(!tier.index.contains_key(&key2));
        assert!(tier.index.contains_key(&key3));
    }

    #[test]
    fn touching_a_middle_entry_keeps_the_list_linked() {
        let mut tier = tier(3, 1);
        let keys = [make_key(1), make_key(2), make_key(3)];
        for (i, key) in keys.iter().enumerate() {
            tier.get_or_insert_with(key, 1, || vec![i as u8]);
        }

        tier.get_or_insert_with(&keys[1], 1, || vec![42]);

        let mut order = Vec::new();
        let mut cursor = tier.head;
        while let Some(slot) = cursor {
            order.push(tier.keys[slot].unwrap());
            cursor = tier.links[slot].older;
        }
        assert_eq!(order, [keys[1], keys[2], keys[0]]);
    }

    #[test]
    fn single_slot_tier_replaces_its_entry() {
        let mut tier = tier(1, 1);
        let key1 = make_key(1);
        let key2 = make_key(2);

        tier.get_or_insert_with(&key1, 1, || vec![1]);
        tier.get_or_insert_with(&key2, 1, || vec![2]);
        assert_eq!(tier.head, Some(0));
        assert_eq!(tier.tail, Some(0));
        assert!(tier.index.contains_key(&key2));
        assert!(!tier.index.contains_key(&key1));
    }

    #[test]
    fn clear_frees_every_slot() {
        let mut tier = tier(2, 1);
        tier.get_or_insert_with(&make_key(1), 1, || vec![1]);
        tier.clear();
        assert!(tier.index.is_empty());
        assert_eq!(tier.free.len(), 2);
        assert_eq!(tier.head, None);
    }

    #[test]
    fn tiers_are_sorted_by_block_size() {
        let cache = GlyphCache::new(&[
            (NonZeroUsize::new(20).unwrap(), NonZeroUsize::new(50).unwrap()),
            (NonZeroUsize::new(10).unwrap(), NonZeroUsize::new(100).unwrap()),
        ]);
        assert_eq!(cache.tiers.len(), 2);
        assert_eq!(cache.tiers[0].block_size, 10);
        assert_eq!(cache.tiers[1].block_size, 20);
    }
}
