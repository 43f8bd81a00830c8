//! Forward-only segment reader.
//!
//! Aggregators consume a month's segments through [`SegmentReader`], the same
//! surface the host uses for segments read back from its durable log. The
//! generator has no token-count data, so [`SliceSegmentReader`] reports end
//! of sequence for token batches immediately.

use crate::types::{SegmentMap, SharedClient, TokenCount};
use anyhow::Result;

/// Single-pass cursor over a month's segments.
///
/// `Ok(None)` signals end of sequence. Readers are not restartable; build a
/// fresh one per use.
pub trait SegmentReader {
    /// Next segment's clients (possibly empty), advancing the cursor.
    fn read_entities(&mut self) -> Result<Option<Vec<SharedClient>>>;

    /// Next token-count batch.
    fn read_token_counts(&mut self) -> Result<Option<TokenCount>>;
}

/// Reader over an in-memory list of segments.
#[derive(Clone, Debug, Default)]
pub struct SliceSegmentReader {
    segments: Vec<Vec<SharedClient>>,
    next: usize,
}

impl SliceSegmentReader {
    /// Reader yielding `segments` in the given order.
    #[must_use]
    pub fn new(segments: Vec<Vec<SharedClient>>) -> Self {
        Self { segments, next: 0 }
    }

    /// Reader over every slot of `map`, ascending by index.
    ///
    /// Skipped and empty slots are both yielded as empty lists.
    #[must_use]
    pub fn from_segment_map(map: &SegmentMap) -> Self {
        let segments = map
            .values()
            .map(|slot| slot.clients().map_or_else(Vec::new, <[SharedClient]>::to_vec))
            .collect();
        Self::new(segments)
    }

    /// Segments not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.segments.len() - self.next
    }
}

impl SegmentReader for SliceSegmentReader {
    fn read_entities(&mut self) -> Result<Option<Vec<SharedClient>>> {
        let Some(seg) = self.segments.get_mut(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        Ok(Some(std::mem::take(seg)))
    }

    fn read_token_counts(&mut self) -> Result<Option<TokenCount>> {
        Ok(None)
    }
}

/// Drain every remaining entity segment from `reader`.
pub fn collect_entities(reader: &mut dyn SegmentReader) -> Result<Vec<Vec<SharedClient>>> {
    let mut out = Vec::new();
    while let Some(seg) = reader.read_entities()? {
        out.push(seg);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ClientRecord, SegmentSlot};
    use std::sync::Arc;

    fn client(id: &str) -> SharedClient {
        Arc::new(ClientRecord::new(id, "root", "acc", false))
    }

    #[test]
    fn yields_every_slot_in_index_order() {
        let (a, b) = (client("a"), client("b"));
        let mut map = SegmentMap::new();
        map.insert(3, SegmentSlot::Populated(vec![b.clone()]));
        map.insert(1, SegmentSlot::Skipped);
        map.insert(0, SegmentSlot::Populated(vec![a.clone()]));
        map.insert(2, SegmentSlot::Empty);

        let mut r = SliceSegmentReader::from_segment_map(&map);
        assert_eq!(r.remaining(), 4);
        let first = r.read_entities().unwrap().unwrap();
        assert!(Arc::ptr_eq(&first[0], &a));
        // Skipped slot 1, then empty slot 2.
        assert!(r.read_entities().unwrap().unwrap().is_empty());
        assert!(r.read_entities().unwrap().unwrap().is_empty());
        let last = r.read_entities().unwrap().unwrap();
        assert!(Arc::ptr_eq(&last[0], &b));
        assert!(r.read_entities().unwrap().is_none());
        assert!(r.read_entities().unwrap().is_none());
    }

    #[test]
    fn never_yields_token_counts() {
        let mut r = SliceSegmentReader::new(vec![vec![client("a")]]);
        assert!(r.read_token_counts().unwrap().is_none());
        assert_eq!(collect_entities(&mut r).unwrap().len(), 1);
        assert!(r.read_token_counts().unwrap().is_none());
    }
}
