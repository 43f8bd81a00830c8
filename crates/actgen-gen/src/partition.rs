//! Partition a `MonthPool` into a `SegmentMap`.
//!
//! Every index in the month's skip list maps to [`SegmentSlot::Skipped`]
//! and every index in its empty list maps to [`SegmentSlot::Empty`]. Those
//! indexes are reserved: implicit placement never uses them.
//!
//! The rest of the map comes from one of two paths:
//!
//! - **explicit**: if any client in the pool carries a segment tag, each
//!   distinct tag becomes a segment holding its tagged clients in pool order.
//!   Tags win over a reserved entry with the same index. Implicit sizing does
//!   not run.
//! - **implicit**: with `total` segments (1 when unset) and `reserved`
//!   skip + empty indexes, clients are dealt in pool order into chunks of
//!   `ceil(len / (total - reserved))`, walking indexes `0..total` and passing
//!   over reserved ones. Indexes past the last client are left out of the map.

use crate::month::MonthPool;
use actgen_core::request::MonthData;
use actgen_core::{Error, Result, SegmentIndex, SegmentMap, SegmentSlot, SharedClient};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Compute the segment layout of `pool`.
///
/// A pool without a directive is treated as one implicit segment with no
/// reserved indexes.
pub fn populate_segments(pool: &MonthPool) -> Result<SegmentMap> {
    let default_params = MonthData::default();
    let params = pool.params().unwrap_or(&default_params);

    let mut segments = SegmentMap::new();
    let mut reserved: BTreeSet<SegmentIndex> = BTreeSet::new();
    for &i in &params.skip_segment_indexes {
        segments.insert(i, SegmentSlot::Skipped);
        reserved.insert(i);
    }
    for &i in &params.empty_segment_indexes {
        segments.insert(i, SegmentSlot::Empty);
        reserved.insert(i);
    }

    if !pool.predefined_segments().is_empty() {
        for (&segment, positions) in pool.predefined_segments() {
            let clients: Vec<SharedClient> = positions
                .iter()
                .map(|&p| Arc::clone(&pool.clients()[p]))
                .collect();
            segments.insert(segment, SegmentSlot::Populated(clients));
        }
        return Ok(segments);
    }

    let total = if params.num_segments > 0 {
        params.num_segments as usize
    } else {
        1
    };
    let skipped = params.skip_segment_indexes.len();
    let empty = params.empty_segment_indexes.len();
    let usable = total.saturating_sub(skipped + empty);
    if usable == 0 {
        return Err(Error::TooFewSegments {
            total,
            skipped,
            empty,
        });
    }

    let clients = pool.clients();
    let chunk = clients.len().div_ceil(usable);
    let mut rest = clients;
    for i in 0..params.num_segments.max(1) {
        if rest.is_empty() {
            break;
        }
        if reserved.contains(&i) {
            continue;
        }
        let (head, tail) = rest.split_at(chunk.min(rest.len()));
        segments.insert(i, SegmentSlot::Populated(head.to_vec()));
        rest = tail;
    }
    Ok(segments)
}

/// Sizes of the populated slots, ascending by index. Skipped slots map to
/// `None`, empty ones to `Some(0)`.
#[must_use]
pub fn slot_sizes(segments: &SegmentMap) -> Vec<(SegmentIndex, Option<usize>)> {
    segments
        .iter()
        .map(|(&i, slot)| (i, slot.clients().map(<[SharedClient]>::len)))
        .collect()
}
