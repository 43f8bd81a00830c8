//! Partitioning invariants over arbitrary pools.
//!
//! Invariants tested:
//! 1) implicit segments hold at most `ceil(N / usable)` clients each and
//!    together hold all N clients, in pool order;
//! 2) skipped indexes are never populated, empty indexes are always present
//!    and empty;
//! 3) explicit tags fully determine which clients land where.

use actgen_core::request::MonthData;
use actgen_core::{ClientRecord, SegmentSlot, SharedClient};
use actgen_gen::month::MonthPool;
use actgen_gen::partition::populate_segments;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

#[track_caller]
fn record(i: usize) -> SharedClient {
    Arc::new(ClientRecord::new(format!("c{i}"), "root", "acc", i % 3 == 0))
}

/// Month parameters with disjoint skip/empty sets drawn from `0..total`.
fn params() -> impl Strategy<Value = MonthData> {
    (1u32..12)
        .prop_flat_map(|total| {
            (
                Just(total),
                proptest::collection::btree_set(0..total, 0..total as usize),
            )
        })
        .prop_flat_map(|(total, reserved)| {
            let reserved: Vec<u32> = reserved.into_iter().collect();
            let n = reserved.len();
            (Just(total), Just(reserved), 0..=n)
        })
        .prop_map(|(total, reserved, split)| MonthData {
            num_segments: total,
            skip_segment_indexes: reserved[..split].to_vec(),
            empty_segment_indexes: reserved[split..].to_vec(),
            ..MonthData::default()
        })
}

fn pool(n: usize, params: MonthData) -> MonthPool {
    let mut p = MonthPool::default();
    for i in 0..n {
        p.push(record(i), None);
    }
    p.set_params(params);
    p
}

proptest! {
    #[test]
    fn implicit_partition_is_bounded_and_complete(n in 0usize..200, params in params()) {
        let total = params.num_segments as usize;
        let skipped: BTreeSet<u32> = params.skip_segment_indexes.iter().copied().collect();
        let empty: BTreeSet<u32> = params.empty_segment_indexes.iter().copied().collect();
        let usable = total - skipped.len() - empty.len();
        let p = pool(n, params);

        let result = populate_segments(&p);
        if usable == 0 {
            prop_assert!(result.is_err());
            return Ok(());
        }
        let segs = result.unwrap();
        let bound = n.div_ceil(usable);

        let mut placed = Vec::new();
        for (i, slot) in &segs {
            prop_assert!(*i < total as u32);
            match slot {
                SegmentSlot::Skipped => prop_assert!(skipped.contains(i)),
                SegmentSlot::Empty => prop_assert!(empty.contains(i)),
                SegmentSlot::Populated(clients) => {
                    prop_assert!(!skipped.contains(i) && !empty.contains(i));
                    prop_assert!(clients.len() <= bound);
                    placed.extend(clients.iter().cloned());
                }
            }
        }
        for i in skipped.iter().chain(&empty) {
            prop_assert!(segs.contains_key(i));
        }
        prop_assert_eq!(placed.len(), n);
        for (got, want) in placed.iter().zip(p.clients()) {
            prop_assert!(Arc::ptr_eq(got, want));
        }
    }

    #[test]
    fn explicit_tags_determine_membership(tags in proptest::collection::vec(0u32..6, 1..40)) {
        let mut p = MonthPool::default();
        for (i, &t) in tags.iter().enumerate() {
            p.push(record(i), Some(t));
        }
        p.set_params(MonthData { num_segments: 1, ..MonthData::default() });
        let segs = populate_segments(&p).unwrap();

        let distinct: BTreeSet<u32> = tags.iter().copied().collect();
        prop_assert_eq!(segs.keys().copied().collect::<BTreeSet<_>>(), distinct);
        for (idx, slot) in &segs {
            let want: Vec<String> = tags
                .iter()
                .enumerate()
                .filter(|(_, t)| *t == idx)
                .map(|(i, _)| format!("c{i}"))
                .collect();
            let got: Vec<String> = slot
                .clients()
                .unwrap()
                .iter()
                .map(|c| c.client_id.clone())
                .collect();
            prop_assert_eq!(got, want);
        }
    }
}
