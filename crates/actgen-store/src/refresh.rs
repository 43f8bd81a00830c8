//! Derived current-month counts rebuilt from stored segments.

use crate::aggregate::{NamespaceCounts, Tally};
use actgen_core::EntitySegment;
use std::collections::BTreeMap;

/// Counts derived from the current month's stored segments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurrentMonthCounts {
    /// Month start (Unix seconds) the counts describe.
    pub month_start: i64,
    /// Segments read.
    pub segments: usize,
    /// Distinct clients over all segments.
    pub distinct_clients: usize,
    /// Distinct clients per namespace.
    pub by_namespace: BTreeMap<String, NamespaceCounts>,
}

/// Count the given segments of the month starting at `month_start`.
#[must_use]
pub fn current_month_counts(month_start: i64, segments: &[EntitySegment]) -> CurrentMonthCounts {
    let mut tally = Tally::default();
    for s in segments {
        tally.add(&s.clients);
    }
    CurrentMonthCounts {
        month_start,
        segments: segments.len(),
        distinct_clients: tally.distinct(),
        by_namespace: tally.by_namespace,
    }
}
