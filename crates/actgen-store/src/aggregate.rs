//! Distinct-client and per-namespace counters.
//!
//! Clients are deduplicated by `client_id` within a month; the first
//! occurrence decides the namespace and client type a client is counted
//! under.

use actgen_core::host::AggregationOptions;
use actgen_core::{ClientType, SegmentReader, SharedClient};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Distinct clients of one namespace, split by client type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NamespaceCounts {
    /// Distinct entity clients.
    pub entity_clients: u64,
    /// Distinct non-entity token clients.
    pub non_entity_clients: u64,
}

impl NamespaceCounts {
    /// Sum of both client types.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.entity_clients + self.non_entity_clients
    }
}

/// Running deduplicated tally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    /// Distinct client identifiers seen.
    pub client_ids: BTreeSet<String>,
    /// Counts per namespace identifier.
    pub by_namespace: BTreeMap<String, NamespaceCounts>,
}

impl Tally {
    /// Count `clients`, ignoring identifiers already seen.
    pub fn add<'a>(&mut self, clients: impl IntoIterator<Item = &'a SharedClient>) {
        for c in clients {
            if !self.client_ids.insert(c.client_id.clone()) {
                continue;
            }
            let counts = self.by_namespace.entry(c.namespace_id.clone()).or_default();
            match c.client_type {
                ClientType::Entity => counts.entity_clients += 1,
                ClientType::NonEntityToken => counts.non_entity_clients += 1,
            }
        }
    }

    /// Number of distinct clients.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.client_ids.len()
    }
}

/// Counters produced for one month.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MonthSummary {
    /// Segments drained from the reader (empty ones included).
    pub segments: usize,
    /// Distinct client identifiers, when distinct-client output was requested.
    pub distinct_clients: Option<BTreeSet<String>>,
    /// Per-namespace counters, when precomputed queries were requested.
    pub by_namespace: Option<BTreeMap<String, NamespaceCounts>>,
    /// Non-entity token counts by namespace, from token batches.
    pub token_counts: BTreeMap<String, u64>,
}

/// Drain `reader` and build the counters `opts` asks for.
pub fn summarize(
    reader: &mut dyn SegmentReader,
    opts: &AggregationOptions,
) -> Result<MonthSummary> {
    let mut tally = Tally::default();
    let mut segments = 0;
    while let Some(clients) = reader.read_entities()? {
        tally.add(&clients);
        segments += 1;
    }

    let mut token_counts = BTreeMap::new();
    while let Some(batch) = reader.read_token_counts()? {
        for (ns, n) in batch.counts_by_namespace {
            *token_counts.entry(ns).or_insert(0) += n;
        }
    }

    let Tally {
        client_ids,
        by_namespace,
    } = tally;
    Ok(MonthSummary {
        segments,
        distinct_clients: opts.distinct_clients.then_some(client_ids),
        by_namespace: opts.precomputed_queries.then_some(by_namespace),
        token_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actgen_core::{ClientRecord, SliceSegmentReader};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn opts(precomputed: bool, distinct: bool) -> AggregationOptions {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        AggregationOptions {
            active_period_start: t,
            active_period_end: t,
            end_time: t,
            precomputed_queries: precomputed,
            distinct_clients: distinct,
        }
    }

    fn c(id: &str, ns: &str, non_entity: bool) -> SharedClient {
        Arc::new(ClientRecord::new(id, ns, "acc", non_entity))
    }

    #[test]
    fn dedupes_across_segments() {
        let mut r = SliceSegmentReader::new(vec![
            vec![c("a", "root", false), c("b", "ns1", true)],
            vec![],
            vec![c("a", "root", false), c("d", "ns1", false)],
        ]);
        let s = summarize(&mut r, &opts(true, true)).unwrap();
        assert_eq!(s.segments, 3);
        assert_eq!(s.distinct_clients.as_ref().map(BTreeSet::len), Some(3));
        let by_ns = s.by_namespace.unwrap();
        assert_eq!(
            by_ns["ns1"],
            NamespaceCounts {
                entity_clients: 1,
                non_entity_clients: 1
            }
        );
        assert_eq!(by_ns["root"].total(), 1);
        assert!(s.token_counts.is_empty());
    }

    #[test]
    fn only_requested_counters_are_kept() {
        let mut r = SliceSegmentReader::new(vec![vec![c("a", "root", false)]]);
        let s = summarize(&mut r, &opts(false, true)).unwrap();
        assert!(s.by_namespace.is_none());
        assert!(s.distinct_clients.is_some());
    }
}
