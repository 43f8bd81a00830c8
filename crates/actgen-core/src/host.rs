//! Collaborator traits implemented by the host telemetry system.
//!
//! The generator only ever talks to the host through these narrow seams.
//! Implementations return `anyhow::Result` so they can surface any failure;
//! the engine wraps errors verbatim and never retries.
//!
//! ## Contracts implementors should uphold
//! - `write_entity_segment` durably persists exactly the given records under
//!   `(timestamp, sequence)` and returns an opaque identifier for it.
//! - `aggregate_segment` drains the reader it is handed; the reader is
//!   single-pass and is not reused after the call.
//! - `refresh_derived_state` only has to *initiate* the refresh; callers do
//!   not wait for completion.
//! - None of these should panic for malformed inputs; return `Err` instead.

use crate::reader::SegmentReader;
use crate::types::{MountEntry, Namespace, SharedClient};
use anyhow::Result;
use chrono::{DateTime, Utc};

/// Resolves namespace identifiers.
pub trait NamespaceResolver {
    /// Look up a namespace by identifier; `Ok(None)` when it does not exist.
    fn resolve(&self, id: &str) -> Result<Option<Namespace>>;
}

/// Lists and matches mounts.
pub trait MountRegistry {
    /// Every mount known to the host, in registration order.
    fn list_mounts(&self) -> Result<Vec<MountEntry>>;

    /// Mount within `namespace` that serves `path`, if any.
    fn match_mount(&self, namespace: &Namespace, path: &str) -> Option<MountEntry>;
}

/// Persists entity segments.
pub trait SegmentWriter {
    /// Write one segment and return its identifier.
    fn write_entity_segment(
        &mut self,
        start: DateTime<Utc>,
        sequence: u64,
        clients: &[SharedClient],
    ) -> Result<String>;
}

/// Cross-month context shared by every aggregation call of one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregationOptions {
    /// Start of the earliest populated month.
    pub active_period_start: DateTime<Utc>,
    /// Start of the latest populated month.
    pub active_period_end: DateTime<Utc>,
    /// Last second of the latest populated month.
    pub end_time: DateTime<Utc>,
    /// Build precomputed-query counters.
    pub precomputed_queries: bool,
    /// Build distinct-client counters.
    pub distinct_clients: bool,
}

/// Consumes generated segments to build summary counters.
pub trait Aggregator {
    /// Aggregate the segments of the month starting at `start`.
    fn aggregate_segment(
        &mut self,
        start: DateTime<Utc>,
        reader: &mut dyn SegmentReader,
        opts: &AggregationOptions,
    ) -> Result<()>;
}

/// Rebuilds derived state from the durable log.
pub trait RefreshTrigger {
    /// Initiate a refresh as of `now`; must not block on completion.
    fn refresh_derived_state(&mut self, now: DateTime<Utc>) -> Result<()>;
}

impl<T: NamespaceResolver + ?Sized> NamespaceResolver for &T {
    fn resolve(&self, id: &str) -> Result<Option<Namespace>> {
        (**self).resolve(id)
    }
}

impl<T: MountRegistry + ?Sized> MountRegistry for &T {
    fn list_mounts(&self) -> Result<Vec<MountEntry>> {
        (**self).list_mounts()
    }

    fn match_mount(&self, namespace: &Namespace, path: &str) -> Option<MountEntry> {
        (**self).match_mount(namespace, path)
    }
}
