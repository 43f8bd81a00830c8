//! Multi-month client generation and segment partitioning.
//!
//! This crate is the generation engine proper:
//!
//! - `ids`: identifier sources (random UUIDv4, or seeded for reproducible runs).
//! - `month`: per-month client pools and the ordered month store.
//! - `materialize` / `repeat`: turn client directives into records, either
//!   fresh or reused from another month.
//! - `partition`: convert a month's pool into a `SegmentMap`.
//! - `assemble`: walk a request month by month, resolving namespaces and mounts.
//! - `output`: drive segment writes, aggregation, and the final refresh.
//!
//! We intentionally avoid broad re-exports so callers use stable paths like
//! `actgen_gen::partition::populate_segments`.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

/// Request → month store, resolving namespaces and mounts.
pub mod assemble;
/// Identifier sources for freshly materialized clients.
pub mod ids;
/// Fresh client materialization.
pub mod materialize;
/// Per-month pools and the month store.
pub mod month;
/// Segment writes, aggregation and refresh.
pub mod output;
/// Segment partitioning of a month pool.
pub mod partition;
/// Cross-month client repetition.
pub mod repeat;

use actgen_core::host::{Aggregator, MountRegistry, NamespaceResolver, RefreshTrigger, SegmentWriter};
use actgen_core::request::ActivityLogMockInput;
use actgen_core::Result;
use chrono::{DateTime, Utc};

/// Verify, assemble and write a request in one go.
///
/// Returns the identifiers of the entity segments written, in write order.
pub fn generate<H, L>(
    input: &ActivityLogMockInput,
    host: &H,
    ids: &mut dyn ids::IdSource,
    log: &mut L,
    now: DateTime<Utc>,
) -> Result<Vec<String>>
where
    H: NamespaceResolver + MountRegistry,
    L: SegmentWriter + Aggregator + RefreshTrigger,
{
    input.verify()?;
    let store = assemble::Assembler::new(host, host, ids).assemble(input)?;
    output::write_months(&store, &input.write, log, now)
}
