//! In-memory host for the actgen generator.
//!
//! - [`MemoryHost`] resolves namespaces and matches mounts (longest prefix
//!   within the namespace).
//! - [`SegmentLog`] stores written entity segments, optionally mirrored to
//!   disk, aggregates months into counters, and rebuilds current-month
//!   counts on a detached thread when a refresh is triggered.
//! - [`HostProfile`] is the TOML configuration both are built from.

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

/// Distinct-client and per-namespace counters.
pub mod aggregate;
/// Segment store, aggregator and refresh trigger.
pub mod log;
/// TOML host profile.
pub mod profile;
/// Derived current-month counts.
pub mod refresh;
/// Namespace and mount registry.
pub mod registry;

pub use aggregate::{MonthSummary, NamespaceCounts};
pub use log::{segment_id, Mirror, SegmentLog};
pub use profile::{HostProfile, SegmentFormat};
pub use refresh::CurrentMonthCounts;
pub use registry::MemoryHost;

use anyhow::Result;
use std::path::Path;

/// Registry and log built from `profile`.
///
/// `out_dir` overrides the profile's mirror directory.
pub fn host_from_profile(
    profile: &HostProfile,
    out_dir: Option<&Path>,
) -> Result<(MemoryHost, SegmentLog)> {
    let host = MemoryHost::from_profile(profile)?;
    let log = match out_dir.or(profile.out_dir.as_deref()) {
        Some(dir) => SegmentLog::with_mirror(dir, profile.format),
        None => SegmentLog::new(),
    };
    Ok((host, log))
}
