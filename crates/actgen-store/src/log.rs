//! In-memory segment log.
//!
//! [`SegmentLog`] plays every write-side role the generator needs from a
//! host: it persists entity segments keyed by `(month start, sequence)`,
//! aggregates months into [`MonthSummary`] counters, and rebuilds the
//! current month's derived counts on a background thread.
//!
//! Segments can be mirrored to disk, one file per segment at
//! `<dir>/entity/<unix_ts>/<seq>.<ext>`.

use crate::aggregate::{summarize, MonthSummary};
use crate::profile::SegmentFormat;
use crate::refresh::{current_month_counts, CurrentMonthCounts};
use actgen_core::host::{AggregationOptions, Aggregator, RefreshTrigger, SegmentWriter};
use actgen_core::io::{ensure_parent_dir, write_segment_auto};
use actgen_core::{EntitySegment, SegmentReader, SharedClient, SliceSegmentReader};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// Identifier returned for a written segment.
#[must_use]
pub fn segment_id(start_timestamp: i64, sequence: u64) -> String {
    format!("log/entity/{start_timestamp}/{sequence}")
}

/// On-disk mirror of written segments.
#[derive(Clone, Debug)]
pub struct Mirror {
    /// Root directory.
    pub dir: PathBuf,
    /// Segment file encoding.
    pub format: SegmentFormat,
}

impl Mirror {
    /// File a segment is mirrored to.
    #[must_use]
    pub fn path_for(&self, start_timestamp: i64, sequence: u64) -> PathBuf {
        self.dir
            .join("entity")
            .join(start_timestamp.to_string())
            .join(format!("{sequence}.{}", self.format.extension()))
    }
}

/// Segment store, aggregator and refresh trigger of the in-memory host.
#[derive(Debug, Default)]
pub struct SegmentLog {
    segments: BTreeMap<(i64, u64), EntitySegment>,
    mirror: Option<Mirror>,
    summaries: BTreeMap<i64, MonthSummary>,
    period: Option<AggregationOptions>,
    pending_refresh: Option<JoinHandle<CurrentMonthCounts>>,
    refreshed: Option<CurrentMonthCounts>,
}

impl SegmentLog {
    /// Empty log without a disk mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty log mirroring every write under `dir`.
    #[must_use]
    pub fn with_mirror(dir: impl AsRef<Path>, format: SegmentFormat) -> Self {
        Self {
            mirror: Some(Mirror {
                dir: dir.as_ref().to_path_buf(),
                format,
            }),
            ..Self::default()
        }
    }

    /// Disk mirror, if configured.
    #[must_use]
    pub const fn mirror(&self) -> Option<&Mirror> {
        self.mirror.as_ref()
    }

    /// Number of stored segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments, ordered by month start then sequence.
    pub fn segments(&self) -> impl Iterator<Item = &EntitySegment> + '_ {
        self.segments.values()
    }

    /// One stored segment.
    #[must_use]
    pub fn segment(&self, start_timestamp: i64, sequence: u64) -> Option<&EntitySegment> {
        self.segments.get(&(start_timestamp, sequence))
    }

    /// Segments of the month starting at `start_timestamp`, by sequence.
    pub fn month_segments(
        &self,
        start_timestamp: i64,
    ) -> impl Iterator<Item = &EntitySegment> + '_ {
        self.segments
            .range((start_timestamp, 0)..=(start_timestamp, u64::MAX))
            .map(|(_, s)| s)
    }

    /// Reader over the stored segments of one month.
    #[must_use]
    pub fn month_reader(&self, start_timestamp: i64) -> SliceSegmentReader {
        SliceSegmentReader::new(
            self.month_segments(start_timestamp)
                .map(|s| s.clients.clone())
                .collect(),
        )
    }

    /// Counters built for the month starting at `start_timestamp`.
    #[must_use]
    pub fn summary(&self, start_timestamp: i64) -> Option<&MonthSummary> {
        self.summaries.get(&start_timestamp)
    }

    /// Aggregation context of the most recent aggregation call.
    #[must_use]
    pub const fn aggregation_period(&self) -> Option<&AggregationOptions> {
        self.period.as_ref()
    }

    /// Whether a refresh has been started and not yet collected.
    #[must_use]
    pub const fn refresh_pending(&self) -> bool {
        self.pending_refresh.is_some()
    }

    /// Most recently collected refresh result.
    #[must_use]
    pub const fn current_counts(&self) -> Option<&CurrentMonthCounts> {
        self.refreshed.as_ref()
    }

    /// Block until the outstanding refresh (if any) finishes.
    pub fn wait_for_refresh(&mut self) -> Result<Option<&CurrentMonthCounts>> {
        if let Some(handle) = self.pending_refresh.take() {
            let counts = handle
                .join()
                .map_err(|_| anyhow!("refresh thread panicked"))?;
            self.refreshed = Some(counts);
        }
        Ok(self.refreshed.as_ref())
    }
}

impl SegmentWriter for SegmentLog {
    fn write_entity_segment(
        &mut self,
        start: DateTime<Utc>,
        sequence: u64,
        clients: &[SharedClient],
    ) -> Result<String> {
        let ts = start.timestamp();
        let segment = EntitySegment {
            start_timestamp: ts,
            sequence,
            clients: clients.to_vec(),
        };

        if let Some(mirror) = &self.mirror {
            let path = mirror.path_for(ts, sequence);
            ensure_parent_dir(&path)?;
            write_segment_auto(&path, &segment)
                .with_context(|| format!("mirror segment to {}", path.display()))?;
            debug!(path = %path.display(), "mirrored segment");
        }

        if self.segments.insert((ts, sequence), segment).is_some() {
            warn!(start = ts, sequence, "replaced existing segment");
        }
        Ok(segment_id(ts, sequence))
    }
}

impl Aggregator for SegmentLog {
    fn aggregate_segment(
        &mut self,
        start: DateTime<Utc>,
        reader: &mut dyn SegmentReader,
        opts: &AggregationOptions,
    ) -> Result<()> {
        let summary = summarize(reader, opts)?;
        debug!(
            start = start.timestamp(),
            segments = summary.segments,
            distinct = summary.distinct_clients.as_ref().map(|d| d.len()),
            "aggregated month"
        );
        self.summaries.insert(start.timestamp(), summary);
        self.period = Some(opts.clone());
        Ok(())
    }
}

impl RefreshTrigger for SegmentLog {
    /// Snapshot the current month and count it on a background thread.
    ///
    /// A refresh that is still running when a new one starts is detached and
    /// its result discarded.
    fn refresh_derived_state(&mut self, now: DateTime<Utc>) -> Result<()> {
        let ts = now.timestamp();
        let snapshot: Vec<EntitySegment> = self.month_segments(ts).cloned().collect();
        info!(start = ts, segments = snapshot.len(), "starting refresh");

        let handle = thread::Builder::new()
            .name("actgen-refresh".into())
            .spawn(move || current_month_counts(ts, &snapshot))
            .context("spawn refresh thread")?;
        self.pending_refresh = Some(handle);
        Ok(())
    }
}
