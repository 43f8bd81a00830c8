//! Output stage: segment writes, aggregation, refresh.
//!
//! Months are visited in ascending months-ago order and segments in ascending
//! index order. Each populated month is stamped with the start of its
//! calendar month relative to `now`.
//!
//! - With [`WriteOption::WriteEntities`], every non-skipped slot (empty ones
//!   included) is written with its index as the sequence number, and the
//!   returned identifiers are collected in write order.
//! - With precomputed-query or distinct-client output, every slot of the
//!   month (skipped and empty ones as empty lists) is handed to the
//!   aggregator through a [`SliceSegmentReader`], along with an [`AggregationOptions`] covering
//!   the whole request.
//!
//! A single refresh is initiated once every month has been handled. There is
//! no rollback: a failure leaves earlier writes in place.

use crate::month::MonthStore;
use crate::partition::populate_segments;
use actgen_core::host::{AggregationOptions, Aggregator, RefreshTrigger, SegmentWriter};
use actgen_core::request::WriteOption;
use actgen_core::timeutil::{end_of_month, start_of_month, start_of_months_ago};
use actgen_core::{Error, Result, SegmentIndex, SegmentMap, SliceSegmentReader};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Segment layout of one month, without writing anything.
#[derive(Clone, Debug)]
pub struct MonthLayout {
    /// Months-ago offset.
    pub months_ago: u32,
    /// Start of the month.
    pub start: DateTime<Utc>,
    /// Partitioned segments.
    pub segments: SegmentMap,
}

/// Partition every populated month, newest first.
pub fn layout(store: &MonthStore, now: DateTime<Utc>) -> Result<Vec<MonthLayout>> {
    let now = start_of_month(now);
    store
        .populated()
        .map(|(months_ago, pool)| {
            let segments = populate_segments(pool).map_err(|e| e.in_month(months_ago))?;
            Ok(MonthLayout {
                months_ago,
                start: start_of_months_ago(months_ago, now)?,
                segments,
            })
        })
        .collect()
}

/// Aggregation context spanning every populated month of `store`.
pub fn aggregation_options(
    store: &MonthStore,
    write: &[WriteOption],
    now: DateTime<Utc>,
) -> Result<Option<AggregationOptions>> {
    let precomputed_queries = write.contains(&WriteOption::WritePrecomputedQueries);
    let distinct_clients = write.contains(&WriteOption::WriteDistinctClients);
    if !(precomputed_queries || distinct_clients) {
        return Ok(None);
    }
    let (Some(latest), Some(earliest)) = (store.latest_populated(), store.earliest_populated())
    else {
        return Ok(None);
    };
    let active_period_end = start_of_months_ago(latest, now)?;
    Ok(Some(AggregationOptions {
        active_period_start: start_of_months_ago(earliest, now)?,
        active_period_end,
        end_time: end_of_month(active_period_end)?,
        precomputed_queries,
        distinct_clients,
    }))
}

/// Write every populated month of `store` through `log`.
///
/// Returns the identifiers of written entity segments, in write order.
pub fn write_months<L>(
    store: &MonthStore,
    write: &[WriteOption],
    log: &mut L,
    now: DateTime<Utc>,
) -> Result<Vec<String>>
where
    L: SegmentWriter + Aggregator + RefreshTrigger,
{
    let now = start_of_month(now);
    let write_entities = write.contains(&WriteOption::WriteEntities);
    let agg_opts = aggregation_options(store, write, now)?;
    let mut paths = Vec::new();

    for (months_ago, pool) in store.populated() {
        let start = start_of_months_ago(months_ago, now)?;
        let segments = populate_segments(pool).map_err(|e| e.in_month(months_ago))?;

        if write_entities {
            let written = write_entity_segments(log, start, &segments, &mut paths)?;
            info!(months_ago, %start, segments = written, "wrote entity segments");
        }

        if let Some(opts) = &agg_opts {
            let mut reader = SliceSegmentReader::from_segment_map(&segments);
            log.aggregate_segment(start, &mut reader, opts)
                .map_err(|e| Error::collaborator("aggregate segment", e))?;
            debug!(months_ago, %start, "aggregated month");
        }
    }

    log.refresh_derived_state(now)
        .map_err(|e| Error::collaborator("refresh derived state", e))?;
    info!(paths = paths.len(), "activity data written");
    Ok(paths)
}

fn write_entity_segments<W: SegmentWriter + ?Sized>(
    writer: &mut W,
    start: DateTime<Utc>,
    segments: &SegmentMap,
    paths: &mut Vec<String>,
) -> Result<usize> {
    let mut written = 0;
    for (&index, slot) in segments {
        let Some(clients) = slot.clients() else {
            debug!(segment = index, "skipping reserved segment");
            continue;
        };
        let path = writer
            .write_entity_segment(start, sequence(index), clients)
            .map_err(|e| Error::collaborator("write entity segment", e))?;
        debug!(segment = index, clients = clients.len(), %path, "wrote segment");
        paths.push(path);
        written += 1;
    }
    Ok(written)
}

const fn sequence(index: SegmentIndex) -> u64 {
    index as u64
}
