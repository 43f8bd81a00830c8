//! Mock-input request schema.
//!
//! The JSON shape mirrors the host's activity-log mock input: camelCase
//! field names and SCREAMING_SNAKE_CASE write options. Every field except
//! `write` and `data` is optional.
//!
//! ```json
//! {
//!   "write": ["WRITE_ENTITIES"],
//!   "data": [
//!     { "monthsAgo": 0, "numSegments": 2,
//!       "all": { "clients": [ { "count": 3, "namespace": "ns1" } ] } }
//!   ]
//! }
//! ```
//!
//! [`ActivityLogMockInput::verify`] rejects malformed requests before any
//! processing. Policy failures that depend on generated data (too few
//! segments, insufficient repeated clients) are detected later, while the
//! offending month is being processed.

use crate::error::{Error, Result};
use crate::types::{SegmentIndex, ROOT_NAMESPACE_ID};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Largest months-ago offset a request may reference (100 years).
///
/// Applies to `monthsAgo` and to every repeat source, so the month store a
/// verified request needs stays bounded.
pub const MAX_MONTHS_AGO: u32 = 1200;

/// Output actions a request may ask for.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteOption {
    /// Persist entity segments through the segment writer.
    WriteEntities,
    /// Run the precomputed-query aggregation pass.
    WritePrecomputedQueries,
    /// Run the distinct-clients aggregation pass.
    WriteDistinctClients,
}

/// Top-level generation request.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogMockInput {
    /// Requested output actions.
    #[serde(default)]
    pub write: Vec<WriteOption>,
    /// Per-month directives.
    #[serde(default)]
    pub data: Vec<MonthData>,
}

/// One month's directive.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MonthData {
    /// Offset from the current calendar month (0 = current).
    #[serde(default)]
    pub months_ago: u32,
    /// All clients for the month, partitioned implicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all: Option<Clients>,
    /// Clients grouped into predefined segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Segments>,
    /// Indexes written as empty segments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub empty_segment_indexes: Vec<SegmentIndex>,
    /// Indexes reserved but never written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skip_segment_indexes: Vec<SegmentIndex>,
    /// Total segment count for implicit partitioning (0 = unset).
    #[serde(default)]
    pub num_segments: u32,
}

/// Borrowed view of the two month shapes.
#[derive(Clone, Copy, Debug)]
pub enum MonthClients<'a> {
    /// No explicit segmentation.
    All(&'a [Client]),
    /// Predefined segment groups.
    Segments(&'a [Segment]),
}

impl MonthData {
    /// The month's client shape, or an error if neither or both are set.
    pub fn clients(&self) -> Result<MonthClients<'_>> {
        match (&self.all, &self.segments) {
            (Some(all), None) => Ok(MonthClients::All(&all.clients)),
            (None, Some(segs)) => Ok(MonthClients::Segments(&segs.segments)),
            (None, None) => Err(Error::InvalidInput(format!(
                "month {} has neither \"all\" nor \"segments\"",
                self.months_ago
            ))),
            (Some(_), Some(_)) => Err(Error::InvalidInput(format!(
                "month {} sets both \"all\" and \"segments\"",
                self.months_ago
            ))),
        }
    }

    /// Every client directive in the month, regardless of shape.
    pub fn all_clients(&self) -> impl Iterator<Item = &Client> + '_ {
        let all = self.all.iter().flat_map(|c| c.clients.iter());
        let segs = self
            .segments
            .iter()
            .flat_map(|s| s.segments.iter())
            .flat_map(|s| s.clients.clients.iter());
        all.chain(segs)
    }

    fn verify(&self) -> Result<()> {
        let invalid = |msg: String| Error::InvalidInput(format!("month {}: {msg}", self.months_ago));
        if self.months_ago > MAX_MONTHS_AGO {
            return Err(invalid(format!(
                "\"monthsAgo\" exceeds the maximum of {MAX_MONTHS_AGO}"
            )));
        }
        let shape = self.clients()?;

        let mut reserved = BTreeSet::new();
        for (kind, indexes) in [
            ("skip", &self.skip_segment_indexes),
            ("empty", &self.empty_segment_indexes),
        ] {
            for &idx in indexes {
                if !reserved.insert(idx) {
                    return Err(invalid(format!(
                        "{kind} segment index {idx} is listed more than once"
                    )));
                }
                if self.num_segments > 0 && idx >= self.num_segments {
                    return Err(invalid(format!(
                        "{kind} segment index {idx} is out of range for {} segments",
                        self.num_segments
                    )));
                }
            }
        }

        if let MonthClients::Segments(segments) = shape {
            if self.num_segments > 0 {
                return Err(invalid(
                    "\"numSegments\" cannot be used with predefined segments".to_string(),
                ));
            }
            let mut seen = BTreeSet::new();
            for (pos, seg) in segments.iter().enumerate() {
                let idx = seg.index_or(pos)?;
                if !seen.insert(idx) {
                    return Err(invalid(format!("segment index {idx} is used more than once")));
                }
            }
        }

        for c in self.all_clients() {
            c.verify(self.months_ago).map_err(|e| match e {
                Error::InvalidInput(msg) => invalid(msg),
                other => other,
            })?;
        }
        Ok(())
    }
}

/// List of client directives.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Clients {
    /// Directives in order.
    #[serde(default)]
    pub clients: Vec<Client>,
}

/// List of predefined segments.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segments {
    /// Segment groups in order.
    #[serde(default)]
    pub segments: Vec<Segment>,
}

/// One predefined segment group.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Explicit index; defaults to the group's position in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<SegmentIndex>,
    /// Clients tagged with this segment.
    #[serde(default)]
    pub clients: Clients,
}

impl Segment {
    /// Explicit index, or `position` when unset.
    pub fn index_or(&self, position: usize) -> Result<SegmentIndex> {
        match self.segment_index {
            Some(i) => Ok(i),
            None => SegmentIndex::try_from(position).map_err(|_| {
                Error::InvalidInput(format!("segment position {position} out of range"))
            }),
        }
    }
}

/// One client directive.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Fixed identifier; a fresh one is generated per instance when empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Number of instances (0 and 1 both mean one).
    #[serde(default)]
    pub count: u32,
    /// Reuse clients from the month immediately older.
    #[serde(default)]
    pub repeated: bool,
    /// Reuse clients from this months-ago offset (0 = unset).
    #[serde(default)]
    pub repeated_from_month: u32,
    /// Namespace identifier (root when empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    /// Mount path within the namespace (discovered when empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub mount: String,
    /// Token-based client rather than entity-backed.
    #[serde(default)]
    pub non_entity: bool,
}

impl Client {
    /// Number of instances this directive stands for.
    #[inline]
    #[must_use]
    pub fn instances(&self) -> usize {
        self.count.max(1) as usize
    }

    /// Whether the directive reuses clients from another month.
    #[inline]
    #[must_use]
    pub const fn is_repeat(&self) -> bool {
        self.repeated || self.repeated_from_month > 0
    }

    /// Namespace identifier with the root default applied.
    #[must_use]
    pub fn namespace_or_root(&self) -> &str {
        if self.namespace.is_empty() {
            ROOT_NAMESPACE_ID
        } else {
            &self.namespace
        }
    }

    /// Months-ago offset clients are repeated from, if this is a repeat.
    #[must_use]
    pub fn repeat_source(&self, months_ago: u32) -> Option<u32> {
        if self.repeated_from_month > 0 {
            Some(self.repeated_from_month)
        } else if self.repeated {
            Some(months_ago.saturating_add(1))
        } else {
            None
        }
    }

    fn verify(&self, months_ago: u32) -> Result<()> {
        if self.repeated && self.repeated_from_month > 0 {
            return Err(Error::InvalidInput(
                "client cannot set both \"repeated\" and \"repeatedFromMonth\"".to_string(),
            ));
        }
        if self.repeated_from_month > 0 && self.repeated_from_month == months_ago {
            return Err(Error::InvalidInput(format!(
                "client cannot repeat from its own month {months_ago}"
            )));
        }
        if let Some(from) = self.repeat_source(months_ago) {
            if from > MAX_MONTHS_AGO {
                return Err(Error::InvalidInput(format!(
                    "client repeats from month {from}, beyond the maximum of {MAX_MONTHS_AGO}"
                )));
            }
        }
        if self.is_repeat() && !self.id.is_empty() {
            return Err(Error::InvalidInput(format!(
                "repeated client cannot set an id (got {:?})",
                self.id
            )));
        }
        Ok(())
    }
}

impl ActivityLogMockInput {
    /// Reject requests that cannot be processed.
    pub fn verify(&self) -> Result<()> {
        if self.write.is_empty() {
            return Err(Error::InvalidInput(
                "missing required \"write\" values".to_string(),
            ));
        }
        if self.data.is_empty() {
            return Err(Error::InvalidInput(
                "missing required \"data\" values".to_string(),
            ));
        }
        let mut months = BTreeSet::new();
        for month in &self.data {
            if !months.insert(month.months_ago) {
                return Err(Error::InvalidInput(format!(
                    "month {} is listed more than once",
                    month.months_ago
                )));
            }
            month.verify()?;
        }
        Ok(())
    }

    /// Largest months-ago offset referenced anywhere, including repeat sources.
    #[must_use]
    pub fn max_months_ago(&self) -> u32 {
        self.data
            .iter()
            .flat_map(|m| {
                std::iter::once(m.months_ago)
                    .chain(m.all_clients().filter_map(|c| c.repeat_source(m.months_ago)))
            })
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ActivityLogMockInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parses_wire_shape() {
        let input = parse(
            r#"{
                "write": ["WRITE_ENTITIES", "WRITE_DISTINCT_CLIENTS"],
                "data": [
                    {"monthsAgo": 1, "numSegments": 3, "skipSegmentIndexes": [1],
                     "all": {"clients": [{"count": 4, "namespace": "ns1", "nonEntity": true}]}},
                    {"monthsAgo": 0,
                     "segments": {"segments": [{"segmentIndex": 2, "clients": {"clients": [{"repeated": true}]}}]}}
                ]
            }"#,
        );
        input.verify().unwrap();
        assert_eq!(
            input.write,
            vec![WriteOption::WriteEntities, WriteOption::WriteDistinctClients]
        );
        assert_eq!(input.data[0].num_segments, 3);
        let c = &input.data[0].all.as_ref().unwrap().clients[0];
        assert_eq!(c.instances(), 4);
        assert!(c.non_entity);
        assert_eq!(
            input.data[1].segments.as_ref().unwrap().segments[0].segment_index,
            Some(2)
        );
    }

    #[test]
    fn rejects_missing_write_and_data() {
        let e = parse(r#"{"data": [{"all": {"clients": []}}]}"#).verify().unwrap_err();
        assert!(e.to_string().contains("\"write\""));
        let e = parse(r#"{"write": ["WRITE_ENTITIES"]}"#).verify().unwrap_err();
        assert!(e.to_string().contains("\"data\""));
    }

    #[test]
    fn rejects_month_without_or_with_both_shapes() {
        let e = parse(r#"{"write": ["WRITE_ENTITIES"], "data": [{"monthsAgo": 2}]}"#)
            .verify()
            .unwrap_err();
        assert!(e.to_string().contains("neither"));
        let e = parse(
            r#"{"write": ["WRITE_ENTITIES"], "data": [{"all": {}, "segments": {}}]}"#,
        )
        .verify()
        .unwrap_err();
        assert!(e.to_string().contains("both"));
    }

    #[test]
    fn rejects_duplicate_months() {
        let e = parse(
            r#"{"write": ["WRITE_ENTITIES"], "data": [{"all": {}}, {"monthsAgo": 0, "all": {}}]}"#,
        )
        .verify()
        .unwrap_err();
        assert!(e.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_overlapping_or_out_of_range_indexes() {
        let overlap = parse(
            r#"{"write": ["WRITE_ENTITIES"], "data": [{"all": {}, "numSegments": 4,
                "skipSegmentIndexes": [1], "emptySegmentIndexes": [1]}]}"#,
        );
        assert!(matches!(overlap.verify(), Err(Error::InvalidInput(_))));
        let range = parse(
            r#"{"write": ["WRITE_ENTITIES"], "data": [{"all": {}, "numSegments": 2,
                "emptySegmentIndexes": [2]}]}"#,
        );
        assert!(range.verify().unwrap_err().to_string().contains("out of range"));
    }

    #[test]
    fn too_few_segments_is_not_a_verification_error() {
        let input = parse(
            r#"{"write": ["WRITE_ENTITIES"], "data": [{"all": {"clients": [{}]},
                "numSegments": 1, "skipSegmentIndexes": [0]}]}"#,
        );
        input.verify().unwrap();
    }

    #[test]
    fn rejects_duplicate_predefined_segments() {
        // Position 1 defaults to index 1, colliding with the explicit index.
        let input = parse(
            r#"{"write": ["WRITE_ENTITIES"], "data": [{"segments": {"segments": [
                {"segmentIndex": 1, "clients": {"clients": [{}]}},
                {"clients": {"clients": [{}]}}
            ]}}]}"#,
        );
        assert!(input.verify().unwrap_err().to_string().contains("segment index 1"));
    }

    #[test]
    fn rejects_bad_repeat_directives() {
        for client in [
            r#"{"repeated": true, "repeatedFromMonth": 2}"#,
            r#"{"repeatedFromMonth": 1}"#,
            r#"{"repeated": true, "id": "fixed"}"#,
        ] {
            let json = format!(
                r#"{{"write": ["WRITE_ENTITIES"], "data": [{{"monthsAgo": 1, "all": {{"clients": [{client}]}}}}]}}"#
            );
            assert!(
                matches!(parse(&json).verify(), Err(Error::InvalidInput(_))),
                "{client} should be rejected"
            );
        }
    }

    #[test]
    fn max_months_ago_includes_repeat_sources() {
        let input = parse(
            r#"{"write": ["WRITE_ENTITIES"], "data": [
                {"monthsAgo": 1, "all": {"clients": [{"repeated": true}]}},
                {"monthsAgo": 0, "all": {"clients": [{"repeatedFromMonth": 5}]}}
            ]}"#,
        );
        assert_eq!(input.max_months_ago(), 5);
        let plain = parse(r#"{"write": ["WRITE_ENTITIES"], "data": [{"monthsAgo": 3, "all": {}}]}"#);
        assert_eq!(plain.max_months_ago(), 3);
    }

    #[test]
    fn rejects_month_offsets_beyond_the_cap() {
        let month = |months_ago: u32, client: &str| {
            format!(
                r#"{{"write": ["WRITE_ENTITIES"], "data": [{{"monthsAgo": {months_ago}, "all": {{"clients": [{client}]}}}}]}}"#
            )
        };

        let huge_source = parse(&month(0, r#"{"repeatedFromMonth": 4000000000}"#));
        let e = huge_source.verify().unwrap_err();
        assert!(matches!(e, Error::InvalidInput(_)));
        assert!(e.to_string().contains("4000000000"));

        let e = parse(&month(MAX_MONTHS_AGO + 1, "{}")).verify().unwrap_err();
        assert!(e.to_string().contains("\"monthsAgo\""));

        // "repeated" reaches one month further back than its own month.
        let e = parse(&month(MAX_MONTHS_AGO, r#"{"repeated": true}"#))
            .verify()
            .unwrap_err();
        assert!(e.to_string().contains("beyond the maximum"));

        let edge = parse(&month(1, &format!(r#"{{"repeatedFromMonth": {MAX_MONTHS_AGO}}}"#)));
        edge.verify().unwrap();
        assert_eq!(edge.max_months_ago(), MAX_MONTHS_AGO);
    }
}
