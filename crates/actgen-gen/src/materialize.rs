//! Fresh client materialization.

use crate::ids::IdSource;
use crate::month::MonthPool;
use actgen_core::request::Client;
use actgen_core::{ClientRecord, Result, SegmentIndex};
use std::sync::Arc;
use tracing::debug;

/// A client directive with its namespace and mount already resolved.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedClient<'a> {
    /// The directive as written in the request.
    pub directive: &'a Client,
    /// Namespace identifier (root default applied).
    pub namespace_id: &'a str,
    /// Accessor of the mount the clients belong to.
    pub mount_accessor: &'a str,
    /// Segment every produced record is tagged with.
    pub segment: Option<SegmentIndex>,
}

/// Materialize `directive.instances()` new records into `pool`.
///
/// Records without a fixed id draw one from `ids` per instance. Returns the
/// number of records added.
pub fn add_new_clients(
    pool: &mut MonthPool,
    c: &ResolvedClient<'_>,
    ids: &mut dyn IdSource,
) -> Result<usize> {
    let count = c.directive.instances();
    for _ in 0..count {
        let client_id = if c.directive.id.is_empty() {
            ids.next_id()?
        } else {
            c.directive.id.clone()
        };
        let record = ClientRecord::new(
            client_id,
            c.namespace_id,
            c.mount_accessor,
            c.directive.non_entity,
        );
        pool.push(Arc::new(record), c.segment);
    }
    debug!(
        count,
        namespace = c.namespace_id,
        mount = c.mount_accessor,
        segment = ?c.segment,
        non_entity = c.directive.non_entity,
        "materialized clients"
    );
    Ok(count)
}
