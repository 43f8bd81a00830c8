//! Cross-month client repetition.
//!
//! A repeated directive does not create records. It selects, in the source
//! month's insertion order, the first records whose non-entity flag, mount
//! accessor and namespace match the directive exactly, and appends the same
//! `Arc`s to the target month.

use crate::materialize::ResolvedClient;
use crate::month::MonthStore;
use actgen_core::{Error, Result, SharedClient};
use std::sync::Arc;
use tracing::debug;

/// Records in `source` matching `c`, first `limit` in insertion order.
#[must_use]
pub fn matching_clients(
    source: &[SharedClient],
    c: &ResolvedClient<'_>,
    limit: usize,
) -> Vec<SharedClient> {
    source
        .iter()
        .filter(|r| {
            r.non_entity == c.directive.non_entity
                && r.mount_accessor == c.mount_accessor
                && r.namespace_id == c.namespace_id
        })
        .take(limit)
        .map(Arc::clone)
        .collect()
}

/// Append repeated clients from the directive's source month to `months_ago`.
///
/// Fails with [`Error::MissingRepeated`] naming the shortfall when the source
/// month has fewer matches than requested; nothing is appended in that case.
pub fn add_repeated_clients(
    store: &mut MonthStore,
    months_ago: u32,
    c: &ResolvedClient<'_>,
) -> Result<usize> {
    let wanted = c.directive.instances();
    let from = c
        .directive
        .repeat_source(months_ago)
        .unwrap_or(months_ago.saturating_add(1));
    let picked = store
        .get(from)
        .map(|m| matching_clients(m.clients(), c, wanted))
        .unwrap_or_default();

    if picked.len() < wanted {
        return Err(Error::MissingRepeated {
            missing: wanted - picked.len(),
        });
    }

    let target = store.get_mut(months_ago).ok_or_else(|| {
        Error::InvalidInput(format!("month {months_ago} is outside the month store"))
    })?;
    for record in picked {
        target.push(record, c.segment);
    }
    debug!(
        count = wanted,
        from,
        to = months_ago,
        namespace = c.namespace_id,
        mount = c.mount_accessor,
        "repeated clients"
    );
    Ok(wanted)
}
