//! Per-month client pools.
//!
//! A [`MonthPool`] keeps clients in the order they were added; positions are
//! dense and 0-based. Clients added with a segment tag are also recorded in
//! the pool's predefined-segment map (segment index → positions), which
//! switches partitioning to the explicit path.
//!
//! [`MonthStore`] holds one pool per month, index 0 being the current month
//! and index N being N months ago.

use actgen_core::request::MonthData;
use actgen_core::{SegmentIndex, SharedClient};
use std::collections::BTreeMap;

/// One month's generated clients.
#[derive(Clone, Debug, Default)]
pub struct MonthPool {
    clients: Vec<SharedClient>,
    predefined: BTreeMap<SegmentIndex, Vec<usize>>,
    params: Option<MonthData>,
}

impl MonthPool {
    /// Append a client, tagging it with `segment` if given.
    pub fn push(&mut self, client: SharedClient, segment: Option<SegmentIndex>) {
        self.clients.push(client);
        if let Some(idx) = segment {
            let pos = self.clients.len() - 1;
            self.predefined.entry(idx).or_default().push(pos);
        }
    }

    /// Clients in insertion order.
    #[must_use]
    pub fn clients(&self) -> &[SharedClient] {
        &self.clients
    }

    /// Explicit segment assignments (segment index → client positions).
    #[must_use]
    pub const fn predefined_segments(&self) -> &BTreeMap<SegmentIndex, Vec<usize>> {
        &self.predefined
    }

    /// Directive that populated this month, if any.
    #[must_use]
    pub const fn params(&self) -> Option<&MonthData> {
        self.params.as_ref()
    }

    /// Record the directive driving this month.
    pub fn set_params(&mut self, params: MonthData) {
        self.params = Some(params);
    }

    /// Whether the month takes part in output.
    #[must_use]
    pub const fn is_populated(&self) -> bool {
        self.params.is_some()
    }

    /// Number of clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the pool has no clients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Pools for months `0..=max_months_ago`.
#[derive(Clone, Debug, Default)]
pub struct MonthStore {
    months: Vec<MonthPool>,
}

impl MonthStore {
    /// Store with `n` empty months.
    #[must_use]
    pub fn with_months(n: usize) -> Self {
        Self {
            months: vec![MonthPool::default(); n],
        }
    }

    /// Number of months allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.months.len()
    }

    /// Whether no months are allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.months.is_empty()
    }

    /// Pool for `months_ago`.
    #[must_use]
    pub fn get(&self, months_ago: u32) -> Option<&MonthPool> {
        self.months.get(months_ago as usize)
    }

    /// Mutable pool for `months_ago`.
    pub fn get_mut(&mut self, months_ago: u32) -> Option<&mut MonthPool> {
        self.months.get_mut(months_ago as usize)
    }

    /// Populated months, ascending by months-ago.
    pub fn populated(&self) -> impl Iterator<Item = (u32, &MonthPool)> + '_ {
        (0u32..)
            .zip(self.months.iter())
            .filter(|(_, m)| m.is_populated())
    }

    /// Most recent populated month (smallest months-ago).
    #[must_use]
    pub fn latest_populated(&self) -> Option<u32> {
        self.populated().map(|(i, _)| i).next()
    }

    /// Oldest populated month (largest months-ago).
    #[must_use]
    pub fn earliest_populated(&self) -> Option<u32> {
        self.populated().map(|(i, _)| i).last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actgen_core::ClientRecord;
    use std::sync::Arc;

    #[test]
    fn push_records_positions_for_tagged_clients() {
        let mut pool = MonthPool::default();
        let c = |id: &str| Arc::new(ClientRecord::new(id, "root", "acc", false));
        pool.push(c("a"), None);
        pool.push(c("b"), Some(4));
        pool.push(c("c"), Some(4));
        pool.push(c("d"), Some(0));
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.predefined_segments()[&4], vec![1, 2]);
        assert_eq!(pool.predefined_segments()[&0], vec![3]);
    }

    #[test]
    fn populated_bounds() {
        let mut store = MonthStore::with_months(5);
        assert!(store.latest_populated().is_none());
        store.get_mut(3).unwrap().set_params(MonthData::default());
        store.get_mut(1).unwrap().set_params(MonthData::default());
        assert_eq!(store.latest_populated(), Some(1));
        assert_eq!(store.earliest_populated(), Some(3));
        assert_eq!(store.populated().count(), 2);
        assert!(store.get(5).is_none());
    }
}
