//! Request → [`MonthStore`].
//!
//! Months are processed in request order. For each client directive the
//! assembler resolves the namespace (root when unset) and a mount accessor,
//! then hands the directive to the materializer or the repetition resolver.
//!
//! Mount accessor selection:
//! 1. an explicit `mount` path must match a mount inside the directive's
//!    namespace; that mount's accessor is used;
//! 2. otherwise the root namespace uses the first root mount the registry
//!    lists;
//! 3. otherwise the first mount registered in the directive's namespace.
//!
//! Any failure aborts the whole request, tagged with the month it occurred in.

use crate::ids::IdSource;
use crate::materialize::{add_new_clients, ResolvedClient};
use crate::month::MonthStore;
use crate::repeat::add_repeated_clients;
use actgen_core::host::{MountRegistry, NamespaceResolver};
use actgen_core::request::{
    ActivityLogMockInput, Client, MonthClients, MonthData, MAX_MONTHS_AGO,
};
use actgen_core::{Error, MountEntry, Namespace, Result, SegmentIndex, ROOT_NAMESPACE_ID};
use tracing::{debug, info};

/// Walks a request and fills a [`MonthStore`].
pub struct Assembler<'a> {
    namespaces: &'a dyn NamespaceResolver,
    mounts: &'a dyn MountRegistry,
    ids: &'a mut dyn IdSource,
}

impl<'a> Assembler<'a> {
    /// Assembler resolving through the given collaborators.
    pub fn new(
        namespaces: &'a dyn NamespaceResolver,
        mounts: &'a dyn MountRegistry,
        ids: &'a mut dyn IdSource,
    ) -> Self {
        Self {
            namespaces,
            mounts,
            ids,
        }
    }

    /// Build pools for every month the request references.
    ///
    /// The request is expected to have passed
    /// [`ActivityLogMockInput::verify`]; offsets beyond [`MAX_MONTHS_AGO`]
    /// are rejected here as well.
    pub fn assemble(&mut self, input: &ActivityLogMockInput) -> Result<MonthStore> {
        let max = input.max_months_ago();
        if max > MAX_MONTHS_AGO {
            return Err(Error::InvalidInput(format!(
                "request references month {max}, beyond the maximum of {MAX_MONTHS_AGO}"
            )));
        }
        let mut store = MonthStore::with_months(max as usize + 1);
        for month in &input.data {
            self.process_month(&mut store, month)
                .map_err(|e| e.in_month(month.months_ago))?;
        }
        Ok(store)
    }

    /// Populate one month of `store` from its directive.
    pub fn process_month(&mut self, store: &mut MonthStore, month: &MonthData) -> Result<()> {
        let mounts = self
            .mounts
            .list_mounts()
            .map_err(|e| Error::collaborator("list mounts", e))?;
        let default_root_mount = mounts
            .iter()
            .find(|m| m.namespace_id == ROOT_NAMESPACE_ID)
            .map(|m| m.accessor.clone());

        let pool = store.get_mut(month.months_ago).ok_or_else(|| {
            Error::InvalidInput(format!(
                "month {} is outside the month store",
                month.months_ago
            ))
        })?;
        pool.set_params(month.clone());

        let mut added = 0usize;
        match month.clients()? {
            MonthClients::All(clients) => {
                for c in clients {
                    added += self.add_client(
                        store,
                        month.months_ago,
                        c,
                        &mounts,
                        default_root_mount.as_deref(),
                        None,
                    )?;
                }
            }
            MonthClients::Segments(segments) => {
                for (pos, seg) in segments.iter().enumerate() {
                    let index = seg.index_or(pos)?;
                    for c in &seg.clients.clients {
                        added += self.add_client(
                            store,
                            month.months_ago,
                            c,
                            &mounts,
                            default_root_mount.as_deref(),
                            Some(index),
                        )?;
                    }
                }
            }
        }
        info!(months_ago = month.months_ago, clients = added, "processed month");
        Ok(())
    }

    fn add_client(
        &mut self,
        store: &mut MonthStore,
        months_ago: u32,
        c: &Client,
        mounts: &[MountEntry],
        default_root_mount: Option<&str>,
        segment: Option<SegmentIndex>,
    ) -> Result<usize> {
        let namespace_id = c.namespace_or_root();
        let ns = self
            .namespaces
            .resolve(namespace_id)
            .map_err(|e| Error::collaborator("resolve namespace", e))?
            .ok_or_else(|| Error::NamespaceNotFound(namespace_id.to_string()))?;
        let mount_accessor = self.mount_accessor(&ns, c, mounts, default_root_mount)?;
        debug!(
            months_ago,
            namespace = %ns.id,
            mount = %mount_accessor,
            repeat = c.is_repeat(),
            "resolved client directive"
        );

        let rc = ResolvedClient {
            directive: c,
            namespace_id: &ns.id,
            mount_accessor: &mount_accessor,
            segment,
        };
        if c.is_repeat() {
            add_repeated_clients(store, months_ago, &rc)
        } else {
            let pool = store.get_mut(months_ago).ok_or_else(|| {
                Error::InvalidInput(format!("month {months_ago} is outside the month store"))
            })?;
            add_new_clients(pool, &rc, &mut *self.ids)
        }
    }

    fn mount_accessor(
        &self,
        ns: &Namespace,
        c: &Client,
        mounts: &[MountEntry],
        default_root_mount: Option<&str>,
    ) -> Result<String> {
        let not_found = || Error::MountNotFound {
            namespace: ns.id.clone(),
        };
        if !c.mount.is_empty() {
            return self
                .mounts
                .match_mount(ns, &c.mount)
                .map(|m| m.accessor)
                .ok_or_else(not_found);
        }
        if ns.is_root() {
            return default_root_mount.map(str::to_string).ok_or_else(not_found);
        }
        mounts
            .iter()
            .find(|m| m.namespace_id == ns.id)
            .map(|m| m.accessor.clone())
            .ok_or_else(not_found)
    }
}
