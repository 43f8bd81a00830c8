//! In-memory namespace and mount registry.

use crate::profile::HostProfile;
use actgen_core::host::{MountRegistry, NamespaceResolver};
use actgen_core::{MountEntry, Namespace};
use anyhow::{bail, Result};
use std::collections::BTreeMap;

/// Namespaces and mounts of an in-memory host.
///
/// The root namespace is always present. Mount paths are stored with a
/// trailing `/`.
#[derive(Clone, Debug)]
pub struct MemoryHost {
    namespaces: BTreeMap<String, Namespace>,
    mounts: Vec<MountEntry>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        let root = Namespace::root();
        Self {
            namespaces: BTreeMap::from([(root.id.clone(), root)]),
            mounts: Vec::new(),
        }
    }
}

impl MemoryHost {
    /// Host with only the root namespace and no mounts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a host from a validated profile.
    pub fn from_profile(profile: &HostProfile) -> Result<Self> {
        let mut host = Self::new();
        for ns in &profile.namespaces {
            host.add_namespace(Namespace {
                id: ns.id.clone(),
                path: ns.path.clone(),
            });
        }
        for m in &profile.mounts {
            host.add_mount(MountEntry {
                namespace_id: m.namespace.clone(),
                path: m.path.clone(),
                accessor: m.accessor.clone(),
            })?;
        }
        Ok(host)
    }

    /// Register (or replace) a namespace.
    pub fn add_namespace(&mut self, ns: Namespace) {
        self.namespaces.insert(ns.id.clone(), ns);
    }

    /// Register a mount; its namespace must already exist.
    pub fn add_mount(&mut self, mut mount: MountEntry) -> Result<()> {
        if !self.namespaces.contains_key(&mount.namespace_id) {
            bail!(
                "cannot mount {:?}: namespace {:?} does not exist",
                mount.path,
                mount.namespace_id
            );
        }
        mount.path = with_trailing_slash(&mount.path);
        self.mounts.push(mount);
        Ok(())
    }

    /// Registered namespaces, ordered by identifier.
    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> + '_ {
        self.namespaces.values()
    }

    /// Registered mounts in registration order.
    #[must_use]
    pub fn mounts(&self) -> &[MountEntry] {
        &self.mounts
    }
}

fn with_trailing_slash(path: &str) -> String {
    format!("{}/", path.trim_matches('/'))
}

impl NamespaceResolver for MemoryHost {
    fn resolve(&self, id: &str) -> Result<Option<Namespace>> {
        Ok(self.namespaces.get(id).cloned())
    }
}

impl MountRegistry for MemoryHost {
    fn list_mounts(&self) -> Result<Vec<MountEntry>> {
        Ok(self.mounts.clone())
    }

    /// Longest mount path within `namespace` that prefixes `path`.
    fn match_mount(&self, namespace: &Namespace, path: &str) -> Option<MountEntry> {
        let path = with_trailing_slash(path);
        self.mounts
            .iter()
            .filter(|m| m.namespace_id == namespace.id && path.starts_with(&m.path))
            .max_by_key(|m| m.path.len())
            .cloned()
    }
}
