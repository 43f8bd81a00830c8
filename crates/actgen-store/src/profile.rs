//! TOML host profile.
//!
//! A profile describes the host the generator runs against: the namespaces
//! and mounts it knows about, an optional identifier seed, and where written
//! segments are mirrored on disk.
//!
//! ```toml
//! seed = 7
//! out_dir = "out/segments"
//! format = "cbor"
//!
//! [[namespaces]]
//! id = "ns1"
//! path = "ns1/"
//!
//! [[mounts]]
//! namespace = "ns1"
//! path = "auth/userpass/"
//! accessor = "auth_userpass_ns1"
//! ```
//!
//! The root namespace always exists and is never listed. A profile without
//! a `mounts` table gets a single root token mount.

use actgen_core::ROOT_NAMESPACE_ID;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Accessor of the default root token mount.
pub const DEFAULT_TOKEN_ACCESSOR: &str = "auth_token_root";

/// On-disk encoding of mirrored segments.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SegmentFormat {
    /// One JSON document per segment.
    #[default]
    Json,
    /// One CBOR document per segment.
    Cbor,
}

impl SegmentFormat {
    /// File extension understood by `actgen_core::io`.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Cbor => "cbor",
        }
    }
}

/// A non-root namespace.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct NamespaceConfig {
    /// Namespace identifier.
    pub id: String,
    /// Namespace path, e.g. `"ns1/"`.
    pub path: String,
}

/// An auth mount.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct MountConfig {
    /// Owning namespace identifier.
    #[serde(default = "root_id")]
    pub namespace: String,
    /// Mount path relative to the namespace, e.g. `"auth/token/"`.
    pub path: String,
    /// Mount accessor recorded on generated clients.
    pub accessor: String,
}

fn root_id() -> String {
    ROOT_NAMESPACE_ID.to_string()
}

/// Host configuration loaded from TOML.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HostProfile {
    /// Namespaces besides root.
    pub namespaces: Vec<NamespaceConfig>,
    /// Mounts in registration order.
    pub mounts: Vec<MountConfig>,
    /// Seed for reproducible client identifiers.
    pub seed: Option<u64>,
    /// Directory written segments are mirrored into.
    pub out_dir: Option<PathBuf>,
    /// Encoding of mirrored segments.
    pub format: SegmentFormat,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            namespaces: Vec::new(),
            mounts: vec![MountConfig {
                namespace: root_id(),
                path: "auth/token/".into(),
                accessor: DEFAULT_TOKEN_ACCESSOR.into(),
            }],
            seed: None,
            out_dir: None,
            format: SegmentFormat::default(),
        }
    }
}

impl HostProfile {
    /// Read and validate a profile file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let src = fs::read_to_string(path)
            .with_context(|| format!("read profile {}", path.display()))?;
        Self::from_toml_str(&src).with_context(|| format!("load profile {}", path.display()))
    }

    /// Parse and validate a profile from TOML text.
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let profile: Self = toml::from_str(src).context("parse profile toml")?;
        profile.validate()?;
        Ok(profile)
    }

    /// Reject duplicate namespaces and accessors, and mounts in unknown
    /// namespaces.
    pub fn validate(&self) -> Result<()> {
        let mut ids = BTreeSet::from([ROOT_NAMESPACE_ID]);
        for ns in &self.namespaces {
            if ns.id.is_empty() {
                bail!("namespace id must not be empty");
            }
            if !ids.insert(ns.id.as_str()) {
                bail!("duplicate namespace {:?}", ns.id);
            }
        }

        let mut accessors = BTreeSet::new();
        for m in &self.mounts {
            if !ids.contains(m.namespace.as_str()) {
                bail!("mount {:?} refers to unknown namespace {:?}", m.path, m.namespace);
            }
            if m.path.trim_matches('/').is_empty() {
                bail!("mount path must not be empty (accessor {:?})", m.accessor);
            }
            if m.accessor.is_empty() {
                bail!("mount {:?} has an empty accessor", m.path);
            }
            if !accessors.insert(m.accessor.as_str()) {
                bail!("duplicate mount accessor {:?}", m.accessor);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_profile_gets_root_token_mount() {
        let p = HostProfile::from_toml_str("").unwrap();
        assert_eq!(p, HostProfile::default());
        assert_eq!(p.mounts[0].namespace, "root");
        assert_eq!(p.format, SegmentFormat::Json);
    }

    #[test]
    fn parses_full_profile() {
        let p = HostProfile::from_toml_str(
            r#"
            seed = 7
            out_dir = "out/segments"
            format = "cbor"

            [[namespaces]]
            id = "ns1"
            path = "ns1/"

            [[mounts]]
            path = "auth/token/"
            accessor = "tok"

            [[mounts]]
            namespace = "ns1"
            path = "auth/userpass/"
            accessor = "up_ns1"
            "#,
        )
        .unwrap();
        assert_eq!(p.seed, Some(7));
        assert_eq!(p.format.extension(), "cbor");
        assert_eq!(p.out_dir.as_deref(), Some(Path::new("out/segments")));
        assert_eq!(p.mounts.len(), 2);
        assert_eq!(p.mounts[0].namespace, "root");
    }

    #[test]
    fn rejects_mount_in_unknown_namespace() {
        let err = HostProfile::from_toml_str(
            r#"
            [[mounts]]
            namespace = "ghost"
            path = "auth/token/"
            accessor = "tok"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown namespace"));
    }

    #[test]
    fn rejects_duplicates() {
        let dup_ns = r#"
            [[namespaces]]
            id = "a"
            path = "a/"
            [[namespaces]]
            id = "a"
            path = "b/"
        "#;
        assert!(HostProfile::from_toml_str(dup_ns).is_err());

        let dup_acc = r#"
            [[mounts]]
            path = "auth/a/"
            accessor = "x"
            [[mounts]]
            path = "auth/b/"
            accessor = "x"
        "#;
        assert!(HostProfile::from_toml_str(dup_acc).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(HostProfile::from_toml_str("sead = 1").is_err());
    }
}
