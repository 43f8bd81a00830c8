//! Canonical core types used across the actgen workspace.
//!
//! These live in `actgen-core` and are broadly re-exported at the crate root
//! so other crates can import via `actgen_core::ClientRecord`,
//! `actgen_core::SegmentSlot`, etc.
//!
//! The design aims to keep serialized forms conservative and portable (serde).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of the root namespace.
pub const ROOT_NAMESPACE_ID: &str = "root";

/// Segment index within a month (small, dense-ish integer).
pub type SegmentIndex = u32;

/// Classification of a synthetic client.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClientType {
    /// Identity-backed client.
    #[serde(rename = "entity")]
    Entity,
    /// Anonymous, token-based client.
    #[serde(rename = "non-entity-token")]
    NonEntityToken,
}

impl ClientType {
    /// Derive the classification from the non-entity flag.
    #[inline]
    #[must_use]
    pub const fn from_non_entity(non_entity: bool) -> Self {
        if non_entity {
            Self::NonEntityToken
        } else {
            Self::Entity
        }
    }

    /// Wire name used by the host telemetry system.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::NonEntityToken => "non-entity-token",
        }
    }
}

impl fmt::Display for ClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One synthetic client.
///
/// Immutable once created. Records produced by repetition are the *same*
/// `Arc` reused in another month, so identity-based consumers can compare
/// with [`Arc::ptr_eq`]; value-based consumers compare `client_id`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ClientRecord {
    /// Client identifier (unique within the dataset).
    pub client_id: String,
    /// Owning namespace identifier.
    pub namespace_id: String,
    /// Accessor of the mount the client authenticated through.
    pub mount_accessor: String,
    /// `true` for token-based (non-entity) clients.
    pub non_entity: bool,
    /// Derived classification (always consistent with `non_entity`).
    pub client_type: ClientType,
}

impl ClientRecord {
    /// Build a record, deriving `client_type` from `non_entity`.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        namespace_id: impl Into<String>,
        mount_accessor: impl Into<String>,
        non_entity: bool,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            namespace_id: namespace_id.into(),
            mount_accessor: mount_accessor.into(),
            non_entity,
            client_type: ClientType::from_non_entity(non_entity),
        }
    }
}

/// Shared handle to an immutable client record.
pub type SharedClient = Arc<ClientRecord>;

/// State of a single segment index in a month's [`SegmentMap`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SegmentSlot {
    /// Index reserved but never written.
    Skipped,
    /// Index written as an empty segment.
    Empty,
    /// Index written with these clients (non-empty, pool order).
    Populated(Vec<SharedClient>),
}

impl SegmentSlot {
    /// Clients carried by the slot (`None` for skipped slots).
    #[must_use]
    pub fn clients(&self) -> Option<&[SharedClient]> {
        match self {
            Self::Skipped => None,
            Self::Empty => Some(&[]),
            Self::Populated(c) => Some(c),
        }
    }

    /// Number of clients in the slot (0 for skipped and empty).
    #[must_use]
    pub fn len(&self) -> usize {
        self.clients().map_or(0, <[SharedClient]>::len)
    }

    /// Whether the slot carries no clients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the slot is reserved and must not be written.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

/// Segment index → slot, iterated in ascending index order.
pub type SegmentMap = BTreeMap<SegmentIndex, SegmentSlot>;

/// A namespace known to the host.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Namespace {
    /// Namespace identifier (`"root"` for the root namespace).
    pub id: String,
    /// Namespace path, e.g. `"ns1/"` (empty for root).
    #[serde(default)]
    pub path: String,
}

impl Namespace {
    /// The root namespace.
    #[must_use]
    pub fn root() -> Self {
        Self {
            id: ROOT_NAMESPACE_ID.to_string(),
            path: String::new(),
        }
    }

    /// Whether this is the root namespace.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.id == ROOT_NAMESPACE_ID
    }
}

/// A mount known to the host's registry.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MountEntry {
    /// Owning namespace identifier.
    pub namespace_id: String,
    /// Mount path relative to its namespace, e.g. `"auth/userpass/"`.
    pub path: String,
    /// Stable accessor, e.g. `"auth_userpass_1a2b3c"`.
    pub accessor: String,
}

/// One written entity segment, as persisted by segment logs.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitySegment {
    /// Start-of-month Unix timestamp (seconds).
    pub start_timestamp: i64,
    /// Segment index used as the client sequence number.
    pub sequence: u64,
    /// Clients in the segment.
    pub clients: Vec<SharedClient>,
}

/// Token counts by namespace. The generator never produces these; the type
/// exists so readers expose the same surface as the host's log readers.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCount {
    /// Namespace identifier → non-entity token count.
    pub counts_by_namespace: BTreeMap<String, u64>,
}
