//! actgen-core: data model, request schema, and collaborator boundary.
//!
//! This crate defines the **stable boundary** used across actgen crates:
//! - canonical data types (`ClientRecord`, `SegmentSlot`, `SegmentMap`, …),
//! - the mock-input request schema and its verification pass,
//! - the collaborator traits a host telemetry system implements
//!   (namespace/mount lookup, segment writes, aggregation, refresh),
//! - the forward-only [`SegmentReader`] handed to aggregators, and
//! - JSON/CBOR I/O (with `.jsonl/.ndjson` streaming helpers) for segments.
//!
//! ```no_run
//! use actgen_core::request::ActivityLogMockInput;
//! # fn main() -> anyhow::Result<()> {
//! let input: ActivityLogMockInput = actgen_core::io::read_request_auto("request.json")?;
//! input.verify()?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Crate-wide error type and `Result` alias.
pub mod error;
/// Collaborator traits implemented by the host telemetry system.
pub mod host;
/// JSON/CBOR helpers and auto-detecting read/write APIs.
pub mod io;
/// Streaming JSONL/NDJSON helpers for segment dumps.
pub mod io_jsonl;
/// Forward-only segment reader handed to aggregators.
pub mod reader;
/// Mock-input request schema and verification.
pub mod request;
/// Calendar-month arithmetic in UTC.
pub mod timeutil;
/// Canonical core data types shared across the workspace.
pub mod types;

// ---- Re-exports for workspace compatibility ----
pub use error::{Error, Result};
pub use host::*;
pub use reader::*;
pub use types::*;
