//! Serialization helpers for requests and `EntitySegment`s.
//!
//! JSON and CBOR read/write utilities with extension-based auto-detection.
//! Unknown/missing extensions are rejected for reads and default to JSON
//! for writes.
//!
//! [`stream_segments_auto`] returns a boxed iterator so callers can consume
//! JSONL/NDJSON (true streaming) and JSON/CBOR (load-then-iterate) the same
//! way.

use crate::request::ActivityLogMockInput;
use crate::EntitySegment;
use anyhow::{anyhow, Context, Result};
use serde::de::DeserializeOwned;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Ensure the parent directory for a file exists (no-op if none).
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", display(path)))?;
        }
    }
    Ok(())
}

/// ------------------------------
/// Request I/O
/// ------------------------------

/// Parse a request from a JSON string.
pub fn parse_request_json(src: &str) -> Result<ActivityLogMockInput> {
    serde_json::from_str(src).context("invalid input data")
}

/// Read a request from **JSON**.
pub fn read_request_json<P: AsRef<Path>>(path: P) -> Result<ActivityLogMockInput> {
    read_json(path.as_ref(), "request")
}

/// Auto-detect request read by extension (only `.json` is supported).
pub fn read_request_auto<P: AsRef<Path>>(path: P) -> Result<ActivityLogMockInput> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("json") => read_request_json(path),
        Some(other) => Err(anyhow!(
            "unsupported request extension: {} (supported: .json)",
            other
        )),
        None => Err(anyhow!("path has no extension (expected .json)")),
    }
}

/// ------------------------------
/// EntitySegment I/O
/// ------------------------------

/// Read an `EntitySegment` from **JSON**.
pub fn read_segment_json<P: AsRef<Path>>(path: P) -> Result<EntitySegment> {
    read_json(path.as_ref(), "entity segment")
}

/// Write an `EntitySegment` to **JSON** (pretty).
pub fn write_segment_json<P: AsRef<Path>>(path: P, v: &EntitySegment) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer_pretty(&mut w, v).with_context(|| "serialize JSON entity segment")?;
    w.flush().with_context(|| "flush JSON writer")?;
    Ok(())
}

/// Read an `EntitySegment` from **CBOR**.
pub fn read_segment_cbor<P: AsRef<Path>>(path: P) -> Result<EntitySegment> {
    let path_ref = path.as_ref();
    let f = File::open(path_ref).with_context(|| format!("open {}", display(path_ref)))?;
    let mut rdr = BufReader::new(f);
    let v: EntitySegment =
        ciborium::de::from_reader(&mut rdr).with_context(|| "deserialize CBOR entity segment")?;
    Ok(v)
}

/// Write an `EntitySegment` to **CBOR**.
pub fn write_segment_cbor<P: AsRef<Path>>(path: P, v: &EntitySegment) -> Result<()> {
    let path_ref = path.as_ref();
    ensure_parent_dir(path_ref)?;
    let f = File::create(path_ref).with_context(|| format!("create {}", display(path_ref)))?;
    let mut w = BufWriter::new(f);
    ciborium::ser::into_writer(v, &mut w).with_context(|| "serialize CBOR entity segment")?;
    w.flush().with_context(|| "flush CBOR writer")?;
    Ok(())
}

/// Auto-detect read by extension `.json` / `.cbor` (case-insensitive).
pub fn read_segment_auto<P: AsRef<Path>>(path: P) -> Result<EntitySegment> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("json") => read_segment_json(path),
        Some("cbor") => read_segment_cbor(path),
        Some(other) => Err(anyhow!(
            "unsupported segment extension: {} (supported: .json, .cbor)",
            other
        )),
        None => Err(anyhow!("path has no extension (expected .json or .cbor)")),
    }
}

/// Auto-detect write (defaults to **JSON** if unknown or missing).
pub fn write_segment_auto<P: AsRef<Path>>(path: P, v: &EntitySegment) -> Result<()> {
    match ext_lower(path.as_ref()).as_deref() {
        Some("cbor") => write_segment_cbor(path, v),
        _ => write_segment_json(path, v),
    }
}

/// ------------------------------
/// Streaming helper (boxed iterator)
/// ------------------------------

/// Return a boxed iterator over `EntitySegment`s for the given path.
///
/// - **`.jsonl` / `.ndjson`**: true streaming, one segment per line.
/// - **`.json` / `.cbor`**: a single segment file, yielded once.
pub fn stream_segments_auto<P: AsRef<Path>>(
    path: P,
) -> Result<Box<dyn Iterator<Item = Result<EntitySegment>> + Send>> {
    // Own the path so the iterator type doesn't capture `P`.
    let pb = path.as_ref().to_owned();

    match ext_lower(&pb).as_deref() {
        Some("jsonl" | "ndjson") => {
            let it = crate::io_jsonl::stream_segments_jsonl(pb)?;
            Ok(Box::new(it))
        }
        Some("json" | "cbor") => {
            let seg = read_segment_auto(&pb)?;
            Ok(Box::new(std::iter::once(Ok(seg))))
        }
        Some(other) => Err(anyhow!(
            "unsupported segment extension: {} (supported: .json, .cbor, .jsonl, .ndjson)",
            other
        )),
        None => Err(anyhow!(
            "path has no extension (expected .json, .cbor, .jsonl, or .ndjson)"
        )),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let f = File::open(path).with_context(|| format!("open {}", display(path)))?;
    let rdr = BufReader::new(f);
    serde_json::from_reader(rdr).with_context(|| format!("deserialize JSON {what}"))
}

/// Return the lowercase extension (without dot) if present.
fn ext_lower(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

/// Human-friendly path display for error messages.
fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
