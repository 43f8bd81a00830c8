//! JSON Lines (NDJSON) helpers for streaming `EntitySegment` I/O.
//!
//! One segment per line. The reader owns its file so iterators never borrow
//! buffers that outlive them; each line is parsed independently and errors
//! carry the line number.
//!
//! [`JsonlSegmentReader`] adapts the stream to [`SegmentReader`] so a dump
//! can be fed back to an aggregator exactly like freshly generated data.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::reader::SegmentReader;
use crate::{EntitySegment, SharedClient, TokenCount};

/// Owning JSONL iterator over `EntitySegment`.
pub struct JsonlSegmentIter {
    rdr: BufReader<File>,
    buf: String,
    line_no: usize,
}

impl JsonlSegmentIter {
    fn new(file: File) -> Self {
        Self {
            rdr: BufReader::new(file),
            buf: String::with_capacity(8 << 10),
            line_no: 0,
        }
    }
}

impl Iterator for JsonlSegmentIter {
    type Item = Result<EntitySegment>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.rdr.read_line(&mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                self.line_no += 1;
                let line = self.buf.trim_end_matches(['\n', '\r']);
                if line.is_empty() {
                    return Some(Err(anyhow::anyhow!(
                        "parse jsonl line {}: empty line",
                        self.line_no
                    )));
                }
                Some(
                    serde_json::from_str(line)
                        .with_context(|| format!("parse jsonl line {}", self.line_no)),
                )
            }
            Err(e) => Some(Err(e).with_context(|| format!("read line {}", self.line_no + 1))),
        }
    }
}

/// Stream read: one JSON object per line → yields `EntitySegment` items.
pub fn stream_segments_jsonl<P: AsRef<Path>>(path: P) -> Result<JsonlSegmentIter> {
    let f = File::open(path.as_ref())
        .with_context(|| format!("open {}", path.as_ref().display()))?;
    Ok(JsonlSegmentIter::new(f))
}

/// Write segments as JSON Lines (one object per line).
pub fn write_segments_jsonl<P: AsRef<Path>>(path: P, segments: &[EntitySegment]) -> Result<()> {
    crate::io::ensure_parent_dir(path.as_ref())?;
    let f = File::create(path.as_ref())
        .with_context(|| format!("create {}", path.as_ref().display()))?;
    let mut w = BufWriter::new(f);
    for s in segments {
        serde_json::to_writer(&mut w, s).context("serialize segment to json")?;
        w.write_all(b"\n").context("write newline")?;
    }
    w.flush().context("flush writer")?;
    Ok(())
}

/// [`SegmentReader`] over any `EntitySegment` stream.
pub struct JsonlSegmentReader<I> {
    inner: I,
}

impl<I> JsonlSegmentReader<I>
where
    I: Iterator<Item = Result<EntitySegment>>,
{
    /// Wrap a segment stream.
    pub const fn new(inner: I) -> Self {
        Self { inner }
    }
}

impl<I> SegmentReader for JsonlSegmentReader<I>
where
    I: Iterator<Item = Result<EntitySegment>>,
{
    fn read_entities(&mut self) -> Result<Option<Vec<SharedClient>>> {
        self.inner.next().transpose().map(|s| s.map(|s| s.clients))
    }

    fn read_token_counts(&mut self) -> Result<Option<TokenCount>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientRecord;
    use std::sync::Arc;

    fn tmp_path(name: &str) -> std::path::PathBuf {
        let mut p = std::env::temp_dir();
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("actgen_core_jsonl_{name}_{nanos}.jsonl"));
        p
    }

    #[test]
    fn jsonl_reader_streams_segments() {
        let p = tmp_path("stream");
        let segs: Vec<EntitySegment> = (0..3)
            .map(|i| EntitySegment {
                start_timestamp: 0,
                sequence: i,
                clients: (0..i)
                    .map(|j| Arc::new(ClientRecord::new(format!("c{i}-{j}"), "root", "a", false)))
                    .collect(),
            })
            .collect();
        write_segments_jsonl(&p, &segs).unwrap();

        let mut r = JsonlSegmentReader::new(stream_segments_jsonl(&p).unwrap());
        let mut sizes = Vec::new();
        while let Some(clients) = r.read_entities().unwrap() {
            sizes.push(clients.len());
        }
        assert_eq!(sizes, vec![0, 1, 2]);
        assert!(r.read_token_counts().unwrap().is_none());
        let _ = std::fs::remove_file(p);
    }

    #[test]
    fn blank_lines_are_errors_with_line_numbers() {
        let p = tmp_path("blank");
        {
            let mut f = File::create(&p).unwrap();
            writeln!(f, r#"{{"start_timestamp":0,"sequence":0,"clients":[]}}"#).unwrap();
            writeln!(f).unwrap();
        }
        let mut it = stream_segments_jsonl(&p).unwrap();
        assert!(it.next().unwrap().is_ok());
        let err = it.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(it.next().is_none());
        let _ = std::fs::remove_file(p);
    }
}
