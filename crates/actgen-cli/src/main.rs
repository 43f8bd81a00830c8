// crates/actgen-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use actgen_core::{
    io::{read_request_auto, stream_segments_auto},
    io_jsonl::{write_segments_jsonl, JsonlSegmentReader},
    request::ActivityLogMockInput,
    EntitySegment, SegmentReader, SegmentSlot,
};
use actgen_gen::{assemble::Assembler, ids::id_source, output::layout};
use actgen_store::{aggregate::Tally, host_from_profile, HostProfile, MemoryHost};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "actgen",
    about = "Mock client-activity generator",
    long_about = "Mock client-activity generator.\n\nUse this tool to turn a mock-input request into per-month entity segments, preview the segment layout, and read written segments back.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Host selection shared by commands that assemble a request.
#[derive(Args, Debug)]
struct HostArgs {
    /// Host profile (TOML). Defaults to the root namespace with one token mount.
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Seed for reproducible client IDs (overrides the profile's seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Reference time as RFC 3339 (defaults to now)
    #[arg(long, value_parser = parse_now)]
    now: Option<DateTime<Utc>>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Generate activity for a request and write it to the in-memory log.
    /// Prints the written segment identifiers as JSON.
    Generate {
        /// Request path (JSON)
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        host: HostArgs,

        /// Mirror written segments under this directory (overrides the profile)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Also dump every written segment as JSON Lines
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Wait for the background refresh and log its counts
        #[arg(long, default_value_t = false)]
        wait_refresh: bool,
    },

    /// Print the segment layout of a request without writing anything
    Plan {
        /// Request path (JSON)
        #[arg(long)]
        input: PathBuf,

        #[command(flatten)]
        host: HostArgs,
    },

    /// Stream a segment file (JSON/CBOR/JSONL) through the sequential reader
    Read {
        /// Segment file path
        #[arg(long)]
        segments: PathBuf,
    },

    /// Concatenate segment files (JSON/CBOR/JSONL) into one JSON Lines file
    ExportJsonl {
        /// Input segment files
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Output JSONL path
        #[arg(long)]
        output: PathBuf,
    },
}

#[derive(Serialize)]
struct GenerateOutput {
    paths: Vec<String>,
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Generate {
            input,
            host,
            out_dir,
            dump,
            wait_refresh,
        } => generate(&input, &host, out_dir.as_deref(), dump.as_deref(), wait_refresh),

        Cmd::Plan { input, host } => plan(&input, &host),

        Cmd::Read { segments } => read(&segments),

        Cmd::ExportJsonl { input, output } => export_jsonl(&input, &output),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

fn parse_now(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 time {s:?}: {e}"))
}

fn load_profile(path: Option<&Path>) -> Result<HostProfile> {
    match path {
        Some(p) => HostProfile::load(p),
        None => Ok(HostProfile::default()),
    }
}

fn load_request(path: &Path) -> Result<ActivityLogMockInput> {
    read_request_auto(path).with_context(|| format!("reading request {}", path.display()))
}

fn generate(
    input: &Path,
    args: &HostArgs,
    out_dir: Option<&Path>,
    dump: Option<&Path>,
    wait_refresh: bool,
) -> Result<()> {
    let request = load_request(input)?;
    let profile = load_profile(args.profile.as_deref())?;
    let (host, mut log) = host_from_profile(&profile, out_dir)?;
    let seed = args.seed.or(profile.seed);
    let mut ids = id_source(seed);
    let now = args.now.unwrap_or_else(Utc::now);

    info!(input=%input.display(), months = request.data.len(), ?seed, "generating activity");
    let paths = actgen_gen::generate(&request, &host, &mut *ids, &mut log, now).map_err(|e| {
        let what = if e.is_request_error() {
            "request rejected"
        } else {
            "generating activity log"
        };
        anyhow::Error::new(e).context(what)
    })?;

    if wait_refresh {
        if let Some(counts) = log.wait_for_refresh()? {
            info!(
                segments = counts.segments,
                distinct = counts.distinct_clients,
                "refresh finished"
            );
        }
    }

    if let Some(dump) = dump {
        let segments: Vec<EntitySegment> = log.segments().cloned().collect();
        write_segments_jsonl(dump, &segments)
            .with_context(|| format!("dumping segments to {}", dump.display()))?;
        info!(path=%dump.display(), segments = segments.len(), "dumped segments");
    }

    let out = serde_json::to_string_pretty(&GenerateOutput { paths })
        .context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn plan(input: &Path, args: &HostArgs) -> Result<()> {
    let request = load_request(input)?;
    request.verify().context("invalid request")?;
    let profile = load_profile(args.profile.as_deref())?;
    let host = MemoryHost::from_profile(&profile)?;
    let mut ids = id_source(args.seed.or(profile.seed));
    let now = args.now.unwrap_or_else(Utc::now);

    let store = Assembler::new(&host, &host, &mut *ids)
        .assemble(&request)
        .context("assembling months")?;
    let months = layout(&store, now).context("partitioning months")?;

    for m in &months {
        let clients = store.get(m.months_ago).map_or(0, |p| p.len());
        println!(
            "month {} ({}): {} clients",
            m.months_ago,
            m.start.format("%Y-%m"),
            clients
        );
        for (index, slot) in &m.segments {
            match slot {
                SegmentSlot::Skipped => println!("  segment {index}: skipped"),
                SegmentSlot::Empty => println!("  segment {index}: empty"),
                SegmentSlot::Populated(c) => println!("  segment {index}: {} clients", c.len()),
            }
        }
    }
    Ok(())
}

fn read(segments: &Path) -> Result<()> {
    info!(path=%segments.display(), "reading segments");
    let iter = stream_segments_auto(segments).context("open segment stream")?;
    let mut reader = JsonlSegmentReader::new(iter);

    let mut tally = Tally::default();
    let mut n = 0usize;
    while let Some(clients) = reader
        .read_entities()
        .with_context(|| format!("reading {}", segments.display()))?
    {
        println!("segment #{n}: {} clients", clients.len());
        tally.add(&clients);
        n += 1;
    }

    println!("{n} segments, {} distinct clients", tally.distinct());
    for (ns, counts) in &tally.by_namespace {
        println!(
            "  {ns}: {} entity, {} non-entity",
            counts.entity_clients, counts.non_entity_clients
        );
    }
    Ok(())
}

fn export_jsonl(inputs: &[PathBuf], output: &Path) -> Result<()> {
    info!(inputs = inputs.len(), outfile=%output.display(), "export to jsonl");
    let mut all = Vec::new();
    for input in inputs {
        for item in stream_segments_auto(input)
            .with_context(|| format!("open {}", input.display()))?
        {
            all.push(item?);
        }
    }
    write_segments_jsonl(output, &all)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("Exported {} segments → {}", all.len(), output.display());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_flags() {
        let cli = Cli::try_parse_from([
            "actgen",
            "generate",
            "--input",
            "req.json",
            "--seed",
            "5",
            "--now",
            "2024-03-14T10:00:00+02:00",
            "--wait-refresh",
        ])
        .unwrap();
        let Cmd::Generate {
            input,
            host,
            wait_refresh,
            out_dir,
            ..
        } = cli.cmd
        else {
            unreachable!("expected generate");
        };
        assert_eq!(input, PathBuf::from("req.json"));
        assert_eq!(host.seed, Some(5));
        assert_eq!(host.now.unwrap().to_rfc3339(), "2024-03-14T08:00:00+00:00");
        assert!(wait_refresh);
        assert!(out_dir.is_none());
    }

    #[test]
    fn rejects_bad_time() {
        assert!(parse_now("last tuesday").is_err());
        assert!(Cli::try_parse_from(["actgen", "plan", "--input", "r.json", "--now", "x"]).is_err());
    }

    #[test]
    fn export_needs_input() {
        assert!(Cli::try_parse_from(["actgen", "export-jsonl", "--output", "o.jsonl"]).is_err());
    }
}
