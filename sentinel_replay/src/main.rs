use anyhow::{Context, Result};
use sentinel_vision::{Error, FrameReport, ParallelSession, Session, SessionConfig, SessionOutput, TrackedFrame};
use std::env;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::PathBuf;
use tracing::{info, warn};

const USAGE: &str = "Usage: sentinel_replay <detections.jsonl> <output.json> [config.json] [--parallel]";

#[derive(Debug, PartialEq)]
struct Args {
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    parallel: bool,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let parallel = args.iter().any(|a| a == "--parallel");
    let positional: Vec<&String> = args.iter().skip(1).filter(|a| !a.starts_with("--")).collect();
    match positional.as_slice() {
        [input, output] => Some(Args {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            config: None,
            parallel,
        }),
        [input, output, config] => Some(Args {
            input: PathBuf::from(input),
            output: PathBuf::from(output),
            config: Some(PathBuf::from(config)),
            parallel,
        }),
        _ => None,
    }
}

/// One frame per line; blank lines carry nothing.
fn parse_frame_line(line: &str) -> serde_json::Result<Option<TrackedFrame>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line).map(Some)
}

enum Runner {
    Sequential(Session),
    Parallel(ParallelSession),
}

impl Runner {
    async fn process(&mut self, frame: TrackedFrame) -> sentinel_vision::Result<FrameReport> {
        match self {
            Runner::Sequential(session) => session.process_frame(&frame),
            Runner::Parallel(session) => session.process_frame(frame).await,
        }
    }

    async fn finish(self) -> SessionOutput {
        match self {
            Runner::Sequential(session) => session.finish(),
            Runner::Parallel(session) => session.finish().await,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentinel_vision=info,sentinel_replay=info".into()),
        )
        .init();

    // --- 1. Argument Parsing & Setup ---
    let raw_args: Vec<String> = env::args().collect();
    let Some(args) = parse_args(&raw_args) else {
        println!("{}", USAGE);
        return Ok(());
    };

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("failed to load session config from {}", path.display()))?,
        None => SessionConfig::default(),
    };

    // --- 2. Session Initialization ---
    let mut runner = if args.parallel {
        Runner::Parallel(ParallelSession::new(config)?)
    } else {
        Runner::Sequential(Session::new(config)?)
    };

    // --- 3. Main Replay Loop ---
    let input = File::open(&args.input).with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut frames = 0u64;
    let mut skipped = 0u64;

    for (line_no, line) in BufReader::new(input).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", line_no + 1))?;
        let frame = match parse_frame_line(&line) {
            Ok(Some(frame)) => frame,
            Ok(None) => continue,
            Err(err) => {
                warn!(line = line_no + 1, error = %err, "skipping unparsable frame");
                skipped += 1;
                continue;
            }
        };

        match runner.process(frame).await {
            Ok(_) => frames += 1,
            // The session already logged the rejection; skip the frame and keep going.
            Err(Error::InvalidDetectionInput { .. }) => skipped += 1,
            Err(err) => return Err(err.into()),
        }
    }

    // --- 4. Artifact Output ---
    let output = runner.finish().await;
    let writer = BufWriter::new(
        File::create(&args.output).with_context(|| format!("failed to create {}", args.output.display()))?,
    );
    serde_json::to_writer_pretty(writer, &output).context("failed to write session output")?;

    info!(
        frames,
        skipped,
        events = output.stats.total_detections,
        high_threat = output.stats.high_threat_events,
        output = %args.output.display(),
        "replay complete"
    );
    Ok(())
}
