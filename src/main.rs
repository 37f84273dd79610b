use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono;
use clap::{ArgAction, Parser};
use log::{info, LevelFilter};

extern crate libtaptrace;

use libtaptrace::capture::CaptureReader;
use libtaptrace::decoder::Completion;
use libtaptrace::tap::{TapEvent, TapListener, TapState};
use libtaptrace::{decode, DecodeConfig, StartMode};

#[derive(Parser)]
#[command(
    name = "jtag_replay",
    about = "Replay a parallel port JTAG capture through the TAP state machine."
)]
struct Cli {
    /// Capture file, one comma separated sample per line
    capture: PathBuf,

    /// Discard samples until TCK is first seen low
    #[arg(long)]
    wait_for_clock: bool,

    /// Stop decoding at this timestamp
    #[arg(long)]
    cutoff: Option<f64>,

    /// TAP state the target is in when the capture starts
    #[arg(long, default_value = "reset")]
    initial_state: TapState,

    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn setup_logger(level: LevelFilter) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stdout())
        .filter(move |meta| level == LevelFilter::Trace || !meta.target().contains("state_machine"))
        .apply()?;
    Ok(())
}

/// Prints committed registers the way the scan looked on the wire, MSB first.
#[derive(Default)]
struct Report {
    transitions: usize,
    updates: usize,
}

impl TapListener for Report {
    fn notify(&mut self, event: &TapEvent) {
        match event {
            TapEvent::StateChanged { .. } => self.transitions += 1,
            TapEvent::RegisterUpdated {
                register,
                bits,
                timestamp,
            } => {
                self.updates += 1;
                match bits.to_u64() {
                    Some(value) => println!(
                        "{:>10.1} {} {:>3} bits {} ({:#x})",
                        timestamp,
                        register,
                        bits.len(),
                        bits,
                        value
                    ),
                    None => println!(
                        "{:>10.1} {} {:>3} bits {}",
                        timestamp,
                        register,
                        bits.len(),
                        bits
                    ),
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    setup_logger(level).context("failed to set up logger")?;

    let mut config = DecodeConfig::new().with_initial_state(cli.initial_state);
    if cli.wait_for_clock {
        config = config.with_start_mode(StartMode::Start);
    }
    if let Some(cutoff) = cli.cutoff {
        config = config.with_cutoff(cutoff);
    }

    let reader = CaptureReader::open(&cli.capture)
        .with_context(|| format!("failed to open {}", cli.capture.display()))?;
    let mut report = Report::default();
    let summary = decode(reader, &config, &mut report)
        .with_context(|| format!("failed to decode {}", cli.capture.display()))?;

    if let Completion::Truncated { at } = summary.completion {
        info!("capture truncated by cutoff at {:.1}", at);
    }
    info!(
        "Done: {} edges, {} transitions, {} register updates, final state {}",
        summary.edges, report.transitions, report.updates, summary.final_state
    );
    info!("ir = {}, dr = {}", summary.ir, summary.dr);

    Ok(())
}
