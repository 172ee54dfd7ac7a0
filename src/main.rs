//! zbsniff - ZigBee network key sniffer
//!
//! Listens on an IEEE 802.15.4 channel, optionally writes a pcap file and
//! reports network keys found in plaintext Transport Key commands.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use zbsniff::{
    Config, ConsoleReporter, LiveRadioSource, PcapSink, SniffController, StopSignal,
    StoredCapture,
};

#[derive(Parser)]
#[command(name = "zbsniff")]
#[command(about = "ZigBee sniffer that recovers network keys from Transport Key commands")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture frames live from a radio
    Sniff {
        /// Radio device (e.g., zep or zep:0.0.0.0:17754)
        #[arg(short, long)]
        device: Option<String>,

        /// IEEE 802.15.4 channel (11-26)
        #[arg(short, long)]
        channel: Option<u8>,

        /// Number of frames to capture; 0 captures until Ctrl+C
        #[arg(short = 'n', long)]
        count: Option<u64>,

        /// Write captured frames to a pcap file
        #[arg(short, long, value_name = "FILE")]
        write: Option<PathBuf>,

        /// Scan frames for network keys while capturing
        #[arg(short = 'k', long)]
        extract_keys: bool,

        /// Show frame position and signal strength with each key
        #[arg(short, long)]
        verbose: bool,
    },
    /// Recover network keys from a pcap or Daintree SNA capture file
    Keys {
        /// Capture file to read
        file: PathBuf,

        /// Show frame position and signal strength with each key
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.tracing_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Sniff {
            device,
            channel,
            count,
            write,
            extract_keys,
            verbose,
        } => {
            let mut config = config;
            if let Some(device) = device {
                config.device = device;
            }
            if let Some(channel) = channel {
                config.channel = channel;
            }
            if let Some(count) = count {
                config.count = count;
            }
            sniff(&config, write, extract_keys, verbose)
        }
        Commands::Keys { file, verbose } => keys(&file, verbose),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn sniff(config: &Config, write: Option<PathBuf>, extract_keys: bool, verbose: bool) -> Result<()> {
    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || {
        info!("interrupt received, stopping capture");
        handler_stop.stop();
    })
    .context("failed to install Ctrl+C handler")?;

    let source = LiveRadioSource::open(&config.device, config.channel)
        .with_context(|| format!("failed to open device {}", config.device))?;

    let sink = write
        .as_deref()
        .map(PcapSink::create_tap)
        .transpose()
        .context("failed to create capture file")?;

    let reporter = ConsoleReporter::new().with_verbose(verbose);
    let mut controller = SniffController::new(reporter)
        .with_stop_signal(stop)
        .with_count_limit(config.count_limit())
        .with_live_scan(extract_keys);

    let summary = controller.run_live(source, sink)?;
    info!(
        frames = summary.frames,
        keys = summary.keys_found,
        suspicious = summary.suspicious,
        "sniffing finished"
    );

    Ok(())
}

fn keys(file: &std::path::Path, verbose: bool) -> Result<()> {
    let capture = StoredCapture::open(file)?;

    let reporter = ConsoleReporter::new().with_verbose(verbose);
    let mut controller = SniffController::new(reporter);
    let summary = controller.run_offline(capture)?;

    if summary.keys_found == 0 {
        info!(path = %file.display(), "no network keys found");
    }

    Ok(())
}
