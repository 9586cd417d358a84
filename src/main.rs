//! Stimseq CLI - check, preview, and play stimulus sequence files.

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use stimseq::config::RigConfig;
use stimseq::expand::expand;
use stimseq::output::{SoftOutput, StimulusOutput};
use stimseq::plot::plot_sequence;
use stimseq::sequence::{load_sequence, ParseReport, Sequence};

#[derive(Parser)]
#[command(name = "stimseq")]
#[command(about = "Millisecond-clocked stimulus sequences for valve/LED/piezo rigs", long_about = None)]
struct Cli {
    /// Rig configuration file (TOML); defaults describe a USB-600x rig
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity
    #[arg(short, long, global = true, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and expand a sequence file, reporting what would play
    Check {
        /// Sequence file (CSV)
        sequence: PathBuf,
    },

    /// Play a sequence file through the software-timed backend
    Run {
        /// Sequence file (CSV)
        sequence: PathBuf,
    },

    /// Render a sequence file to an SVG preview
    Plot {
        /// Sequence file (CSV)
        sequence: PathBuf,

        /// Output SVG path
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level.as_tracing())
        .init();

    let config = match &cli.config {
        Some(path) => RigConfig::load(path)?,
        None => RigConfig::default(),
    };

    match cli.command {
        Commands::Check { sequence } => check(&config, &sequence),
        Commands::Run { sequence } => run(&config, &sequence),
        Commands::Plot { sequence, output } => plot(&config, &sequence, &output),
    }
}

/// Load a sequence file, treating an empty result as fatal: expansion and
/// playback both need at least one step.
fn load(config: &RigConfig, path: &Path) -> Result<(Sequence, ParseReport), Box<dyn Error>> {
    let (sequence, report) = load_sequence(path, &config.parse_options())?;
    if sequence.is_empty() {
        return Err(format!("{}: no valid steps, nothing to play", path.display()).into());
    }
    Ok((sequence, report))
}

fn check(config: &RigConfig, path: &Path) -> Result<(), Box<dyn Error>> {
    let (sequence, report) = load(config, path)?;
    let timeline = expand(&sequence, &config.packer()?)?;

    println!("Stimseq Sequence Check");
    println!("======================");
    println!("  File:          {}", path.display());
    println!("  Steps:         {}", sequence.len());
    println!("  Comments:      {}", report.comment_lines);
    println!("  Skipped rows:  {}", report.skipped_rows);
    println!(
        "  Playback:      {} ms ({} samples per channel)",
        sequence.end_time_ms().unwrap_or(0),
        timeline.len()
    );
    println!(
        "  Digital word:  {} lines, {:?} order",
        config.digital_width(),
        config.bit_order
    );
    println!();
    println!("✓ Sequence is playable");

    Ok(())
}

fn run(config: &RigConfig, path: &Path) -> Result<(), Box<dyn Error>> {
    let (sequence, _) = load(config, path)?;
    let timeline = expand(&sequence, &config.packer()?)?;

    let mut backend = SoftOutput::new(config.clone());
    backend.play(&timeline)?;

    println!("✓ Sequence complete ({} ms)", timeline.len());
    Ok(())
}

fn plot(config: &RigConfig, path: &Path, output: &Path) -> Result<(), Box<dyn Error>> {
    let (sequence, _) = load(config, path)?;
    plot_sequence(&sequence, output)?;

    println!("✓ Preview written to {}", output.display());
    Ok(())
}
