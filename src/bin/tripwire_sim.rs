use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use tripwire::config::TripwireConfig;
use tripwire::error::{log_config_error, ErrorCode};
use tripwire::simulation::{self, SynthSpec, DEFAULT_POLL_MS};

#[derive(Parser, Debug)]
#[command(
    name = "tripwire-sim",
    about = "Replay range traces through the tripwire detector"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a JSON array of readings and print a report
    Replay {
        #[arg(long)]
        trace: PathBuf,
        /// JSON config file; missing fields keep their defaults
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = DEFAULT_POLL_MS)]
        poll_ms: u64,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Exit with status 2 if calibration fails or runs out of trace
        #[arg(long)]
        require_calibrated: bool,
    },
    /// Generate a noisy trace with a number of crossings
    Synth {
        #[arg(long, default_value_t = 200)]
        baseline: i64,
        #[arg(long, default_value_t = 5)]
        noise: i64,
        #[arg(long, default_value_t = 120)]
        depth: i64,
        #[arg(long, default_value_t = 3)]
        crossings: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration
    Defaults,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            trace,
            config,
            poll_ms,
            output,
            require_calibrated,
        } => run_replay(&trace, config, poll_ms, output, require_calibrated),
        Commands::Synth {
            baseline,
            noise,
            depth,
            crossings,
            seed,
            output,
        } => {
            let spec = SynthSpec {
                baseline,
                noise,
                depth,
                crossings,
                ..SynthSpec::default()
            };
            run_synth(&spec, seed, output)
        }
        Commands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&TripwireConfig::default())?);
            Ok(ExitCode::from(0))
        }
    }
}

fn run_replay(
    trace_path: &Path,
    config_path: Option<PathBuf>,
    poll_ms: u64,
    output_path: Option<PathBuf>,
    require_calibrated: bool,
) -> Result<ExitCode> {
    let config = match config_path {
        Some(path) => TripwireConfig::try_load_from_file(&path)?,
        None => TripwireConfig::default(),
    };
    if let Err(err) = config.validate() {
        log_config_error(&err, "tripwire-sim replay");
    }

    let contents = fs::read_to_string(trace_path)
        .with_context(|| format!("reading {}", trace_path.display()))?;
    let trace: Vec<i64> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing {}", trace_path.display()))?;

    let report = simulation::replay(&trace, config, poll_ms);
    emit_json(&serde_json::to_string_pretty(&report)?, output_path)?;

    if require_calibrated {
        if report.calibration_exhausted_trace {
            eprintln!(
                "Trace has {} readings, calibration needed {}",
                trace.len(),
                report.calibration.baseline_reads
            );
            return Ok(ExitCode::from(2));
        }
        if let Err(err) = report
            .calibration
            .require_calibrated(report.config.max_baseline_variance)
        {
            eprintln!("{} (code {})", err.message(), err.code());
            return Ok(ExitCode::from(2));
        }
    }
    Ok(ExitCode::from(0))
}

fn run_synth(spec: &SynthSpec, seed: u64, output_path: Option<PathBuf>) -> Result<ExitCode> {
    let mut rng = StdRng::seed_from_u64(seed);
    let trace = simulation::synthesize(spec, &mut rng);
    emit_json(&serde_json::to_string(&trace)?, output_path)?;
    Ok(ExitCode::from(0))
}

fn emit_json(json: &str, output_path: Option<PathBuf>) -> Result<()> {
    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }
    Ok(())
}
