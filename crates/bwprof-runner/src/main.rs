//! BWPROF CLI
//!
//! Command-line interface for applying BWPROF monitor profiles to the
//! simulated firmware and encoding individual commands.

use std::path::PathBuf;
use std::process::ExitCode;

use bwprof_firmware::LoopbackConfig;
use bwprof_runner::{
    metrics_export, parse_version_word, run_profile, BwprofProfile, EncodeCommand, RunnerError,
};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bwprof")]
#[command(about = "SCMI bandwidth profiling (BWPROF) tool")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a YAML profile to the simulated firmware
    Apply {
        /// Profile file
        profile: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Protocol version word reported by the firmware
        #[arg(long = "version", value_parser = parse_version_word)]
        fw_version: Option<u32>,

        /// Write the metrics recorded during the run to this file as JSON
        #[arg(long)]
        metrics_output: Option<PathBuf>,
    },
    /// Print the payload of a single command
    Encode {
        #[command(subcommand)]
        command: EncodeCommand,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode, RunnerError> {
    match cli.command {
        Command::Apply {
            profile,
            json,
            fw_version,
            metrics_output,
        } => {
            info!(path = %profile.display(), "loading profile");
            let profile = BwprofProfile::load(&profile)?;
            if profile.is_empty() {
                tracing::warn!("profile sets nothing");
            }

            let mut config = LoopbackConfig::default();
            if let Some(version) = fw_version {
                config.version = version;
            }
            let report = match &metrics_output {
                Some(path) => {
                    let (report, export) =
                        metrics_export::capture(|| run_profile(&profile, config));
                    std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
                    info!(path = %path.display(), series = export.metrics.len(), "metrics written");
                    report
                }
                None => run_profile(&profile, config),
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
            if let Some(err) = &report.error {
                error!("apply failed: {}", err);
                return Ok(ExitCode::FAILURE);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Encode { command } => {
            println!("{}", command.encode()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
