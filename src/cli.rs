use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::load_config;
use crate::engine::DispatchEngine;
use crate::error::Result;
use crate::models::SimConfig;
use crate::output;
use crate::service::SimulationService;
use crate::status::{StatusSnapshot, SummaryReport};

const DEFAULT_SIM_TIME: u64 = 60;

#[derive(Parser, Debug)]
#[command(name = "ems-sim", about = "Ambulance dispatch simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation and print its status and summary
    Run(RunArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Load settings from a TOML or JSON file; explicit flags still win
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub hospitals: Option<u32>,
    #[arg(long)]
    pub ambulances: Option<u32>,
    /// Simulated time units per wall-clock second
    #[arg(long)]
    pub speed: Option<u64>,
    /// Simulated time between generated patient calls
    #[arg(long)]
    pub call_interval: Option<u64>,
    /// Pacing cadence in milliseconds (paced mode only)
    #[arg(long)]
    pub tick_ms: Option<u64>,
    /// Seed for patient placement; omit for seed 0
    #[arg(long)]
    pub seed: Option<u64>,
    /// Simulated-time horizon for a batch run (no wall-clock pacing)
    #[arg(long, conflicts_with = "wall_time")]
    pub sim_time: Option<u64>,
    /// Run the paced loop for this many wall-clock seconds instead
    #[arg(long)]
    pub wall_time: Option<u64>,
    /// Print only the summary (text format)
    #[arg(long)]
    pub summary: bool,
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl RunArgs {
    fn resolve_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => SimConfig::default(),
        };
        if let Some(hospitals) = self.hospitals {
            config.hospitals = hospitals;
        }
        if let Some(ambulances) = self.ambulances {
            config.ambulances = ambulances;
        }
        if let Some(speed) = self.speed {
            config.speed = speed;
        }
        if let Some(call_interval) = self.call_interval {
            config.call_interval = call_interval;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        Ok(config)
    }
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = args.resolve_config()?;

    match args.wall_time {
        Some(seconds) => {
            let service = SimulationService::new(&config)?;
            service.start();
            std::thread::sleep(Duration::from_secs(seconds));
            service.stop();
            report(&service.status(), &service.summary(), args)
        }
        None => {
            let horizon = args.sim_time.unwrap_or(DEFAULT_SIM_TIME);
            let mut engine = DispatchEngine::new(&config)?;
            engine.advance_to(horizon)?;
            report(&engine.status(), &engine.summary(), args)
        }
    }
}

fn report(status: &StatusSnapshot, summary: &SummaryReport, args: &RunArgs) -> Result<()> {
    match args.format {
        OutputFormat::Json => output::print_json(status, summary),
        OutputFormat::Text => {
            if !args.summary {
                output::print_status(status);
            }
            output::print_summary(summary);
            Ok(())
        }
    }
}
