// flocksim: headless boids. Agents steer by cohesion, separation, alignment
// and the walls of the plane, nothing is drawn, everything is measured.

// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use flocksim::metrics::analyzer::{self, FlockReport};
use flocksim::metrics::logger;
use flocksim::prelude::*;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// One paced run, results go to the output directory
    Run {
        #[command(flatten)]
        overrides: Overrides,
        #[arg(long)]
        frame_interval_ms: Option<u64>,
    },

    /// Same flock over several seeds, in parallel, unpaced
    Sweep {
        #[command(flatten)]
        overrides: Overrides,
        #[arg(long, default_value = "1,2,3,4")]
        seeds: String,
    },

    Analyze {
        #[arg(default_value = "results")]
        path: PathBuf,
    },

    /// Print the default config as JSON
    Defaults,
}

#[derive(Args)]
struct Overrides {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(short = 'n', long)]
    agents: Option<usize>,
    #[arg(short, long)]
    ticks: Option<u64>,
    #[arg(long)]
    width: Option<f64>,
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    speed: Option<f64>,
    #[arg(long)]
    turn_rate: Option<f64>,
    #[arg(long)]
    neighbour_radius: Option<f64>,
    #[arg(long)]
    separation: Option<f64>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    no_cohesion: bool,
    #[arg(long)]
    no_separation: bool,
    #[arg(long)]
    no_alignment: bool,
    #[arg(long)]
    no_walls: bool,
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Overrides {
    // file (or defaults) first, flags on top
    fn resolve(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_file(path)?,
            None => SimConfig::default(),
        };

        if let Some(name) = &self.name {
            config.name = name.clone();
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(output) = &self.output {
            config.output_dir = output.clone();
        }

        let p = &mut config.population;
        p.count = self.agents.unwrap_or(p.count);
        p.width = self.width.unwrap_or(p.width);
        p.height = self.height.unwrap_or(p.height);
        p.speed = self.speed.unwrap_or(p.speed);
        p.max_turn_rate = self.turn_rate.unwrap_or(p.max_turn_rate);
        p.neighbour_radius = self.neighbour_radius.unwrap_or(p.neighbour_radius);
        p.optimal_separation = self.separation.unwrap_or(p.optimal_separation);
        p.seed = self.seed.or(p.seed);
        p.behaviours.cohesion &= !self.no_cohesion;
        p.behaviours.separation &= !self.no_separation;
        p.behaviours.alignment &= !self.no_alignment;
        p.behaviours.avoid_walls &= !self.no_walls;

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { overrides, frame_interval_ms } => {
            let mut config = overrides.resolve()?;
            if let Some(ms) = frame_interval_ms {
                config.frame_interval_ms = ms;
            }

            info!("flocksim: Single Run");
            let mut sim = Simulation::new(config);
            sim.run().await?;
        }

        Commands::Sweep { overrides, seeds } => {
            let config = overrides.resolve()?;
            let seeds = parse_seeds(&seeds)?;
            sweep(config, &seeds)?;
        }

        Commands::Analyze { path } => {
            analyze_results(&path)?;
        }

        Commands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&SimConfig::default())?);
        }
    }

    let total_time = program_start.elapsed();
    info!("Total runtime: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

fn parse_seeds(seeds: &str) -> Result<Vec<u64>> {
    let parsed = seeds
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().map_err(|e| anyhow::anyhow!("Bad seed '{}': {}", s, e)))
        .collect::<Result<Vec<_>>>()?;
    if parsed.is_empty() {
        anyhow::bail!("No seeds given");
    }
    Ok(parsed)
}

fn sweep(config: SimConfig, seeds: &[u64]) -> Result<()> {
    info!("flocksim: Sweep");
    info!("Seeds: {:?}", seeds);
    info!("Agents: {}, Ticks: {}", config.population.count, config.ticks);

    // One population per worker, nothing shared between them
    let mut reports: Vec<FlockReport> = seeds
        .par_iter()
        .map(|&seed| {
            let run = config
                .clone()
                .with_seed(seed)
                .with_name(format!("{}_seed{}", config.name, seed));
            Simulation::new(run).run_blocking()
        })
        .collect();

    reports.push(analyzer::average(&reports, &format!("{}_mean", config.name)));
    comparison_table(&reports);

    std::fs::create_dir_all(&config.output_dir)?;
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let path = config
        .output_dir
        .join(format!("sweep_{}_{}.json", config.name, timestamp));
    std::fs::write(&path, serde_json::to_string_pretty(&reports)?)?;
    info!("Sweep saved to: {}", path.display());

    Ok(())
}

fn analyze_results(path: &Path) -> Result<()> {
    use std::fs;

    info!("Analyzing results in: {}", path.display());

    let mut reports = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        match path.extension().and_then(|s| s.to_str()) {
            Some("json") if stem.ends_with("_analysis") => {
                let content = fs::read_to_string(&path)?;
                let report: FlockReport = serde_json::from_str(&content)?;
                reports.push(report);
            }
            // run logs whose analysis went missing are re-analyzed from the rows
            Some("csv") if !path.with_file_name(format!("{stem}_analysis.json")).exists() => {
                let snapshots = logger::read_run(&path)?;
                reports.push(analyzer::analyze(&snapshots, stem));
            }
            _ => {}
        }
    }

    if reports.is_empty() {
        info!("No analysis files found.");
        return Ok(());
    }

    comparison_table(&reports);

    Ok(())
}

fn comparison_table(reports: &[FlockReport]) {
    println!("\n╔══════════════════════╦═══════╦════════╦══════════╦══════════╦════════════╦═════════╗");
    println!("║ Run                  ║ Ticks ║ Agents ║ Mean pol ║ Peak pol ║ Neighbours ║ Clamps  ║");
    println!("╠══════════════════════╬═══════╬════════╬══════════╬══════════╬════════════╬═════════╣");

    for report in reports {
        println!(
            "║ {:<20} ║ {:>5} ║ {:>6} ║ {:>8.3} ║ {:>8.3} ║ {:>10.2} ║ {:>7} ║",
            truncate(&report.name, 20),
            report.ticks,
            report.agents,
            report.mean_polarization,
            report.peak_polarization,
            report.mean_neighbours,
            report.total_clamped,
        );
    }

    println!("╚══════════════════════╩═══════╩════════╩══════════╩══════════╩════════════╩═════════╝\n");

    if let Some(most_ordered) = reports
        .iter()
        .max_by(|a, b| a.mean_polarization.total_cmp(&b.mean_polarization))
    {
        println!(
            "Most ordered: {} ({:.3})",
            most_ordered.name, most_ordered.mean_polarization
        );
    }

    println!();
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max - 1).chain(std::iter::once('…')).collect()
    }
}
