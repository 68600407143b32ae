pub mod config;
pub use config::{Change, ParamChange, SimConfig};

use crate::metrics::analyzer::{self, FlockReport};
use crate::metrics::logger;
use crate::metrics::{FlockSnapshot, MetricsCollector};
use crate::population::Population;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// Cancels the token on ctrl-c; the signal task goes away with the guard.
struct CtrlCListener {
    handle: JoinHandle<()>,
}

impl CtrlCListener {
    fn spawn(token: CancellationToken) -> Self {
        let handle = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        });
        Self { handle }
    }
}

impl Drop for CtrlCListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Headless host around a Population: paces ticks, applies the parameter
/// schedule and records metrics. Owns the population outright, so ticks are
/// never run concurrently.
pub struct Simulation {
    config: SimConfig,
    population: Population,
    pub metrics: MetricsCollector,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let population = Population::new(&config.population);
        Self {
            config,
            population,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn population_mut(&mut self) -> &mut Population {
        &mut self.population
    }

    /// One tick: scheduled changes due now, then the population step.
    pub fn step(&mut self) -> FlockSnapshot {
        self.apply_schedule();
        let clamped = self.population.tick();
        let snapshot = FlockSnapshot::capture(&self.population, clamped);
        self.metrics.record(snapshot.clone());
        snapshot
    }

    /// Runs every configured tick back to back, no pacing and no output files.
    pub fn run_blocking(&mut self) -> FlockReport {
        for _ in 0..self.config.ticks {
            self.step();
        }
        self.report()
    }

    pub fn report(&self) -> FlockReport {
        analyzer::analyze(&self.metrics.get_snapshots(), &self.config.name)
    }

    pub async fn run(&mut self) -> Result<()> {
        info!("Starting simulation: {}", self.config.name);
        info!(
            "Agents: {}, Plane: {}x{}",
            self.population.len(),
            self.population.bounds().width,
            self.population.bounds().height
        );
        info!("Ticks: {} every {}ms", self.config.ticks, self.config.frame_interval_ms);

        let cancel_token = CancellationToken::new(); // ctrl-c just stops us calling tick()
        let _listener = CtrlCListener::spawn(cancel_token.clone());

        let pb = ProgressBar::new(self.config.ticks);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.orange/yellow} {pos}/{len} ticks {msg}")?
                .progress_chars("█▓░"),
        );

        // Late frames are skipped rather than bunched up
        let mut pacing = (self.config.frame_interval_ms > 0).then(|| {
            let mut tick = interval(Duration::from_millis(self.config.frame_interval_ms));
            tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
            tick
        });

        for _ in 0..self.config.ticks {
            if let Some(tick) = pacing.as_mut() {
                tokio::select! {
                    _ = tick.tick() => {}
                    _ = cancel_token.cancelled() => {
                        warn!("Interrupted after {} ticks", self.population.ticks());
                        break;
                    }
                }
            } else if cancel_token.is_cancelled() {
                warn!("Interrupted after {} ticks", self.population.ticks());
                break;
            }

            let snapshot = self.step();
            pb.inc(1);
            pb.set_message(format!(
                "Polarization: {:.3} | Neighbours: {:.1}",
                snapshot.polarization, snapshot.mean_neighbours
            ));

            if pacing.is_none() {
                tokio::task::yield_now().await; // give the ctrl-c task a chance
            }
        }

        pb.finish_with_message("Simulation complete");

        let report = self.report();
        self.save_results(&report)?;
        Ok(())
    }

    fn apply_schedule(&mut self) {
        let now = self.population.ticks();
        for entry in self.config.schedule.iter().filter(|c| c.at_tick == now) {
            debug!("Tick {}: applying {:?}", now, entry.change);
            match entry.change {
                Change::Speed { value } => self.population.set_speed(value),
                Change::TurnRate { value } => self.population.set_turn_rate(value),
                Change::NeighbourRadius { value } => self.population.set_neighbour_radius(value),
                Change::Separation { value } => self.population.set_separation(value),
                Change::Count { value } => self.population.set_count(value),
                Change::Resize { width, height } => self.population.resize(width, height),
            }
        }
    }

    fn save_results(&self, report: &FlockReport) -> Result<()> {
        let snapshots = self.metrics.get_snapshots();
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");

        std::fs::create_dir_all(&self.config.output_dir)?;

        let csv_path = self.output_path(&format!("{}_{}.csv", self.config.name, timestamp));
        logger::write_run(&csv_path, &snapshots)?;
        info!("Results saved to: {}", csv_path.display());

        let json_path =
            self.output_path(&format!("{}_{}_analysis.json", self.config.name, timestamp));
        std::fs::write(&json_path, serde_json::to_string_pretty(report)?)?;
        info!("Analysis saved to: {}", json_path.display());

        info!("Mean polarization: {:.3}", report.mean_polarization);
        info!("Final polarization: {:.3}", report.final_polarization);
        info!("Mean neighbours: {:.2}", report.mean_neighbours);
        info!("Wall clamps: {}", report.total_clamped);

        Ok(())
    }

    fn output_path(&self, file: &str) -> PathBuf {
        self.config.output_dir.join(file)
    }
}
