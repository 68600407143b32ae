use crate::population::PopulationConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub name: String,
    pub ticks: u64,
    pub frame_interval_ms: u64, // 0 = as fast as possible
    pub output_dir: PathBuf,
    pub population: PopulationConfig,
    pub schedule: Vec<ParamChange>,
}

/// A live tweak applied between two ticks, the headless stand-in for the UI sliders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamChange {
    pub at_tick: u64,
    pub change: Change,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    Speed { value: f64 },
    TurnRate { value: f64 },
    NeighbourRadius { value: f64 },
    Separation { value: f64 },
    Count { value: usize },
    Resize { width: f64, height: f64 },
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            name: "default_flock".to_string(),
            ticks: 1000,
            frame_interval_ms: 25,
            output_dir: PathBuf::from("results"),
            population: PopulationConfig {
                count: 500,
                ..PopulationConfig::default()
            },
            schedule: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_ticks(mut self, ticks: u64) -> Self {
        self.ticks = ticks;
        self
    }

    pub fn with_frame_interval_ms(mut self, ms: u64) -> Self {
        self.frame_interval_ms = ms;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.population.seed = Some(seed);
        self
    }

    pub fn with_population(mut self, population: PopulationConfig) -> Self {
        self.population = population;
        self
    }

    pub fn with_change(mut self, at_tick: u64, change: Change) -> Self {
        self.schedule.push(ParamChange { at_tick, change });
        self
    }
}
