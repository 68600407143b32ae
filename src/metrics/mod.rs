pub mod logger;
pub mod analyzer;

use crate::population::Population;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use parking_lot::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockSnapshot {
    pub tick: u64,
    pub agents: usize,
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub polarization: f64, // length of the mean unit heading, 1 = everyone heading the same way
    pub mean_neighbours: f64,
    pub clamped: usize,
}

impl FlockSnapshot {
    pub fn capture(population: &Population, clamped: usize) -> Self {
        let agents = population.agents();
        let n = agents.len();

        if n == 0 {
            return Self {
                tick: population.ticks(),
                agents: 0,
                centroid_x: 0.0,
                centroid_y: 0.0,
                polarization: 0.0,
                mean_neighbours: 0.0,
                clamped,
            };
        }

        let count = n as f64;
        let centroid_x = agents.iter().map(|a| a.x()).sum::<f64>() / count;
        let centroid_y = agents.iter().map(|a| a.y()).sum::<f64>() / count;
        let sum_cos = agents.iter().map(|a| a.heading().cos()).sum::<f64>();
        let sum_sin = agents.iter().map(|a| a.heading().sin()).sum::<f64>();
        let polarization = (sum_cos.hypot(sum_sin) / count).min(1.0);
        let mean_neighbours = agents.iter().map(|a| a.neighbours().len()).sum::<usize>() as f64 / count;

        Self {
            tick: population.ticks(),
            agents: n,
            centroid_x,
            centroid_y,
            polarization,
            mean_neighbours,
            clamped,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<RwLock<MetricsInner>>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    total_clamped: u64,
    snapshots: Vec<FlockSnapshot>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, snapshot: FlockSnapshot) {
        let mut inner = self.inner.write();
        inner.total_clamped += snapshot.clamped as u64;
        inner.snapshots.push(snapshot);
    }

    pub fn latest(&self) -> Option<FlockSnapshot> {
        self.inner.read().snapshots.last().cloned()
    }

    pub fn total_clamped(&self) -> u64 {
        self.inner.read().total_clamped
    }

    pub fn len(&self) -> usize {
        self.inner.read().snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_snapshots(&self) -> Vec<FlockSnapshot> {
        self.inner.read().snapshots.clone()
    }
}
