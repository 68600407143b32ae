// Reduces a run's snapshots into one report, the thing sweep and analyze compare

use super::FlockSnapshot;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockReport {
    pub name: String,
    pub ticks: u64,
    pub agents: usize,
    pub mean_polarization: f64,
    pub final_polarization: f64,
    pub peak_polarization: f64,
    pub mean_neighbours: f64,
    pub total_clamped: u64,
    pub centroid_drift: f64, // distance between first and last recorded centroid
}

impl FlockReport {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ticks: 0,
            agents: 0,
            mean_polarization: 0.0,
            final_polarization: 0.0,
            peak_polarization: 0.0,
            mean_neighbours: 0.0,
            total_clamped: 0,
            centroid_drift: 0.0,
        }
    }
}

pub fn analyze(snapshots: &[FlockSnapshot], name: &str) -> FlockReport {
    let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
        return FlockReport::empty(name);
    };

    let n = snapshots.len() as f64;
    let mean_polarization = snapshots.iter().map(|s| s.polarization).sum::<f64>() / n;
    let peak_polarization = snapshots
        .iter()
        .map(|s| s.polarization)
        .fold(0.0, f64::max);
    let mean_neighbours = snapshots.iter().map(|s| s.mean_neighbours).sum::<f64>() / n;
    let total_clamped = snapshots.iter().map(|s| s.clamped as u64).sum();
    let centroid_drift =
        (last.centroid_x - first.centroid_x).hypot(last.centroid_y - first.centroid_y);

    FlockReport {
        name: name.to_string(),
        ticks: last.tick,
        agents: last.agents,
        mean_polarization,
        final_polarization: last.polarization,
        peak_polarization,
        mean_neighbours,
        total_clamped,
        centroid_drift,
    }
}

/// Field-wise mean of several reports, e.g. one per seed.
pub fn average(reports: &[FlockReport], name: &str) -> FlockReport {
    if reports.is_empty() {
        return FlockReport::empty(name);
    }
    let n = reports.len() as f64;
    let mean = |f: fn(&FlockReport) -> f64| reports.iter().map(f).sum::<f64>() / n;

    FlockReport {
        name: name.to_string(),
        ticks: reports.iter().map(|r| r.ticks).max().unwrap_or(0),
        agents: reports.iter().map(|r| r.agents).max().unwrap_or(0),
        mean_polarization: mean(|r| r.mean_polarization),
        final_polarization: mean(|r| r.final_polarization),
        peak_polarization: mean(|r| r.peak_polarization),
        mean_neighbours: mean(|r| r.mean_neighbours),
        total_clamped: (mean(|r| r.total_clamped as f64)).round() as u64,
        centroid_drift: mean(|r| r.centroid_drift),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(tick: u64, polarization: f64, centroid: (f64, f64), clamped: usize) -> FlockSnapshot {
        FlockSnapshot {
            tick,
            agents: 5,
            centroid_x: centroid.0,
            centroid_y: centroid.1,
            polarization,
            mean_neighbours: 2.0,
            clamped,
        }
    }

    #[test]
    fn empty_run_gives_zeroed_report() {
        assert_eq!(analyze(&[], "nothing"), FlockReport::empty("nothing"));
    }

    #[test]
    fn report_summarizes_run() {
        let snapshots = [
            snapshot(1, 0.2, (0.0, 0.0), 1),
            snapshot(2, 0.8, (1.0, 1.0), 0),
            snapshot(3, 0.5, (3.0, 4.0), 2),
        ];
        let report = analyze(&snapshots, "run");
        assert_eq!(report.ticks, 3);
        assert!((report.mean_polarization - 0.5).abs() < 1e-12);
        assert_eq!(report.peak_polarization, 0.8);
        assert_eq!(report.final_polarization, 0.5);
        assert_eq!(report.total_clamped, 3);
        assert_eq!(report.centroid_drift, 5.0);
    }

    #[test]
    fn averaging_reports() {
        let a = analyze(&[snapshot(1, 0.2, (0.0, 0.0), 2)], "a");
        let b = analyze(&[snapshot(1, 0.6, (0.0, 0.0), 4)], "b");
        let avg = average(&[a, b], "both");
        assert_eq!(avg.name, "both");
        assert!((avg.mean_polarization - 0.4).abs() < 1e-12);
        assert_eq!(avg.total_clamped, 3);
    }
}
