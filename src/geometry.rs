use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

use crate::agent::Agent;

/// Smallest plane extent a population will accept on either axis.
pub const MIN_EXTENT: f64 = 1.0;

/// Extent of the plane, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn centre(&self) -> (f64, f64) {
        (self.width / 2.0, self.height / 2.0)
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }

    /// Distance from (x, y) to the closest of the four edges. Negative when outside.
    pub fn distance_to_edge(&self, x: f64, y: f64) -> f64 {
        x.min(y).min(self.width - x).min(self.height - y)
    }

    /// Moves an escaped agent back exactly onto the boundary, heading untouched.
    /// Only the offending coordinate(s) change. Returns true when a correction was applied.
    pub fn contain(&self, agent: &mut Agent) -> bool {
        let (x, y) = agent.position();
        let clamped_x = x.clamp(0.0, self.width);
        let clamped_y = y.clamp(0.0, self.height);

        if clamped_x != x || clamped_y != y {
            agent.set_position(clamped_x, clamped_y);
            true
        } else {
            false
        }
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// True modulo into [0, 2π), idempotent. Anything non-finite collapses to 0.
pub fn normalize_heading(heading: f64) -> f64 {
    if !heading.is_finite() {
        return 0.0;
    }
    let r = heading % TAU;
    if r >= 0.0 {
        return r;
    }
    // r + 2π rounds up to 2π itself for tiny negative r
    let wrapped = r + TAU;
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Wraps an angular difference into [-π, π] with a single ±2π correction.
/// Steering relies on this exact form, see `signed_angle` for a full wrap.
pub fn wrap_delta(mut delta: f64) -> f64 {
    if delta < -PI {
        delta += TAU;
    } else if delta > PI {
        delta -= TAU;
    }
    delta
}

/// Any angle mapped into [-π, π).
pub fn signed_angle(angle: f64) -> f64 {
    normalize_heading(angle + PI) - PI
}

/// Round to nearest with ties going up (-2.5 -> -2), the pixel-grid rounding
/// used for integrating positions. `f64::round` ties away from zero instead.
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}
