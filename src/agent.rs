// Steering unit. Every behaviour produces a heading delta in radians and the
// deltas are stacked onto a live heading, so the order in update_velocity matters.

use crate::geometry::{self, Bounds};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Floor for neighbour radius and optimal separation, both end up as divisors.
pub const MIN_SENSING_DISTANCE: f64 = 1e-3;

pub const DEFAULT_RADIUS: f64 = 10.0;
pub const DEFAULT_COLOUR: &str = "red";
pub const DEFAULT_MAX_TURN_RATE: f64 = FRAC_PI_2;
pub const DEFAULT_NEIGHBOUR_RADIUS: f64 = 150.0;
pub const DEFAULT_SPEED: f64 = 20.0;
pub const DEFAULT_OPTIMAL_SEPARATION: f64 = 100.0;

/// Which steering contributions take part in an update. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Behaviours {
    pub cohesion: bool,
    pub separation: bool,
    pub avoid_walls: bool,
    pub alignment: bool,
}

impl Default for Behaviours {
    fn default() -> Self {
        Self {
            cohesion: true,
            separation: true,
            avoid_walls: true,
            alignment: true,
        }
    }
}

impl Behaviours {
    pub fn none() -> Self {
        Self {
            cohesion: false,
            separation: false,
            avoid_walls: false,
            alignment: false,
        }
    }
}

/// A neighbour as seen by the steering maths.
///
/// `Myself` stands for the steering agent and is resolved against its live
/// state every time a behaviour reads it, so alignment sees its own heading
/// after walls, cohesion and separation already nudged it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Neighbour {
    Myself,
    Other { x: f64, y: f64, heading: f64 },
}

impl Neighbour {
    pub fn of(agent: &Agent) -> Self {
        Neighbour::Other {
            x: agent.x,
            y: agent.y,
            heading: agent.heading,
        }
    }
}

/// Construction parameters for a single agent. Out of range values are
/// sanitized by `Agent::new`, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub colour: String,
    pub max_turn_rate: f64,
    pub neighbour_radius: f64,
    /// Random in [0, 2π) when absent
    pub heading: Option<f64>,
    pub speed: f64,
    pub optimal_separation: f64,
    pub weight_by_misalignment: bool,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            radius: DEFAULT_RADIUS,
            colour: DEFAULT_COLOUR.to_string(),
            max_turn_rate: DEFAULT_MAX_TURN_RATE,
            neighbour_radius: DEFAULT_NEIGHBOUR_RADIUS,
            heading: None,
            speed: DEFAULT_SPEED,
            optimal_separation: DEFAULT_OPTIMAL_SEPARATION,
            weight_by_misalignment: false,
        }
    }
}

impl AgentParams {
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_max_turn_rate(mut self, rate: f64) -> Self {
        self.max_turn_rate = rate;
        self
    }

    pub fn with_neighbour_radius(mut self, radius: f64) -> Self {
        self.neighbour_radius = radius;
        self
    }

    pub fn with_optimal_separation(mut self, separation: f64) -> Self {
        self.optimal_separation = separation;
        self
    }

    pub fn with_misalignment_weighting(mut self, enabled: bool) -> Self {
        self.weight_by_misalignment = enabled;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    x: f64,
    y: f64,
    heading: f64,
    speed: f64,
    vx: f64,
    vy: f64,
    radius: f64,
    colour: String,
    max_turn_rate: f64,
    neighbour_radius: f64,
    optimal_separation: f64,
    weight_by_misalignment: bool,
    bounds: Bounds,
    neighbours: Vec<usize>,
}

impl Agent {
    pub fn new<R: Rng>(params: &AgentParams, bounds: Bounds, rng: &mut R) -> Self {
        let heading = match params.heading {
            Some(h) if h.is_finite() => geometry::normalize_heading(h.clamp(0.0, TAU)),
            _ => rng.gen_range(0.0..TAU),
        };

        Self {
            x: params.x,
            y: params.y,
            heading,
            speed: sanitize_rate(params.speed, DEFAULT_SPEED),
            vx: 0.0,
            vy: 0.0,
            radius: params.radius,
            colour: params.colour.clone(),
            max_turn_rate: sanitize_rate(params.max_turn_rate, DEFAULT_MAX_TURN_RATE),
            neighbour_radius: sanitize_distance(params.neighbour_radius, DEFAULT_NEIGHBOUR_RADIUS),
            optimal_separation: sanitize_distance(
                params.optimal_separation,
                DEFAULT_OPTIMAL_SEPARATION,
            ),
            weight_by_misalignment: params.weight_by_misalignment,
            bounds,
            neighbours: Vec::new(),
        }
    }

    /// Tuning of this agent as construction parameters, without position or heading.
    pub fn params(&self) -> AgentParams {
        AgentParams {
            x: 0.0,
            y: 0.0,
            radius: self.radius,
            colour: self.colour.clone(),
            max_turn_rate: self.max_turn_rate,
            neighbour_radius: self.neighbour_radius,
            heading: None,
            speed: self.speed,
            optimal_separation: self.optimal_separation,
            weight_by_misalignment: self.weight_by_misalignment,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Velocity from the most recent update, zero before the first one.
    pub fn velocity(&self) -> (f64, f64) {
        (self.vx, self.vy)
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn colour(&self) -> &str {
        &self.colour
    }

    pub fn max_turn_rate(&self) -> f64 {
        self.max_turn_rate
    }

    pub fn neighbour_radius(&self) -> f64 {
        self.neighbour_radius
    }

    pub fn optimal_separation(&self) -> f64 {
        self.optimal_separation
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Indices into the owning population, as of this agent's last update.
    pub fn neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn set_speed(&mut self, speed: f64) {
        self.speed = sanitize_rate(speed, self.speed);
    }

    pub fn set_max_turn_rate(&mut self, rate: f64) {
        self.max_turn_rate = sanitize_rate(rate, self.max_turn_rate);
    }

    pub fn set_neighbour_radius(&mut self, radius: f64) {
        self.neighbour_radius = sanitize_distance(radius, self.neighbour_radius);
    }

    pub fn set_optimal_separation(&mut self, separation: f64) {
        self.optimal_separation = sanitize_distance(separation, self.optimal_separation);
    }

    pub fn set_neighbours(&mut self, neighbours: Vec<usize>) {
        self.neighbours = neighbours;
    }

    pub(crate) fn retain_neighbours_below(&mut self, len: usize) {
        self.neighbours.retain(|&i| i < len);
    }

    pub(crate) fn set_position(&mut self, x: f64, y: f64) {
        self.x = x;
        self.y = y;
    }

    pub fn update_position(&mut self, delta_x: f64, delta_y: f64) {
        self.x += delta_x;
        self.y += delta_y;
    }

    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        ((self.x - x).powi(2) + (self.y - y).powi(2)).sqrt()
    }

    /// Indices of every candidate strictly inside the neighbour radius.
    /// The agent itself is not skipped; it sits at distance 0.
    pub fn find_neighbours(&self, candidates: &[Agent]) -> Vec<usize> {
        candidates
            .iter()
            .enumerate()
            .filter(|(_, other)| self.distance_to(other.x, other.y) < self.neighbour_radius)
            .map(|(i, _)| i)
            .collect()
    }

    /// Bearing towards (x, y). Straight above or below (dx == 0) resolves to
    /// -π when the point lies at larger y and to π otherwise, coincident included.
    pub fn heading_to(&self, x: f64, y: f64) -> f64 {
        let dx = x - self.x;
        let dy = y - self.y;
        if dx == 0.0 {
            return if dy > 0.0 { -PI } else { PI };
        }
        let bearing = (dy / dx).atan();
        if dx > 0.0 { bearing } else { bearing + PI }
    }

    /// Turn towards `target`, taking the short way round and scaled so that
    /// a half turn at strength 1 costs exactly `max_turn_rate`.
    pub fn seek(&self, target: f64, strength: f64) -> f64 {
        let delta = geometry::wrap_delta(target - self.heading);
        self.max_turn_rate * strength * delta / PI
    }

    pub fn centre_heading(&self) -> f64 {
        let (cx, cy) = self.bounds.centre();
        self.heading_to(cx, cy)
    }

    pub fn avoid_walls(&self) -> f64 {
        let dist_to_edge = self.bounds.distance_to_edge(self.x, self.y);
        if dist_to_edge >= self.neighbour_radius {
            return 0.0;
        }

        let turn_strength = (self.neighbour_radius - dist_to_edge) / self.neighbour_radius;
        let centre_heading = self.centre_heading();
        let mut delta = self.seek(centre_heading, turn_strength);

        // On (or past) the edge: never leave it pointing more than a right
        // angle away from the centre, or it just slides along the wall
        if dist_to_edge <= 0.0 && delta != 0.0 {
            let off_centre = geometry::signed_angle(self.heading + delta - centre_heading);
            let excess = off_centre.abs() - FRAC_PI_2;
            if excess > 0.0 {
                delta += excess * delta.signum();
            }
        }

        delta
    }

    pub fn seek_centre_neighbours(&self, neighbours: &[Neighbour]) -> f64 {
        let Some((cx, cy)) = self.centroid(neighbours.iter().copied()) else {
            return 0.0;
        };

        let target = self.heading_to(cx, cy);
        let strength = self.distance_to(cx, cy) / self.neighbour_radius;
        self.seek(target, self.misaligned(target, strength))
    }

    pub fn avoid_neighbours(&self, neighbours: &[Neighbour]) -> f64 {
        let too_close = neighbours.iter().copied().filter(|n| {
            let (x, y, _) = self.resolve(*n);
            let d = self.distance_to(x, y);
            d < self.optimal_separation && d != 0.0
        });
        let Some((cx, cy)) = self.centroid(too_close) else {
            return 0.0;
        };

        let target = self.heading_to(cx, cy);
        let strength = (self.optimal_separation - self.distance_to(cx, cy)) / self.optimal_separation;
        -self.seek(target, self.misaligned(target, strength))
    }

    /// Arithmetic mean of neighbour headings. Not a circular mean: {0, π}
    /// averages to π/2, and headings either side of 0 average to roughly π.
    pub fn mean_neighbour_heading(&self, neighbours: &[Neighbour]) -> Option<f64> {
        if neighbours.is_empty() {
            return None;
        }
        let sum: f64 = neighbours.iter().map(|n| self.resolve(*n).2).sum();
        Some(sum / neighbours.len() as f64)
    }

    pub fn align_with_neighbours(&self, neighbours: &[Neighbour]) -> f64 {
        let Some(average) = self.mean_neighbour_heading(neighbours) else {
            return 0.0;
        };

        let mut diff = (average - self.heading).abs();
        if diff > PI {
            diff -= PI;
        }
        self.seek(average, diff / PI)
    }

    /// One steering step: stack the enabled deltas onto the heading in a
    /// fixed order (walls, cohesion, separation, alignment), normalize, then
    /// move by the velocity rounded onto the pixel grid.
    pub fn update_velocity(&mut self, neighbours: &[Neighbour], behaviours: Behaviours) {
        if behaviours.avoid_walls {
            self.heading += self.avoid_walls();
        }
        if behaviours.cohesion {
            self.heading += self.seek_centre_neighbours(neighbours);
        }
        if behaviours.separation {
            self.heading += self.avoid_neighbours(neighbours);
        }
        if behaviours.alignment {
            self.heading += self.align_with_neighbours(neighbours);
        }
        self.heading = geometry::normalize_heading(self.heading);

        self.vx = self.heading.cos() * self.speed;
        self.vy = self.heading.sin() * self.speed;
        let delta_x = geometry::round_half_up(self.vx);
        let delta_y = geometry::round_half_up(self.vy);
        self.update_position(delta_x, delta_y);
    }

    fn resolve(&self, neighbour: Neighbour) -> (f64, f64, f64) {
        match neighbour {
            Neighbour::Myself => (self.x, self.y, self.heading),
            Neighbour::Other { x, y, heading } => (x, y, heading),
        }
    }

    fn centroid(&self, neighbours: impl Iterator<Item = Neighbour>) -> Option<(f64, f64)> {
        let (mut sum_x, mut sum_y, mut count) = (0.0, 0.0, 0usize);
        for n in neighbours {
            let (x, y, _) = self.resolve(n);
            sum_x += x;
            sum_y += y;
            count += 1;
        }
        (count > 0).then(|| (sum_x / count as f64, sum_y / count as f64))
    }

    fn misaligned(&self, target: f64, strength: f64) -> f64 {
        if self.weight_by_misalignment {
            strength * geometry::wrap_delta(target - self.heading).abs() / PI
        } else {
            strength
        }
    }
}

// Speeds and turn rates: magnitude only, non-finite falls back
pub(crate) fn sanitize_rate(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value.abs() } else { fallback }
}

pub(crate) fn sanitize_distance(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.abs().max(MIN_SENSING_DISTANCE)
    } else {
        fallback
    }
}
