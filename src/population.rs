// The simulation world. Owns the plane and every agent, and runs the tick.
//
// Precondition for hosts: tick() and the mutators are never run concurrently
// with each other. &mut self already guarantees that inside one thread; a
// multi-threaded host has to hand the Population to one owner at a time.

use crate::agent::{
    self, Agent, AgentParams, Behaviours, DEFAULT_MAX_TURN_RATE, DEFAULT_NEIGHBOUR_RADIUS,
    DEFAULT_OPTIMAL_SEPARATION, DEFAULT_SPEED, Neighbour,
};
use crate::geometry::{Bounds, MIN_EXTENT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub width: f64,
    pub height: f64,
    pub count: usize,
    pub radius: f64,
    pub colour: String,
    pub speed: f64,
    pub max_turn_rate: f64,
    pub neighbour_radius: f64,
    pub optimal_separation: f64,
    /// Random per agent when absent
    pub initial_heading: Option<f64>,
    pub weight_by_misalignment: bool,
    pub behaviours: Behaviours,
    pub seed: Option<u64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            count: 10,
            radius: 5.0,
            colour: "red".to_string(),
            speed: 25.0,
            max_turn_rate: FRAC_PI_2,
            neighbour_radius: 150.0,
            optimal_separation: 400.0,
            initial_heading: None,
            weight_by_misalignment: false,
            behaviours: Behaviours::default(),
            seed: None,
        }
    }
}

pub struct Population {
    bounds: Bounds,
    agents: Vec<Agent>,
    // global tuning, copied onto each agent, never shared
    template: AgentParams,
    behaviours: Behaviours,
    rng: StdRng,
    ticks: u64,
}

impl Population {
    pub fn new(config: &PopulationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let template = AgentParams {
            x: 0.0,
            y: 0.0,
            radius: config.radius,
            colour: config.colour.clone(),
            max_turn_rate: agent::sanitize_rate(config.max_turn_rate, DEFAULT_MAX_TURN_RATE),
            neighbour_radius: agent::sanitize_distance(
                config.neighbour_radius,
                DEFAULT_NEIGHBOUR_RADIUS,
            ),
            heading: config.initial_heading,
            speed: agent::sanitize_rate(config.speed, DEFAULT_SPEED),
            optimal_separation: agent::sanitize_distance(
                config.optimal_separation,
                DEFAULT_OPTIMAL_SEPARATION,
            ),
            weight_by_misalignment: config.weight_by_misalignment,
        };

        let mut population = Self {
            bounds: Bounds::default(),
            agents: Vec::with_capacity(config.count),
            template,
            behaviours: config.behaviours,
            rng,
            ticks: 0,
        };
        population.bounds = population.sanitize_bounds(config.width, config.height);
        population.set_count(config.count);
        population
    }

    /// Builds a population around pre-made agents, no random spawning.
    /// Bounds are rebroadcast to every agent and neighbour sets refreshed.
    /// Agents added later copy the tuning of the first one.
    pub fn from_agents(bounds: Bounds, agents: Vec<Agent>, behaviours: Behaviours) -> Self {
        let template = agents.first().map(Agent::params).unwrap_or_default();
        let mut population = Self {
            bounds: Bounds::default(),
            agents,
            template,
            behaviours,
            rng: StdRng::from_entropy(),
            ticks: 0,
        };
        population.bounds = population.sanitize_bounds(bounds.width, bounds.height);
        let bounds = population.bounds;
        for agent in &mut population.agents {
            agent.set_bounds(bounds);
        }
        population.refresh_neighbours();
        population
    }

    /// Reseeds the spawner, so later growth lands on reproducible positions.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn behaviours(&self) -> Behaviours {
        self.behaviours
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advances every agent once, in insertion order, against the live
    /// collection: agents moved earlier in the pass are seen at their new
    /// positions by the ones after them. Returns how many were clamped.
    pub fn tick(&mut self) -> usize {
        let mut clamped = 0;

        for i in 0..self.agents.len() {
            let ids = self.agents[i].find_neighbours(&self.agents);
            let views: Vec<Neighbour> = ids
                .iter()
                .map(|&j| {
                    if j == i {
                        Neighbour::Myself
                    } else {
                        Neighbour::of(&self.agents[j])
                    }
                })
                .collect();

            let agent = &mut self.agents[i];
            agent.set_neighbours(ids);
            agent.update_velocity(&views, self.behaviours);

            if self.bounds.contain(agent) {
                trace!("Agent {} clamped to ({}, {})", i, agent.x(), agent.y());
                clamped += 1;
            }
        }

        self.ticks += 1;
        clamped
    }

    /// Same as `Bounds::contain` on the agent at `index`; false when out of range.
    pub fn enforce_containment(&mut self, index: usize) -> bool {
        let bounds = self.bounds;
        self.agents
            .get_mut(index)
            .map(|agent| bounds.contain(agent))
            .unwrap_or(false)
    }

    /// New extent for the plane. Agents learn it straight away but are only
    /// pulled back inside on their next containment check.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.bounds = self.sanitize_bounds(width, height);
        let bounds = self.bounds;
        for agent in &mut self.agents {
            agent.set_bounds(bounds);
        }
        debug!("Population resized to {}x{}", bounds.width, bounds.height);
    }

    /// Grows by spawning at random positions, or shrinks by dropping the tail.
    pub fn set_count(&mut self, count: usize) {
        let current = self.agents.len();

        if count > current {
            for _ in current..count {
                let agent = self.spawn();
                self.agents.push(agent);
            }
            self.refresh_neighbours();
            debug!("Population grew from {} to {} agents", current, count);
        } else if count < current {
            self.agents.truncate(count);
            for agent in &mut self.agents {
                agent.retain_neighbours_below(count);
            }
            debug!("Population shrank from {} to {} agents", current, count);
        }
    }

    pub fn set_speed(&mut self, speed: f64) {
        let Some(speed) = finite("speed", speed) else {
            return;
        };
        self.template.speed = agent::sanitize_rate(speed, self.template.speed);
        let speed = self.template.speed;
        for agent in &mut self.agents {
            agent.set_speed(speed);
        }
    }

    pub fn set_turn_rate(&mut self, rate: f64) {
        let Some(rate) = finite("max_turn_rate", rate) else {
            return;
        };
        self.template.max_turn_rate = agent::sanitize_rate(rate, self.template.max_turn_rate);
        let rate = self.template.max_turn_rate;
        for agent in &mut self.agents {
            agent.set_max_turn_rate(rate);
        }
    }

    pub fn set_neighbour_radius(&mut self, radius: f64) {
        let Some(radius) = finite("neighbour_radius", radius) else {
            return;
        };
        self.template.neighbour_radius = agent::sanitize_distance(radius, self.template.neighbour_radius);
        let radius = self.template.neighbour_radius;
        for agent in &mut self.agents {
            agent.set_neighbour_radius(radius);
        }
    }

    pub fn set_separation(&mut self, separation: f64) {
        let Some(separation) = finite("optimal_separation", separation) else {
            return;
        };
        self.template.optimal_separation = agent::sanitize_distance(separation, self.template.optimal_separation);
        let separation = self.template.optimal_separation;
        for agent in &mut self.agents {
            agent.set_optimal_separation(separation);
        }
    }

    pub fn set_behaviours(&mut self, behaviours: Behaviours) {
        self.behaviours = behaviours;
    }

    fn spawn(&mut self) -> Agent {
        let x = self.rng.gen_range(0.0..self.bounds.width).floor();
        let y = self.rng.gen_range(0.0..self.bounds.height).floor();
        let params = self.template.clone().at(x, y);
        Agent::new(&params, self.bounds, &mut self.rng)
    }

    fn refresh_neighbours(&mut self) {
        // positions don't move here, so order doesn't matter
        let all: Vec<Vec<usize>> = self
            .agents
            .iter()
            .map(|agent| agent.find_neighbours(&self.agents))
            .collect();
        for (agent, ids) in self.agents.iter_mut().zip(all) {
            agent.set_neighbours(ids);
        }
    }

    fn sanitize_bounds(&self, width: f64, height: f64) -> Bounds {
        if !width.is_finite() || !height.is_finite() {
            warn!(
                "Ignoring non-finite plane size {}x{}, keeping {}x{}",
                width, height, self.bounds.width, self.bounds.height
            );
            return self.bounds;
        }
        if width < MIN_EXTENT || height < MIN_EXTENT {
            warn!(
                "Plane size {}x{} below minimum, clamping to at least {}",
                width, height, MIN_EXTENT
            );
        }
        Bounds::new(width.max(MIN_EXTENT), height.max(MIN_EXTENT))
    }
}

fn finite(what: &str, value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        warn!("Ignoring non-finite {}: {}", what, value);
        None
    }
}
