pub mod agent;
pub mod geometry;
pub mod population;
pub mod metrics;
pub mod simulation;

pub use agent::{Agent, AgentParams, Behaviours, Neighbour};
pub use geometry::Bounds;
pub use population::{Population, PopulationConfig};
pub use simulation::{Simulation, SimConfig};
pub use metrics::MetricsCollector;

pub mod prelude {
    pub use crate::agent::{Agent, AgentParams, Behaviours, Neighbour};
    pub use crate::geometry::Bounds;
    pub use crate::population::{Population, PopulationConfig};
    pub use crate::simulation::{Change, ParamChange, Simulation, SimConfig};
    pub use crate::metrics::FlockSnapshot;
    pub use crate::metrics::analyzer::FlockReport;
}
