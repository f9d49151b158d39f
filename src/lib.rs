pub mod error;
pub mod policy;
pub mod game;
pub mod attack;
pub mod agent;
pub mod controllers;
pub mod metrics;
pub mod simulation;

pub use error::{Result, SimError};
pub use policy::PolicyMix;
pub use game::{Equilibrium, EquilibriumSolver, PayoffMatrix, StrategyVector};
pub use attack::{AttackCategory, AttackerModel};
pub use controllers::{Controller, ControllerRegistry};
pub use metrics::MetricsRecorder;
pub use simulation::{Simulation, SimConfig};

pub mod prelude {
    pub use crate::agent::Agent;
    pub use crate::attack::{AttackCategory, AttackerModel, AttackerModelConfig};
    pub use crate::controllers::{Controller, ControllerConfig, ControllerRegistry};
    pub use crate::game::{Equilibrium, EquilibriumSolver, GameConfig, PayoffMatrix, StrategyVector};
    pub use crate::metrics::{Counters, MetricsRecorder, MetricsSnapshot};
    pub use crate::policy::PolicyMix;
    pub use crate::simulation::{Simulation, SimConfig, SimulationReport};
}
