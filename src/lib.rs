//! enersched - energy-aware task scheduling on power-cycled machines
//!
//! Assigns time-windowed tasks to machines over a discretized day so that
//! task energy under a time-varying price, machine idle energy and power
//! cycling costs are minimized, subject to per-machine resource capacities
//! and on/off sequencing rules.
//!
//! The pipeline is [`Instance`] → [`EnergyLedger`] → [`planner::SchedulingModel`]
//! → two [`engine::Engine`] solves driven by [`ScheduleOptimizer`] → [`Schedule`].

pub mod energy;
pub mod engine;
pub mod instance;
pub mod model;
pub mod optimizer;
pub mod planner;
pub mod schedule;
pub mod units;

pub use energy::EnergyLedger;
pub use instance::Instance;
pub use optimizer::{OptimizationReport, OptimizerConfig, ScheduleOptimizer, ScheduleStatus};
pub use schedule::Schedule;
// Re-export unit conversion traits for ergonomic use
pub use units::{convert, SameDim};

/// Identifier type used for tasks and machines.
pub type Id = u64;

/// Generates a new unique run identifier (UUID v4).
pub fn generate_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
