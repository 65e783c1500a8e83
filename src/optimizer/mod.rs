//! Two-phase schedule optimization.
//!
//! Phase 1 places tasks minimizing task energy only. Its solution and proven
//! lower bound seed phase 2, which adds machine idle energy and power cycling
//! to the objective, floors it at the phase-1 bound and re-optimizes from the
//! phase-1 placement. The phases run strictly one after the other.

mod config;
mod error;


pub use config::OptimizerConfig;
pub use error::OptimizerError;

use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::energy::EnergyLedger;
use crate::engine::{DepthFirstEngine, Engine, Solution, SolveParams, SolveStatus};
use crate::instance::Instance;
use crate::planner::SchedulingModel;
use crate::schedule::Schedule;

/// Overall outcome of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScheduleStatus {
    /// The schedule minimizes the full cost.
    Optimal,
    /// A valid schedule whose optimality was not proven.
    Feasible,
    /// No task placement was found; phase 2 never ran.
    Infeasible,
}

/// What one phase's solve reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PhaseSummary {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub lower_bound: f64,
    pub nodes: u64,
    pub elapsed: Duration,
}

impl From<&Solution> for PhaseSummary {
    fn from(solution: &Solution) -> Self {
        Self {
            status: solution.status,
            objective: solution.objective,
            lower_bound: solution.lower_bound,
            nodes: solution.stats.nodes,
            elapsed: solution.stats.elapsed,
        }
    }
}

/// Result of [`ScheduleOptimizer::optimize`].
#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub run_id: String,
    pub status: ScheduleStatus,
    pub schedule: Option<Schedule>,
    pub phase1: PhaseSummary,
    pub phase2: Option<PhaseSummary>,
}

impl OptimizationReport {
    pub fn is_feasible(&self) -> bool {
        self.schedule.is_some()
    }

    pub fn total_cost(&self) -> Option<f64> {
        self.schedule.as_ref().map(|s| s.cost().total())
    }
}

/// Drives an [`Engine`] through the two optimization phases.
#[derive(Debug, Clone)]
pub struct ScheduleOptimizer<E = DepthFirstEngine> {
    engine: E,
    config: OptimizerConfig,
}

impl ScheduleOptimizer<DepthFirstEngine> {
    pub fn with_config(config: OptimizerConfig) -> Self {
        Self::new(DepthFirstEngine::default(), config)
    }
}

impl Default for ScheduleOptimizer<DepthFirstEngine> {
    fn default() -> Self {
        Self::with_config(OptimizerConfig::default())
    }
}

impl<E: Engine> ScheduleOptimizer<E> {
    pub fn new(engine: E, config: OptimizerConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Validates `instance`, builds its model and runs both phases.
    ///
    /// # Errors
    ///
    /// Malformed instances and ill-formed models are errors. An infeasible
    /// instance or an exhausted time budget is reported through
    /// [`OptimizationReport::status`] instead.
    pub fn optimize(&self, instance: &Instance) -> Result<OptimizationReport, OptimizerError> {
        let run_id = crate::generate_run_id();
        let span = info_span!("optimize", run_id = %run_id);
        let _guard = span.enter();

        let horizon = instance.validate()?;
        debug!(
            horizon,
            machines = instance.machines.len(),
            tasks = instance.tasks.len(),
            "instance validated"
        );
        let ledger = EnergyLedger::new(&instance.energy_prices);
        let model = SchedulingModel::build(instance, &ledger, &self.config.timeline_options())?;

        let phase1 = self
            .engine
            .solve(&model.task_energy_model()?, &self.params(self.config.phase1_time_limit));
        let phase1_summary = PhaseSummary::from(&phase1);
        log_phase(1, &phase1_summary);

        let Some(placement) = phase1.values else {
            info!(status = ?phase1.status, "no task placement found, skipping phase 2");
            return Ok(OptimizationReport {
                run_id,
                status: ScheduleStatus::Infeasible,
                schedule: None,
                phase1: phase1_summary,
                phase2: None,
            });
        };

        let phase2 = self.engine.solve(
            &model.full_cost_model(phase1.lower_bound)?,
            &self
                .params(self.config.phase2_time_limit)
                .warm_start(placement.clone()),
        );
        let phase2_summary = PhaseSummary::from(&phase2);
        log_phase(2, &phase2_summary);

        let (status, values) = match phase2.values {
            Some(values) if phase2.status.is_optimal() => (ScheduleStatus::Optimal, values),
            Some(values) => {
                warn!(
                    objective = ?phase2.objective,
                    lower_bound = phase2.lower_bound,
                    "full-cost phase stopped before proving optimality"
                );
                (ScheduleStatus::Feasible, values)
            }
            None => {
                warn!(
                    status = ?phase2.status,
                    "full-cost phase found no schedule, keeping the phase 1 placement"
                );
                (ScheduleStatus::Feasible, placement)
            }
        };

        let schedule = model.decode(instance, &ledger, &values)?;
        schedule.verify(instance, self.config.min_segment_gap)?;
        let cost = schedule.cost();
        info!(
            status = ?status,
            total = cost.total(),
            task_energy = cost.task_energy,
            machine_cycling = cost.machine_cycling(),
            "schedule ready"
        );

        Ok(OptimizationReport {
            run_id,
            status,
            schedule: Some(schedule),
            phase1: phase1_summary,
            phase2: Some(phase2_summary),
        })
    }

    fn params(&self, time_limit: Duration) -> SolveParams {
        let params = SolveParams::with_time_limit(time_limit);
        match self.config.node_limit {
            Some(limit) => params.node_limit(limit),
            None => params,
        }
    }
}

fn log_phase(phase: u8, summary: &PhaseSummary) {
    info!(
        phase,
        status = ?summary.status,
        objective = ?summary.objective,
        lower_bound = summary.lower_bound,
        nodes = summary.nodes,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "phase finished"
    );
}
