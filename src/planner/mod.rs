//! Translation of an [`Instance`] into a [`Model`].
//!
//! A [`SchedulingModel`] owns one shared base model holding every variable and
//! constraint, together with per-machine [`MachineTimeline`]s, the machine by
//! resource [`ResourceLedger`] and one [`TaskAssignment`] per task. The two
//! optimization phases only differ in the objective they attach to copies of
//! that base, so a valuation of one phase is a valid warm start for the other.

mod assignment;
mod resources;
mod timeline;

#[cfg(test)]
mod tests;

pub use assignment::TaskAssignment;
pub use resources::ResourceLedger;
pub use timeline::MachineTimeline;

use tracing::debug;

use crate::energy::EnergyLedger;
use crate::instance::Instance;
use crate::model::{CostTerm, Model, ModelError, Valuation};
use crate::schedule::{Schedule, ScheduleError};

/// Shape of each machine's segment chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineOptions {
    /// Segments per machine; `min(horizon, tasks)` when unset.
    pub max_segments_per_machine: Option<usize>,
    /// Minimum number of off slots between two consecutive segments.
    pub min_segment_gap: usize,
}

impl Default for TimelineOptions {
    fn default() -> Self {
        Self {
            max_segments_per_machine: None,
            min_segment_gap: 1,
        }
    }
}

impl TimelineOptions {
    pub fn segment_count(&self, horizon: usize, tasks: usize) -> usize {
        self.max_segments_per_machine
            .unwrap_or_else(|| horizon.min(tasks))
    }
}

/// Base model of an instance plus the handles needed to price and decode it.
#[derive(Debug, Clone)]
pub struct SchedulingModel {
    base: Model,
    timelines: Vec<MachineTimeline>,
    resources: ResourceLedger,
    assignments: Vec<TaskAssignment>,
    task_terms: Vec<CostTerm>,
    machine_terms: Vec<CostTerm>,
}

impl SchedulingModel {
    /// Declares timelines, resource profiles and task assignments for a
    /// validated instance whose horizon matches `ledger`.
    pub fn build(
        instance: &Instance,
        ledger: &EnergyLedger,
        options: &TimelineOptions,
    ) -> Result<Self, ModelError> {
        let horizon = ledger.horizon();
        let mut base = Model::new("schedule", horizon);
        let segment_count = options.segment_count(horizon, instance.tasks.len());

        let timelines = instance
            .machines
            .iter()
            .map(|m| MachineTimeline::build(&mut base, m, segment_count, options.min_segment_gap))
            .collect::<Result<Vec<_>, _>>()?;
        let resources = ResourceLedger::build(&mut base, &instance.machines)?;
        let assignments = instance
            .tasks
            .iter()
            .map(|t| {
                TaskAssignment::build(&mut base, t, &instance.machines, &timelines, &resources)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let task_terms = assignments
            .iter()
            .zip(&instance.tasks)
            .map(|(a, t)| a.energy_term(t, ledger))
            .collect();
        let machine_terms = timelines
            .iter()
            .zip(&instance.machines)
            .flat_map(|(tl, m)| tl.cycling_terms(m, ledger))
            .collect();

        // Place tasks first; segments then only have to cover them.
        let order = assignments
            .iter()
            .flat_map(TaskAssignment::decision_order)
            .chain(timelines.iter().flat_map(|tl| tl.segments().iter().copied()))
            .collect();
        base.set_search_phase(order)?;

        debug!(
            machines = timelines.len(),
            tasks = assignments.len(),
            segments_per_machine = segment_count,
            intervals = base.interval_count(),
            constraints = base.constraint_count(),
            "scheduling model built"
        );

        Ok(Self {
            base,
            timelines,
            resources,
            assignments,
            task_terms,
            machine_terms,
        })
    }

    pub fn base(&self) -> &Model {
        &self.base
    }

    pub fn timelines(&self) -> &[MachineTimeline] {
        &self.timelines
    }

    pub fn resources(&self) -> &ResourceLedger {
        &self.resources
    }

    pub fn assignments(&self) -> &[TaskAssignment] {
        &self.assignments
    }

    /// Base model minimizing task energy only.
    pub fn task_energy_model(&self) -> Result<Model, ModelError> {
        self.with_terms(self.task_terms.iter())
    }

    /// Base model minimizing task energy plus machine idle energy and power
    /// cycling, rejecting any objective below `floor`.
    pub fn full_cost_model(&self, floor: f64) -> Result<Model, ModelError> {
        let mut model = self.with_terms(self.task_terms.iter().chain(&self.machine_terms))?;
        model.set_objective_floor(floor);
        Ok(model)
    }

    fn with_terms<'a>(
        &self,
        terms: impl Iterator<Item = &'a CostTerm>,
    ) -> Result<Model, ModelError> {
        let mut model = self.base.clone();
        model.clear_objective();
        for term in terms {
            model.add_cost(term.clone())?;
        }
        Ok(model)
    }

    /// Reads placements and segments out of `values` and prices them.
    pub fn decode(
        &self,
        instance: &Instance,
        ledger: &EnergyLedger,
        values: &Valuation,
    ) -> Result<Schedule, ScheduleError> {
        let mut schedule = Schedule::new();
        for assignment in &self.assignments {
            let placement = assignment
                .decode(values)
                .ok_or(ScheduleError::UnplacedTask(assignment.task_id()))?;
            schedule.add_placement(placement)?;
        }
        for timeline in &self.timelines {
            schedule.add_machine(timeline.decode(values)?)?;
        }
        schedule.price(instance, ledger);
        Ok(schedule)
    }
}
