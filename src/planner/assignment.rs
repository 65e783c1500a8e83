use crate::energy::EnergyLedger;
use crate::instance::{Machine, Task};
use crate::model::{CostTerm, IntervalId, IntervalVar, Model, ModelError, Valuation};
use crate::schedule::TaskPlacement;
use crate::Id;

use super::resources::ResourceLedger;
use super::timeline::MachineTimeline;

/// Master interval of a task plus one optional candidate per machine.
///
/// Exactly one candidate is present and it shares the master's span.
#[derive(Debug, Clone)]
pub struct TaskAssignment {
    task_id: Id,
    master: IntervalId,
    /// `(machine id, candidate)` in machine order.
    candidates: Vec<(Id, IntervalId)>,
}

impl TaskAssignment {
    /// Declares the task's intervals and binds each candidate to its
    /// machine's timeline and resource profiles.
    ///
    /// `machines`, `timelines` and the ledger rows are expected in the same
    /// order. Without machines the task cannot be placed and any solve of
    /// the model is infeasible.
    pub fn build(
        model: &mut Model,
        task: &Task,
        machines: &[Machine],
        timelines: &[MachineTimeline],
        resources: &ResourceLedger,
    ) -> Result<Self, ModelError> {
        let master = model.interval_var(IntervalVar::fixed_length(
            format!("task{}", task.id),
            task.earliest_start,
            task.latest_end,
            task.duration,
        ));

        let mut candidates = Vec::with_capacity(machines.len());
        for (m, (machine, timeline)) in machines.iter().zip(timelines).enumerate() {
            let candidate = model.interval_var(
                IntervalVar::fixed_length(
                    format!("task{}@machine{}", task.id, machine.id),
                    task.earliest_start,
                    task.latest_end,
                    task.duration,
                )
                .optional(),
            );
            timeline.bind(model, candidate)?;
            resources.feed(model, m, candidate, &task.resource_usage)?;
            candidates.push((machine.id, candidate));
        }

        model.add_alternative(master, candidates.iter().map(|&(_, c)| c).collect())?;

        Ok(Self {
            task_id: task.id,
            master,
            candidates,
        })
    }

    pub fn task_id(&self) -> Id {
        self.task_id
    }

    pub fn master(&self) -> IntervalId {
        self.master
    }

    pub fn candidates(&self) -> &[(Id, IntervalId)] {
        &self.candidates
    }

    /// Variables in branching order: the master, then its candidates.
    pub fn decision_order(&self) -> impl Iterator<Item = IntervalId> + '_ {
        std::iter::once(self.master).chain(self.candidates.iter().map(|&(_, c)| c))
    }

    /// Energy of the task as a function of its start.
    ///
    /// Charged on the master, which always shares the span of the single
    /// realized candidate.
    pub fn energy_term(&self, task: &Task, ledger: &EnergyLedger) -> CostTerm {
        CostTerm::StartTable {
            interval: self.master,
            table: ledger.window_costs(task.duration),
            weight: task.power_consumption,
        }
    }

    /// Machine and span of the realized candidate.
    pub fn decode(&self, values: &Valuation) -> Option<TaskPlacement> {
        self.candidates.iter().find_map(|&(machine_id, candidate)| {
            values.get(candidate).span().map(|span| TaskPlacement {
                task_id: self.task_id,
                machine_id,
                span,
            })
        })
    }
}
