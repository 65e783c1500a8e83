//! Power-on segment chain of one machine.

use crate::energy::EnergyLedger;
use crate::instance::Machine;
use crate::model::{
    CostTerm, CumulId, IntervalId, IntervalVar, Model, ModelError, StateId, Valuation,
};
use crate::schedule::{MachineSchedule, ScheduleError};
use crate::Id;

/// Ordered chain of optional "on" segments for one machine.
///
/// Segment `i` may only be present when segment `i - 1` is, and must start at
/// least `min_gap` slots after it ends. The `on_off` cumul counts present
/// segments at each slot; `running` is true exactly over their union.
#[derive(Debug, Clone)]
pub struct MachineTimeline {
    machine_id: Id,
    segments: Vec<IntervalId>,
    on_off: CumulId,
    running: StateId,
}

impl MachineTimeline {
    /// Declares `segment_count` segments over the model horizon.
    pub fn build(
        model: &mut Model,
        machine: &Machine,
        segment_count: usize,
        min_gap: usize,
    ) -> Result<Self, ModelError> {
        let horizon = model.horizon();
        let on_off = model.cumul(format!("machine{}.on_off", machine.id));

        let mut segments = Vec::with_capacity(segment_count);
        for i in 0..segment_count {
            let segment = model.interval_var(
                IntervalVar::variable_length(
                    format!("machine{}.segment{}", machine.id, i),
                    0,
                    horizon,
                    1,
                    horizon,
                )
                .optional(),
            );
            model.add_pulse(on_off, segment, 1.0)?;
            segments.push(segment);
        }

        let running = model.add_segment_chain(
            format!("machine{}.running", machine.id),
            segments.clone(),
            min_gap,
        )?;

        Ok(Self {
            machine_id: machine.id,
            segments,
            on_off,
            running,
        })
    }

    pub fn machine_id(&self) -> Id {
        self.machine_id
    }

    pub fn segments(&self) -> &[IntervalId] {
        &self.segments
    }

    pub fn on_off(&self) -> CumulId {
        self.on_off
    }

    pub fn running(&self) -> StateId {
        self.running
    }

    /// Requires the machine to be powered throughout `candidate` when present.
    pub fn bind(&self, model: &mut Model, candidate: IntervalId) -> Result<(), ModelError> {
        model.add_always_true(self.running, candidate)?;
        model.add_always_in(self.on_off, candidate, 1.0, 1.0)
    }

    /// Idle energy and power-cycle cost of each segment.
    pub fn cycling_terms(&self, machine: &Machine, ledger: &EnergyLedger) -> Vec<CostTerm> {
        let prefix = ledger.prefix_sums();
        let cycle = machine.cycle_cost();
        self.segments
            .iter()
            .flat_map(|&segment| {
                [
                    CostTerm::SpanIntegral {
                        interval: segment,
                        prefix: prefix.clone(),
                        weight: machine.idle_consumption,
                    },
                    CostTerm::Presence {
                        interval: segment,
                        weight: cycle,
                    },
                ]
            })
            .collect()
    }

    /// Present segments of `values`, in chain order.
    pub fn decode(&self, values: &Valuation) -> Result<MachineSchedule, ScheduleError> {
        let mut schedule = MachineSchedule::new(self.machine_id);
        for span in self.segments.iter().filter_map(|&s| values.get(s).span()) {
            schedule.add_segment(span)?;
        }
        Ok(schedule)
    }
}
