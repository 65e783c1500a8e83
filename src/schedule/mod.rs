use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::energy::EnergyLedger;
use crate::instance::Instance;
use crate::model::{SlotInterval, StepProfile, TOLERANCE};
use crate::Id;

pub mod errors;
pub use errors::ScheduleError;


/// Where and when one task runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskPlacement {
    pub task_id: Id,
    pub machine_id: Id,
    pub span: SlotInterval,
}

/// Power-on segments of one machine, non-overlapping and sorted by start.
///
/// # Examples
///
/// ```
/// use enersched::model::SlotInterval;
/// use enersched::schedule::MachineSchedule;
///
/// let mut machine = MachineSchedule::new(1);
/// machine.add_segment(SlotInterval::new(0, 3)).unwrap();
/// machine.add_segment(SlotInterval::new(5, 8)).unwrap();
/// assert!(machine.add_segment(SlotInterval::new(2, 6)).is_err());
///
/// assert_eq!(machine.segment_at(6), Some(SlotInterval::new(5, 8)));
/// assert!(!machine.is_on(4));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MachineSchedule {
    machine_id: Id,
    by_start: BTreeMap<usize, SlotInterval>,
}

impl MachineSchedule {
    pub fn new(machine_id: Id) -> Self {
        Self {
            machine_id,
            by_start: BTreeMap::new(),
        }
    }

    pub fn machine_id(&self) -> Id {
        self.machine_id
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }

    /// Inserts a power-on segment.
    ///
    /// Only the predecessor and successor need checking because the stored
    /// segments never overlap and are sorted by start.
    pub fn add_segment(&mut self, segment: SlotInterval) -> Result<(), ScheduleError> {
        let start = segment.start();

        if let Some((_, prev)) = self.by_start.range(..=start).next_back() {
            if prev.overlaps(&segment) || prev.start() == start {
                return Err(self.overlap(segment, *prev));
            }
        }
        if let Some((_, next)) = self.by_start.range(start..).next() {
            if next.overlaps(&segment) {
                return Err(self.overlap(segment, *next));
            }
        }

        self.by_start.insert(start, segment);
        Ok(())
    }

    fn overlap(&self, new: SlotInterval, existing: SlotInterval) -> ScheduleError {
        ScheduleError::OverlapsExisting {
            machine_id: self.machine_id,
            new,
            existing,
        }
    }

    /// Segment containing `slot`, if the machine is on then.
    pub fn segment_at(&self, slot: usize) -> Option<SlotInterval> {
        self.by_start
            .range(..=slot)
            .next_back()
            .map(|(_, segment)| *segment)
            .filter(|segment| segment.contains(slot))
    }

    pub fn is_on(&self, slot: usize) -> bool {
        self.segment_at(slot).is_some()
    }

    /// Segments in start order.
    pub fn segments(&self) -> impl Iterator<Item = SlotInterval> + '_ {
        self.by_start.values().copied()
    }

    /// Number of slots the machine is powered.
    pub fn on_slots(&self) -> usize {
        self.by_start.values().map(SlotInterval::length).sum()
    }

    /// Checks that consecutive segments are at least `min_gap` slots apart.
    pub fn check_gaps(&self, min_gap: usize) -> Result<(), ScheduleError> {
        let segments: Vec<_> = self.segments().collect();
        for pair in segments.windows(2) {
            if pair[1].start() < pair[0].end() + min_gap {
                return Err(ScheduleError::GapTooShort {
                    machine_id: self.machine_id,
                    first: pair[0],
                    second: pair[1],
                    min_gap,
                });
            }
        }
        Ok(())
    }
}

/// Total cost of a schedule split by origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    /// Energy drawn by tasks while running.
    pub task_energy: f64,
    /// Energy drawn by machines while powered.
    pub idle_energy: f64,
    /// Power-up plus power-down costs of every segment.
    pub power_cycling: f64,
}

impl CostBreakdown {
    pub fn machine_cycling(&self) -> f64 {
        self.idle_energy + self.power_cycling
    }

    pub fn total(&self) -> f64 {
        self.task_energy + self.machine_cycling()
    }
}

/// Decoded result of an optimization: task placements, machine power
/// segments and the cost they incur.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    placements: BTreeMap<Id, TaskPlacement>,
    machines: BTreeMap<Id, MachineSchedule>,
    cost: CostBreakdown,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_placement(&mut self, placement: TaskPlacement) -> Result<(), ScheduleError> {
        if self.placements.contains_key(&placement.task_id) {
            return Err(ScheduleError::DuplicateTaskId(placement.task_id));
        }
        self.placements.insert(placement.task_id, placement);
        Ok(())
    }

    pub fn add_machine(&mut self, machine: MachineSchedule) -> Result<(), ScheduleError> {
        if self.machines.contains_key(&machine.machine_id) {
            return Err(ScheduleError::DuplicateMachineId(machine.machine_id));
        }
        self.machines.insert(machine.machine_id, machine);
        Ok(())
    }

    pub fn placement(&self, task_id: Id) -> Option<&TaskPlacement> {
        self.placements.get(&task_id)
    }

    /// Placements ordered by task id.
    pub fn placements(&self) -> impl Iterator<Item = &TaskPlacement> + '_ {
        self.placements.values()
    }

    pub fn machine(&self, machine_id: Id) -> Option<&MachineSchedule> {
        self.machines.get(&machine_id)
    }

    /// Machine schedules ordered by machine id.
    pub fn machines(&self) -> impl Iterator<Item = &MachineSchedule> + '_ {
        self.machines.values()
    }

    /// Tasks placed on `machine_id`, ordered by start.
    pub fn tasks_on(&self, machine_id: Id) -> Vec<TaskPlacement> {
        let mut tasks: Vec<_> = self
            .placements
            .values()
            .filter(|p| p.machine_id == machine_id)
            .copied()
            .collect();
        tasks.sort_by_key(|p| (p.span.start(), p.task_id));
        tasks
    }

    /// Power-on segment of `machine_id` containing `slot`.
    pub fn segment_at(&self, machine_id: Id, slot: usize) -> Option<SlotInterval> {
        self.machines.get(&machine_id)?.segment_at(slot)
    }

    pub fn cost(&self) -> CostBreakdown {
        self.cost
    }

    /// Recomputes the cost breakdown from the current placements and segments.
    ///
    /// Placements or machines the instance does not know contribute nothing.
    pub fn price(&mut self, instance: &Instance, ledger: &EnergyLedger) {
        let mut cost = CostBreakdown::default();
        for placement in self.placements.values() {
            if let Some(task) = instance.task(placement.task_id) {
                cost.task_energy += task.power_consumption
                    * ledger.cost_of_interval(placement.span.start(), placement.span.end());
            }
        }
        for schedule in self.machines.values() {
            let Some(machine) = instance.machine(schedule.machine_id) else {
                continue;
            };
            for segment in schedule.segments() {
                let energy = ledger.cost_of_interval(segment.start(), segment.end());
                cost.idle_energy += machine.idle_consumption * energy;
                cost.power_cycling += machine.cycle_cost();
            }
        }
        self.cost = cost;
    }

    /// Re-checks the schedule against `instance`.
    ///
    /// Every task must be placed exactly once, inside its window and for its
    /// duration, on a machine that is powered at every slot it runs. No
    /// resource may exceed its capacity at any slot, and consecutive power
    /// segments must be at least `min_gap` slots apart.
    pub fn verify(&self, instance: &Instance, min_gap: usize) -> Result<(), ScheduleError> {
        for placement in self.placements.values() {
            let task = instance
                .task(placement.task_id)
                .ok_or(ScheduleError::UnknownTask(placement.task_id))?;
            if instance.machine(placement.machine_id).is_none() {
                return Err(ScheduleError::UnknownMachine(placement.machine_id));
            }
            let span = placement.span;
            if span.length() != task.duration
                || span.start() < task.earliest_start
                || span.end() > task.latest_end
            {
                return Err(ScheduleError::OutsideWindow {
                    task_id: task.id,
                    span,
                });
            }
            let dark = span
                .slots()
                .find(|&s| self.segment_at(placement.machine_id, s).is_none());
            if let Some(slot) = dark {
                return Err(ScheduleError::MachineOff {
                    task_id: task.id,
                    machine_id: placement.machine_id,
                    slot,
                });
            }
        }

        let placed: HashSet<Id> = self.placements.keys().copied().collect();
        if let Some(task) = instance.tasks.iter().find(|t| !placed.contains(&t.id)) {
            return Err(ScheduleError::UnplacedTask(task.id));
        }

        for schedule in self.machines.values() {
            if instance.machine(schedule.machine_id).is_none() {
                return Err(ScheduleError::UnknownMachine(schedule.machine_id));
            }
            schedule.check_gaps(min_gap)?;
        }

        for machine in &instance.machines {
            let on_machine = self.tasks_on(machine.id);
            for (resource, &capacity) in machine.resource_capacities.iter().enumerate() {
                let mut load = StepProfile::new();
                for placement in &on_machine {
                    if let Some(task) = instance.task(placement.task_id) {
                        let usage = task.resource_usage.get(resource).copied().unwrap_or(0.0);
                        load.add_pulse(placement.span, usage);
                    }
                }
                let overload = load
                    .steps()
                    .find(|&(_, level)| level > capacity + TOLERANCE);
                if let Some((slot, level)) = overload {
                    return Err(ScheduleError::CapacityExceeded {
                        machine_id: machine.id,
                        resource,
                        slot,
                        load: level,
                        capacity,
                    });
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Schedule Serde Support
// =============================================================================

mod serde_impl {
    use super::*;
    use serde::ser::{SerializeSeq, SerializeStruct};
    use serde::Serializer;

    struct Segments<'a>(&'a MachineSchedule);

    impl Serialize for Segments<'_> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for segment in self.0.segments() {
                seq.serialize_element(&segment)?;
            }
            seq.end()
        }
    }

    impl Serialize for MachineSchedule {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut s = serializer.serialize_struct("MachineSchedule", 2)?;
            s.serialize_field("machine_id", &self.machine_id)?;
            s.serialize_field("segments", &Segments(self))?;
            s.end()
        }
    }

    struct Values<'a, T>(&'a BTreeMap<Id, T>);

    impl<T: Serialize> Serialize for Values<'_, T> {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut seq = serializer.serialize_seq(Some(self.0.len()))?;
            for value in self.0.values() {
                seq.serialize_element(value)?;
            }
            seq.end()
        }
    }

    impl Serialize for Schedule {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            let mut s = serializer.serialize_struct("Schedule", 3)?;
            s.serialize_field("tasks", &Values(&self.placements))?;
            s.serialize_field("machines", &Values(&self.machines))?;
            s.serialize_field("cost", &self.cost)?;
            s.end()
        }
    }
}
