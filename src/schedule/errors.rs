use std::fmt;

use crate::model::SlotInterval;
use crate::Id;

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Task is placed more than once
    DuplicateTaskId(Id),
    /// Machine appears more than once
    DuplicateMachineId(Id),
    /// Task from the instance has no placement
    UnplacedTask(Id),
    /// Placement or machine refers to an id the instance does not know
    UnknownTask(Id),
    UnknownMachine(Id),
    /// Placement does not respect the task's window or duration
    OutsideWindow { task_id: Id, span: SlotInterval },
    /// New segment overlaps an existing segment on the same machine
    OverlapsExisting {
        machine_id: Id,
        new: SlotInterval,
        existing: SlotInterval,
    },
    /// Consecutive segments are closer than the cool-down
    GapTooShort {
        machine_id: Id,
        first: SlotInterval,
        second: SlotInterval,
        min_gap: usize,
    },
    /// Task runs at a slot where its machine is off
    MachineOff { task_id: Id, machine_id: Id, slot: usize },
    /// Resource load exceeds the machine's capacity
    CapacityExceeded {
        machine_id: Id,
        resource: usize,
        slot: usize,
        load: f64,
        capacity: f64,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::DuplicateTaskId(id) => {
                write!(f, "Task {} is placed more than once", id)
            }
            ScheduleError::DuplicateMachineId(id) => {
                write!(f, "Machine {} appears more than once", id)
            }
            ScheduleError::UnplacedTask(id) => write!(f, "Task {} has no placement", id),
            ScheduleError::UnknownTask(id) => write!(f, "Unknown task {}", id),
            ScheduleError::UnknownMachine(id) => write!(f, "Unknown machine {}", id),
            ScheduleError::OutsideWindow { task_id, span } => {
                write!(f, "Task {} placed at {} violates its window or duration", task_id, span)
            }
            ScheduleError::OverlapsExisting {
                machine_id,
                new,
                existing,
            } => {
                write!(
                    f,
                    "Segment {} on machine {} overlaps existing segment {}",
                    new, machine_id, existing
                )
            }
            ScheduleError::GapTooShort {
                machine_id,
                first,
                second,
                min_gap,
            } => {
                write!(
                    f,
                    "Segments {} and {} on machine {} are less than {} slots apart",
                    first, second, machine_id, min_gap
                )
            }
            ScheduleError::MachineOff {
                task_id,
                machine_id,
                slot,
            } => {
                write!(
                    f,
                    "Task {} runs at slot {} while machine {} is off",
                    task_id, slot, machine_id
                )
            }
            ScheduleError::CapacityExceeded {
                machine_id,
                resource,
                slot,
                load,
                capacity,
            } => {
                write!(
                    f,
                    "Machine {} resource {} carries {} at slot {} (capacity {})",
                    machine_id, resource, load, slot, capacity
                )
            }
        }
    }
}

impl std::error::Error for ScheduleError {}
