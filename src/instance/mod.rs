//! Input record: machines, tasks and the per-slot price series for one day.
//!
//! Entities are immutable once loaded. [`Instance::validate`] is the single
//! gate between untrusted input and model construction: everything it accepts
//! can be turned into a model, and every structural problem it cannot detect
//! (e.g. a window too narrow for its task) is left for the solver to report as
//! infeasibility.

mod error;
mod generate;

pub use error::InstanceError;
pub use generate::InstanceGenerator;

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use qtty::{Minute, Quantity};
use serde::{Deserialize, Serialize};

use crate::units::horizon_slots;
use crate::Id;

/// A unit of work with a fixed duration, a time window and resource demands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    /// Duration in slots.
    pub duration: usize,
    /// First slot the task may start in.
    #[serde(rename = "earliest_start_time")]
    pub earliest_start: usize,
    /// Slot boundary the task must end at or before (exclusive).
    #[serde(rename = "latest_end_time")]
    pub latest_end: usize,
    /// Energy drawn per slot while running.
    pub power_consumption: f64,
    /// Demand per resource dimension while running.
    pub resource_usage: Vec<f64>,
}

impl Task {
    /// Number of start slots compatible with the window; zero when the window
    /// is too narrow for the duration.
    pub fn start_choices(&self) -> usize {
        (self.latest_end + 1).saturating_sub(self.earliest_start + self.duration)
    }
}

/// A machine that can host tasks while powered on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: Id,
    /// Energy drawn per slot while powered on, regardless of load.
    pub idle_consumption: f64,
    /// One-time cost paid each time the machine is powered up.
    pub power_up_cost: f64,
    /// One-time cost paid each time the machine is powered down.
    pub power_down_cost: f64,
    /// Ceiling per resource dimension.
    pub resource_capacities: Vec<f64>,
}

impl Machine {
    /// Cost of one on/off cycle.
    pub fn cycle_cost(&self) -> f64 {
        self.power_up_cost + self.power_down_cost
    }
}

/// A complete scheduling problem for one planning day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// Slot length in minutes.
    pub time_resolution: u32,
    /// Number of resource dimensions.
    pub resources: usize,
    /// Price per slot; length must equal the horizon.
    pub energy_prices: Vec<f64>,
    pub machines: Vec<Machine>,
    pub tasks: Vec<Task>,
}

impl Instance {
    pub fn from_json_str(json: &str) -> Result<Self, InstanceError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, InstanceError> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads an instance from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InstanceError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Slot length as a time quantity.
    pub fn resolution(&self) -> Quantity<Minute> {
        Quantity::new(self.time_resolution as f64)
    }

    /// Number of slots in the planning day, if the resolution divides it.
    pub fn horizon(&self) -> Option<usize> {
        horizon_slots(self.resolution())
    }

    pub fn machine(&self, id: Id) -> Option<&Machine> {
        self.machines.iter().find(|m| m.id == id)
    }

    pub fn task(&self, id: Id) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Checks the record for malformed input and returns the horizon.
    ///
    /// # Errors
    ///
    /// Any [`InstanceError`] other than `Parse`/`Io`. Windows that are merely
    /// too narrow for their task are accepted.
    pub fn validate(&self) -> Result<usize, InstanceError> {
        let horizon = self
            .horizon()
            .ok_or(InstanceError::InvalidResolution(self.time_resolution))?;

        if self.energy_prices.len() != horizon {
            return Err(InstanceError::PriceSeriesLength {
                expected: horizon,
                actual: self.energy_prices.len(),
            });
        }
        if let Some((slot, &value)) = self
            .energy_prices
            .iter()
            .enumerate()
            .find(|(_, p)| !is_non_negative(**p))
        {
            return Err(InstanceError::InvalidPrice { slot, value });
        }

        let mut seen = HashSet::new();
        for machine in &self.machines {
            if !seen.insert(machine.id) {
                return Err(InstanceError::DuplicateId {
                    entity: "machine",
                    id: machine.id,
                });
            }
            self.check_arity("machine", machine.id, &machine.resource_capacities)?;
            check_values("machine", machine.id, "resource capacity", &machine.resource_capacities)?;
            check_values(
                "machine",
                machine.id,
                "cost",
                &[
                    machine.idle_consumption,
                    machine.power_up_cost,
                    machine.power_down_cost,
                ],
            )?;
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id) {
                return Err(InstanceError::DuplicateId {
                    entity: "task",
                    id: task.id,
                });
            }
            if task.duration == 0 {
                return Err(InstanceError::ZeroDuration(task.id));
            }
            if task.latest_end > horizon || task.earliest_start > task.latest_end {
                return Err(InstanceError::WindowOutsideHorizon {
                    id: task.id,
                    earliest_start: task.earliest_start,
                    latest_end: task.latest_end,
                    horizon,
                });
            }
            self.check_arity("task", task.id, &task.resource_usage)?;
            check_values("task", task.id, "resource usage", &task.resource_usage)?;
            check_values("task", task.id, "power consumption", &[task.power_consumption])?;
        }

        Ok(horizon)
    }

    fn check_arity(
        &self,
        entity: &'static str,
        id: Id,
        values: &[f64],
    ) -> Result<(), InstanceError> {
        if values.len() != self.resources {
            return Err(InstanceError::ResourceArity {
                entity,
                id,
                expected: self.resources,
                actual: values.len(),
            });
        }
        Ok(())
    }
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn check_values(
    entity: &'static str,
    id: Id,
    field: &'static str,
    values: &[f64],
) -> Result<(), InstanceError> {
    match values.iter().find(|v| !is_non_negative(**v)) {
        Some(&value) => Err(InstanceError::InvalidQuantity {
            entity,
            id,
            field,
            value,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r#"{
            "time_resolution": 360,
            "resources": 2,
            "energy_prices": [1.0, 2.0, 3.0, 4.0],
            "machines": [
                {"id": 0, "idle_consumption": 1.0, "power_up_cost": 2.0,
                 "power_down_cost": 1.0, "resource_capacities": [4.0, 2.0]}
            ],
            "tasks": [
                {"id": 10, "duration": 2, "earliest_start_time": 0,
                 "latest_end_time": 4, "power_consumption": 1.5,
                 "resource_usage": [1.0, 1.0]}
            ]
        }"#
    }

    fn sample() -> Instance {
        Instance::from_json_str(sample_json()).unwrap()
    }

    #[test]
    fn test_parse_field_names() {
        let instance = sample();
        assert_eq!(instance.tasks[0].earliest_start, 0);
        assert_eq!(instance.tasks[0].latest_end, 4);
        assert_eq!(instance.machines[0].cycle_cost(), 3.0);
        assert_eq!(instance.validate().unwrap(), 4);
    }

    #[test]
    fn test_price_series_length_rejected() {
        let mut instance = sample();
        instance.energy_prices.pop();
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::PriceSeriesLength {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_resolution_must_divide_day() {
        let mut instance = sample();
        instance.time_resolution = 7;
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::InvalidResolution(7))
        ));
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let json =
            r#"{"time_resolution": 360, "resources": 1, "energy_prices": [], "machines": []}"#;
        assert!(matches!(
            Instance::from_json_str(json),
            Err(InstanceError::Parse(_))
        ));
    }

    #[test]
    fn test_resource_arity_rejected() {
        let mut instance = sample();
        instance.tasks[0].resource_usage.push(1.0);
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::ResourceArity { entity: "task", .. })
        ));
    }

    #[test]
    fn test_negative_values_rejected() {
        let mut instance = sample();
        instance.energy_prices[2] = -1.0;
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::InvalidPrice { slot: 2, .. })
        ));

        let mut instance = sample();
        instance.machines[0].power_up_cost = -0.5;
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::InvalidQuantity { field: "cost", .. })
        ));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut instance = sample();
        let copy = instance.tasks[0].clone();
        instance.tasks.push(copy);
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::DuplicateId { entity: "task", id: 10 })
        ));
    }

    #[test]
    fn test_narrow_window_is_accepted() {
        let mut instance = sample();
        instance.tasks[0].earliest_start = 3;
        assert_eq!(instance.tasks[0].start_choices(), 0);
        assert!(instance.validate().is_ok());
    }

    #[test]
    fn test_window_past_horizon_rejected() {
        let mut instance = sample();
        instance.tasks[0].latest_end = 5;
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::WindowOutsideHorizon { id: 10, .. })
        ));
    }

    #[test]
    fn test_inverted_window_rejected() {
        let mut instance = sample();
        instance.tasks[0].earliest_start = 4;
        instance.tasks[0].latest_end = 3;
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::WindowOutsideHorizon { id: 10, .. })
        ));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut instance = sample();
        instance.tasks[0].duration = 0;
        assert!(matches!(
            instance.validate(),
            Err(InstanceError::ZeroDuration(10))
        ));
    }

    #[test]
    fn test_from_path() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample_json().as_bytes()).unwrap();
        let instance = Instance::from_path(file.path()).unwrap();
        assert_eq!(instance, sample());
    }

    #[test]
    fn test_from_path_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Instance::from_path(dir.path().join("absent.json"));
        assert!(matches!(result, Err(InstanceError::Io(_))));
    }
}
