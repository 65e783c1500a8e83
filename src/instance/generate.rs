//! Seeded random instance generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Instance, Machine, Task};
use crate::units::horizon_slots;
use crate::Id;
use qtty::Quantity;

/// Builds random but always-valid instances.
///
/// Every generated task fits its window and its demand fits every machine,
/// so infeasibility can only come from contention.
#[derive(Debug, Clone)]
pub struct InstanceGenerator {
    pub machines: usize,
    pub tasks: usize,
    pub resources: usize,
    /// Slot length in minutes; must divide the day.
    pub time_resolution: u32,
    /// Longest task duration in slots.
    pub max_duration: usize,
    pub max_price: f64,
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        Self {
            machines: 2,
            tasks: 4,
            resources: 2,
            time_resolution: 180,
            max_duration: 3,
            max_price: 10.0,
        }
    }
}

impl InstanceGenerator {
    /// Generates an instance from `seed`. Identical seeds give identical instances.
    ///
    /// Returns `None` when `time_resolution` does not divide the day.
    pub fn generate(&self, seed: u64) -> Option<Instance> {
        let horizon = horizon_slots(Quantity::new(self.time_resolution as f64))?;
        let mut rng = StdRng::seed_from_u64(seed);

        let energy_prices = (0..horizon)
            .map(|_| rng.gen_range(0.0..=self.max_price))
            .collect();

        let machines: Vec<Machine> = (0..self.machines)
            .map(|i| Machine {
                id: i as Id,
                idle_consumption: rng.gen_range(0.0..2.0),
                power_up_cost: rng.gen_range(0.0..5.0),
                power_down_cost: rng.gen_range(0.0..5.0),
                resource_capacities: (0..self.resources)
                    .map(|_| rng.gen_range(2..=6) as f64)
                    .collect(),
            })
            .collect();

        let max_duration = self.max_duration.clamp(1, horizon);
        let tasks = (0..self.tasks)
            .map(|i| {
                let duration = rng.gen_range(1..=max_duration);
                let earliest_start = rng.gen_range(0..=horizon - duration);
                let latest_end = rng.gen_range(earliest_start + duration..=horizon);
                Task {
                    id: (100 + i) as Id,
                    duration,
                    earliest_start,
                    latest_end,
                    power_consumption: rng.gen_range(0.5..3.0),
                    resource_usage: (0..self.resources)
                        .map(|_| rng.gen_range(0..=2) as f64)
                        .collect(),
                }
            })
            .collect();

        Some(Instance {
            time_resolution: self.time_resolution,
            resources: self.resources,
            energy_prices,
            machines,
            tasks,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_instances_validate() {
        let generator = InstanceGenerator::default();
        for seed in 0..20 {
            let instance = generator.generate(seed).unwrap();
            assert_eq!(instance.validate().unwrap(), 8);
            assert!(instance.tasks.iter().all(|t| t.start_choices() > 0));
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = InstanceGenerator::default();
        assert_eq!(generator.generate(42), generator.generate(42));
        assert_ne!(generator.generate(1), generator.generate(2));
    }

    #[test]
    fn test_invalid_resolution() {
        let generator = InstanceGenerator {
            time_resolution: 7,
            ..Default::default()
        };
        assert!(generator.generate(0).is_none());
    }
}
