use crate::instance::Machine;
use crate::model::{CumulId, IntervalId, Model, ModelError};

/// Load profiles indexed by `[machine][resource]`, each capped at the
/// machine's capacity for that resource at every slot.
#[derive(Debug, Clone)]
pub struct ResourceLedger {
    profiles: Vec<Vec<CumulId>>,
}

impl ResourceLedger {
    pub fn build(model: &mut Model, machines: &[Machine]) -> Result<Self, ModelError> {
        let mut profiles = Vec::with_capacity(machines.len());
        for machine in machines {
            let mut per_resource = Vec::with_capacity(machine.resource_capacities.len());
            for (r, &capacity) in machine.resource_capacities.iter().enumerate() {
                let cumul = model.cumul(format!("machine{}.resource{}", machine.id, r));
                model.add_cumul_ceiling(cumul, capacity)?;
                per_resource.push(cumul);
            }
            profiles.push(per_resource);
        }
        Ok(Self { profiles })
    }

    /// Profile of resource `resource` on the machine at position `machine`.
    pub fn profile(&self, machine: usize, resource: usize) -> Option<CumulId> {
        self.profiles.get(machine)?.get(resource).copied()
    }

    /// Adds `usage` over `candidate` to the profiles of machine `machine`.
    pub fn feed(
        &self,
        model: &mut Model,
        machine: usize,
        candidate: IntervalId,
        usage: &[f64],
    ) -> Result<(), ModelError> {
        let profiles = self
            .profiles
            .get(machine)
            .ok_or(ModelError::MissingProfiles(machine))?;
        for (&cumul, &height) in profiles.iter().zip(usage) {
            if height > 0.0 {
                model.add_pulse(cumul, candidate, height)?;
            }
        }
        Ok(())
    }
}
