use thiserror::Error;

use crate::Id;

/// Reasons an input record is rejected before any model is built.
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("Time resolution of {0} minutes does not divide the planning day into whole slots")]
    InvalidResolution(u32),

    #[error("Price series has {actual} entries but the horizon has {expected} slots")]
    PriceSeriesLength { expected: usize, actual: usize },

    #[error("Price at slot {slot} is {value}; prices must be finite and non-negative")]
    InvalidPrice { slot: usize, value: f64 },

    #[error("{entity} {id} declares {actual} resource values but the instance has {expected} resources")]
    ResourceArity {
        entity: &'static str,
        id: Id,
        expected: usize,
        actual: usize,
    },

    #[error("{entity} {id} has an invalid {field}: {value}")]
    InvalidQuantity {
        entity: &'static str,
        id: Id,
        field: &'static str,
        value: f64,
    },

    #[error("Task {0} has zero duration")]
    ZeroDuration(Id),

    #[error("Task {id} window [{earliest_start}, {latest_end}) is inverted or exceeds the horizon {horizon}")]
    WindowOutsideHorizon {
        id: Id,
        earliest_start: usize,
        latest_end: usize,
        horizon: usize,
    },

    #[error("Duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: Id },

    #[error("Failed to parse instance: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read instance: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_series_length_display() {
        let e = InstanceError::PriceSeriesLength {
            expected: 96,
            actual: 95,
        };
        assert_eq!(
            e.to_string(),
            "Price series has 95 entries but the horizon has 96 slots"
        );
    }

    #[test]
    fn duplicate_id_display() {
        let e = InstanceError::DuplicateId {
            entity: "machine",
            id: 3,
        };
        assert_eq!(e.to_string(), "Duplicate machine id: 3");
    }

    #[test]
    fn zero_duration_display() {
        assert_eq!(
            InstanceError::ZeroDuration(7).to_string(),
            "Task 7 has zero duration"
        );
    }
}
