use thiserror::Error;

use super::{CumulId, IntervalId, StateId};

/// Errors raised while declaring a model.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unknown interval variable: {0}")]
    UnknownInterval(IntervalId),

    #[error("Unknown cumul expression: {0}")]
    UnknownCumul(CumulId),

    #[error("Unknown state function: {0}")]
    UnknownState(StateId),

    #[error("Precedence {before} -> {after} would create a cycle")]
    CycleDetected { before: IntervalId, after: IntervalId },

    #[error("Pulse height must be finite and non-negative, got {0}")]
    NegativeHeight(f64),

    #[error("Cost weight must be finite and non-negative, got {0}")]
    NegativeWeight(f64),

    #[error("No resource profiles declared for machine at position {0}")]
    MissingProfiles(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_detected_display() {
        let e = ModelError::CycleDetected {
            before: IntervalId(2),
            after: IntervalId(1),
        };
        assert_eq!(e.to_string(), "Precedence #2 -> #1 would create a cycle");
    }

    #[test]
    fn unknown_interval_display() {
        let e = ModelError::UnknownInterval(IntervalId(9));
        assert!(e.to_string().contains("#9"));
    }

    #[test]
    fn missing_profiles_display() {
        assert_eq!(
            ModelError::MissingProfiles(2).to_string(),
            "No resource profiles declared for machine at position 2"
        );
    }
}
