//! Additive cost terms attached to interval variables.

use std::sync::Arc;

use super::interval::OptionalInterval;
use super::IntervalId;

/// One non-negative contribution to the objective.
///
/// Each term watches a single interval variable and contributes nothing when
/// that interval is absent.
#[derive(Debug, Clone, PartialEq)]
pub enum CostTerm {
    /// `weight * table[start]`.
    StartTable {
        interval: IntervalId,
        table: Arc<[f64]>,
        weight: f64,
    },
    /// `weight * (prefix[end] - prefix[start])`.
    SpanIntegral {
        interval: IntervalId,
        prefix: Arc<[f64]>,
        weight: f64,
    },
    /// `weight` whenever the interval is present.
    Presence { interval: IntervalId, weight: f64 },
}

impl CostTerm {
    pub fn interval(&self) -> IntervalId {
        match self {
            CostTerm::StartTable { interval, .. }
            | CostTerm::SpanIntegral { interval, .. }
            | CostTerm::Presence { interval, .. } => *interval,
        }
    }

    pub fn weight(&self) -> f64 {
        match self {
            CostTerm::StartTable { weight, .. }
            | CostTerm::SpanIntegral { weight, .. }
            | CostTerm::Presence { weight, .. } => *weight,
        }
    }

    /// Contribution of this term when its interval takes `value`.
    ///
    /// Spans reaching past the end of a table cost `+inf`.
    pub fn cost(&self, value: &OptionalInterval) -> f64 {
        let OptionalInterval::Present(span) = value else {
            return 0.0;
        };
        if self.weight() == 0.0 {
            return 0.0;
        }
        match self {
            CostTerm::StartTable { table, weight, .. } => table
                .get(span.start())
                .map_or(f64::INFINITY, |cost| weight * cost),
            CostTerm::SpanIntegral { prefix, weight, .. } => {
                match (prefix.get(span.start()), prefix.get(span.end())) {
                    (Some(from), Some(to)) => weight * (to - from),
                    _ => f64::INFINITY,
                }
            }
            CostTerm::Presence { weight, .. } => *weight,
        }
    }
}
