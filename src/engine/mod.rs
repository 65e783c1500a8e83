//! Optimization engines that explore a [`Model`] and return a [`Solution`].
//!
//! The [`Engine`] trait is the seam between model construction and search:
//! planners only build models and read solutions, so any engine honoring the
//! model semantics can be plugged in. [`DepthFirstEngine`] is the built-in
//! implementation.
//!
//! # Outcomes
//!
//! Solving never fails with an error. Whether a solution exists, whether it
//! is proven optimal, and whether the search was cut short are all reported
//! through [`SolveStatus`].

mod search;

#[cfg(test)]
mod tests;

pub use search::DepthFirstEngine;

use std::time::Duration;

use serde::Serialize;

use crate::model::{Model, Valuation};

/// Limits and hints for one solve.
#[derive(Debug, Clone)]
pub struct SolveParams {
    /// Wall-clock budget; the best incumbent is returned when it runs out.
    pub time_limit: Duration,
    /// Optional cap on explored search nodes.
    pub node_limit: Option<u64>,
    /// Values to try first, typically a previous solution of a related model.
    pub warm_start: Option<Valuation>,
}

impl SolveParams {
    pub fn with_time_limit(time_limit: Duration) -> Self {
        Self {
            time_limit,
            node_limit: None,
            warm_start: None,
        }
    }

    pub fn node_limit(mut self, limit: u64) -> Self {
        self.node_limit = Some(limit);
        self
    }

    pub fn warm_start(mut self, valuation: Valuation) -> Self {
        self.warm_start = Some(valuation);
        self
    }
}

impl Default for SolveParams {
    fn default() -> Self {
        Self::with_time_limit(Duration::from_secs(10))
    }
}

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SolveStatus {
    /// A solution was found and no better one exists.
    Optimal,
    /// A solution was found but the search stopped before proving optimality.
    Feasible,
    /// The search space was exhausted without finding a solution.
    Infeasible,
    /// The search stopped before finding any solution.
    Unknown,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

/// Search effort spent on one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    pub nodes: u64,
    pub solutions: u32,
    pub elapsed: Duration,
}

/// Result of one solve.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolveStatus,
    /// Objective of the best solution found.
    pub objective: Option<f64>,
    /// Proven lower bound on the optimal objective; `+inf` when infeasible.
    pub lower_bound: f64,
    /// Values of the best solution found.
    pub values: Option<Valuation>,
    pub stats: SearchStats,
}

impl Solution {
    pub fn is_solution_found(&self) -> bool {
        self.status.has_solution()
    }
}

/// An optimization engine.
pub trait Engine {
    /// Minimizes the model's objective subject to its constraints.
    fn solve(&self, model: &Model, params: &SolveParams) -> Solution;
}
