use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::planner::TimelineOptions;

/// Limits and model shape for a [`ScheduleOptimizer`](super::ScheduleOptimizer) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Wall-clock budget of the task-energy phase.
    pub phase1_time_limit: Duration,
    /// Wall-clock budget of the full-cost phase.
    pub phase2_time_limit: Duration,
    /// Cap on explored search nodes per phase.
    pub node_limit: Option<u64>,
    /// Segments per machine; `min(horizon, tasks)` when unset.
    pub max_segments_per_machine: Option<usize>,
    /// Minimum off slots between two power-on segments of a machine.
    pub min_segment_gap: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            phase1_time_limit: Duration::from_secs(10),
            phase2_time_limit: Duration::from_secs(30),
            node_limit: None,
            max_segments_per_machine: None,
            min_segment_gap: 1,
        }
    }
}

impl OptimizerConfig {
    pub fn timeline_options(&self) -> TimelineOptions {
        TimelineOptions {
            max_segments_per_machine: self.max_segments_per_machine,
            min_segment_gap: self.min_segment_gap,
        }
    }
}
