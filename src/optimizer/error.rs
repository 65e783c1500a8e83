use thiserror::Error;

use crate::instance::InstanceError;
use crate::model::ModelError;
use crate::schedule::ScheduleError;

/// Fatal failures of an optimization run.
///
/// Infeasibility and time limits are not errors; they are reported through
/// [`ScheduleStatus`](super::ScheduleStatus).
#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Invalid instance: {0}")]
    Instance(#[from] InstanceError),

    #[error("Model construction failed: {0}")]
    Model(#[from] ModelError),

    #[error("Solution does not decode to a valid schedule: {0}")]
    Schedule(#[from] ScheduleError),
}
