//! Energy price accumulation.
//!
//! [`EnergyLedger`] turns a per-slot price series into constant-time cost
//! queries for arbitrary intervals, both when start and end are known and
//! when only the duration is fixed and the start is still a decision.

mod ledger;

pub use ledger::{EnergyLedger, OUT_OF_HORIZON_COST};
