//! Slot and wall-clock conversions.
//!
//! The planning day is discretized into slots of a fixed resolution. Slot
//! arithmetic is done on plain `usize` indices everywhere else in the crate;
//! this module is the only place where slots meet physical time, expressed as
//! `qtty` quantities so callers can read slot offsets in whichever time unit
//! they prefer.

use qtty::{Day, Minute, Quantity, Unit};

/// Marker trait for units that share the same physical dimension.
///
/// Automatically implemented for any pair of units where `From::Dim == To::Dim`.
pub trait SameDim<To: Unit>: Unit<Dim = To::Dim> {}

impl<From, To> SameDim<To> for From
where
    From: Unit,
    To: Unit<Dim = From::Dim>,
{
}

/// Converts a quantity from one unit to another unit of the same dimension.
#[inline]
pub const fn convert<From, To>(q: Quantity<From>) -> Quantity<To>
where
    From: SameDim<To>,
    To: Unit,
{
    q.to_const::<To>()
}

/// Length of one planning cycle in minutes.
pub fn planning_day() -> Quantity<Minute> {
    convert(Quantity::<Day>::new(1.0))
}

/// Number of slots in one planning day for the given slot resolution.
///
/// Returns `None` when the resolution is not positive or does not divide the
/// day into a whole number of slots.
pub fn horizon_slots(resolution: Quantity<Minute>) -> Option<usize> {
    let step = resolution.value();
    if !step.is_finite() || step <= 0.0 {
        return None;
    }
    let slots = planning_day().value() / step;
    if slots < 1.0 || (slots - slots.round()).abs() > 1e-9 {
        return None;
    }
    Some(slots.round() as usize)
}

/// Offset of the start of `slot` from the beginning of the day, in unit `U`.
pub fn slot_offset<U>(slot: usize, resolution: Quantity<Minute>) -> Quantity<U>
where
    Minute: SameDim<U>,
    U: Unit,
{
    convert(Quantity::<Minute>::new(slot as f64 * resolution.value()))
}
