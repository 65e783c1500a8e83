//! Step functions built from interval-scoped pulses.

use std::collections::BTreeMap;

use super::interval::SlotInterval;

/// Time-indexed step function, zero before the first breakpoint.
///
/// Stored as sorted breakpoints mapping a slot to the change in level that
/// takes effect at that slot. A pulse of height `h` over `[s, e)` adds `+h` at
/// `s` and `-h` at `e`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepProfile {
    deltas: BTreeMap<usize, f64>,
}

impl StepProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Adds a pulse of `height` over `span`. Empty spans are ignored.
    pub fn add_pulse(&mut self, span: SlotInterval, height: f64) {
        if span.length() == 0 || height == 0.0 {
            return;
        }
        *self.deltas.entry(span.start()).or_insert(0.0) += height;
        *self.deltas.entry(span.end()).or_insert(0.0) -= height;
    }

    /// Level at `slot`.
    pub fn value_at(&self, slot: usize) -> f64 {
        self.deltas.range(..=slot).map(|(_, d)| d).sum()
    }

    /// Lowest and highest level reached inside `span`.
    ///
    /// An empty span reports the level at its start.
    pub fn extrema_over(&self, span: SlotInterval) -> (f64, f64) {
        let mut level = self.value_at(span.start());
        let (mut low, mut high) = (level, level);
        if span.length() > 1 {
            for (_, delta) in self.deltas.range(span.start() + 1..span.end()) {
                level += delta;
                low = low.min(level);
                high = high.max(level);
            }
        }
        (low, high)
    }

    /// Highest level reached anywhere; zero for an empty profile.
    pub fn peak(&self) -> f64 {
        let mut level = 0.0_f64;
        let mut peak = 0.0_f64;
        for delta in self.deltas.values() {
            level += delta;
            peak = peak.max(level);
        }
        peak
    }

    /// Iterates over `(slot, level)` pairs at each breakpoint, in slot order.
    pub fn steps(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.deltas.iter().scan(0.0, |level, (&slot, delta)| {
            *level += delta;
            Some((slot, *level))
        })
    }
}
