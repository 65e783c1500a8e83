//! Slot intervals and interval decision variables.

use std::fmt::Display;

use serde::Serialize;

/// Half-open slot range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SlotInterval {
    start: usize,
    end: usize,
}

impl SlotInterval {
    /// Creates interval `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`.
    pub const fn new(start: usize, end: usize) -> Self {
        assert!(start <= end, "Interval start must be <= end");
        Self { start, end }
    }

    /// Creates `[start, start + length)`.
    pub const fn with_length(start: usize, length: usize) -> Self {
        Self::new(start, start + length)
    }

    pub const fn start(&self) -> usize {
        self.start
    }

    pub const fn end(&self) -> usize {
        self.end
    }

    pub const fn length(&self) -> usize {
        self.end - self.start
    }

    /// Returns true if `slot` ∈ `[start, end)`.
    pub const fn contains(&self, slot: usize) -> bool {
        self.start <= slot && slot < self.end
    }

    /// Returns true if `other` lies entirely inside this interval.
    pub const fn covers(&self, other: &SlotInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Checks if the two ranges share at least one slot.
    pub const fn overlaps(&self, other: &SlotInterval) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn intersection(&self, other: &SlotInterval) -> Option<SlotInterval> {
        if self.overlaps(other) {
            Some(SlotInterval::new(
                self.start.max(other.start),
                self.end.min(other.end),
            ))
        } else {
            None
        }
    }

    /// Iterates over the slots of the range.
    pub fn slots(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

impl Display for SlotInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Value of an interval decision: either not realized, or realized over a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OptionalInterval {
    Absent,
    Present(SlotInterval),
}

impl OptionalInterval {
    pub fn present(start: usize, end: usize) -> Self {
        Self::Present(SlotInterval::new(start, end))
    }

    pub const fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub const fn span(&self) -> Option<SlotInterval> {
        match self {
            Self::Present(span) => Some(*span),
            Self::Absent => None,
        }
    }
}

impl Display for OptionalInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Present(span) => span.fmt(f),
        }
    }
}

/// Declaration of an interval decision variable.
///
/// A realized value `[s, e)` satisfies `start_min <= s`, `e <= end_max` and
/// `length_min <= e - s <= length_max`. Optional variables may also be
/// [`OptionalInterval::Absent`].
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalVar {
    name: String,
    optional: bool,
    start_min: usize,
    end_max: usize,
    length_min: usize,
    length_max: usize,
}

impl IntervalVar {
    /// Mandatory interval of exactly `length` slots inside `[start_min, end_max)`.
    pub fn fixed_length(
        name: impl Into<String>,
        start_min: usize,
        end_max: usize,
        length: usize,
    ) -> Self {
        Self::variable_length(name, start_min, end_max, length, length)
    }

    /// Mandatory interval whose length ranges over `[length_min, length_max]`.
    pub fn variable_length(
        name: impl Into<String>,
        start_min: usize,
        end_max: usize,
        length_min: usize,
        length_max: usize,
    ) -> Self {
        Self {
            name: name.into(),
            optional: false,
            start_min,
            end_max,
            length_min,
            length_max,
        }
    }

    /// Makes the variable optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn start_min(&self) -> usize {
        self.start_min
    }

    pub fn end_max(&self) -> usize {
        self.end_max
    }

    pub fn length_min(&self) -> usize {
        self.length_min
    }

    pub fn length_max(&self) -> usize {
        self.length_max
    }

    /// Returns true if `value` lies in this variable's domain.
    pub fn admits(&self, value: &OptionalInterval) -> bool {
        match value {
            OptionalInterval::Absent => self.optional,
            OptionalInterval::Present(span) => {
                span.start() >= self.start_min
                    && span.end() <= self.end_max
                    && span.length() >= self.length_min
                    && span.length() <= self.length_max
            }
        }
    }

    /// Enumerates every realized value, by start then length.
    pub fn present_values(&self) -> impl Iterator<Item = SlotInterval> + '_ {
        let last_start = self.end_max.saturating_sub(self.length_min);
        (self.start_min..=last_start)
            .filter(move |s| s + self.length_min <= self.end_max)
            .flat_map(move |start| {
                let longest = self.length_max.min(self.end_max - start);
                (self.length_min..=longest).map(move |len| SlotInterval::with_length(start, len))
            })
    }
}
