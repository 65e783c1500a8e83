//! Values of interval variables, partial during search and complete in solutions.

use super::interval::OptionalInterval;
use super::IntervalId;

/// Values for some of a model's interval variables, indexed by [`IntervalId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialValuation {
    values: Vec<Option<OptionalInterval>>,
}

impl PartialValuation {
    /// A valuation over `len` variables with nothing assigned.
    pub fn unassigned(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, id: IntervalId) -> Option<OptionalInterval> {
        self.values.get(id.index()).copied().flatten()
    }

    pub fn set(&mut self, id: IntervalId, value: OptionalInterval) {
        self.values[id.index()] = Some(value);
    }

    pub fn clear(&mut self, id: IntervalId) {
        self.values[id.index()] = None;
    }

    pub fn is_assigned(&self, id: IntervalId) -> bool {
        self.get(id).is_some()
    }

    /// Converts to a complete valuation if every variable is assigned.
    pub fn complete(&self) -> Option<Valuation> {
        self.values
            .iter()
            .copied()
            .collect::<Option<Vec<_>>>()
            .map(Valuation)
    }
}

impl From<&Valuation> for PartialValuation {
    fn from(valuation: &Valuation) -> Self {
        Self {
            values: valuation.0.iter().copied().map(Some).collect(),
        }
    }
}

/// A value for every interval variable of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valuation(Vec<OptionalInterval>);

impl Valuation {
    pub fn new(values: Vec<OptionalInterval>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of `id`; [`OptionalInterval::Absent`] for an unknown handle.
    pub fn get(&self, id: IntervalId) -> OptionalInterval {
        self.0
            .get(id.index())
            .copied()
            .unwrap_or(OptionalInterval::Absent)
    }

    pub fn iter(&self) -> impl Iterator<Item = (IntervalId, OptionalInterval)> + '_ {
        self.0
            .iter()
            .enumerate()
            .map(|(i, v)| (IntervalId(i), *v))
    }
}
