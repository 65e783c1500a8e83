//! Declarative scheduling model handed to an optimization engine.
//!
//! A [`Model`] is an arena of interval variables plus the cumulative
//! expressions, state functions, constraints and objective terms that refer
//! to them through copyable handles ([`IntervalId`], [`CumulId`],
//! [`StateId`]). The model only describes the problem; exploring it is the
//! job of an [`Engine`](crate::engine::Engine).
//!
//! # Semantics
//!
//! - A cumul is the sum of its pulses: pulse `(iv, h)` adds `h` over the span
//!   of `iv` when `iv` is present.
//! - A state function is true exactly over the union of the spans of its
//!   present support intervals, false elsewhere.
//! - The objective is the sum of all [`CostTerm`]s, minimized. An optional
//!   floor rejects any solution whose objective is below it.

mod constraint;
mod error;
mod interval;
mod objective;
mod profile;
mod valuation;


pub use constraint::Constraint;
pub use error::ModelError;
pub use interval::{IntervalVar, OptionalInterval, SlotInterval};
pub use objective::CostTerm;
pub use profile::StepProfile;
pub use valuation::{PartialValuation, Valuation};

use std::collections::HashSet;
use std::fmt;

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};

/// Slack used when comparing accumulated floating-point levels and costs.
pub const TOLERANCE: f64 = 1e-9;

/// Handle to an interval variable of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntervalId(pub(crate) usize);

impl IntervalId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a cumulative expression of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CumulId(pub(crate) usize);

impl fmt::Display for CumulId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cumul#{}", self.0)
    }
}

/// Handle to a boolean state function of a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

/// Sum of interval-scoped pulses.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulExpr {
    name: String,
    pulses: Vec<(IntervalId, f64)>,
}

impl CumulExpr {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pulses(&self) -> &[(IntervalId, f64)] {
        &self.pulses
    }

    /// Profile formed by the pulses whose interval is assigned and present.
    pub fn profile(&self, values: &PartialValuation) -> StepProfile {
        let mut profile = StepProfile::new();
        for &(interval, height) in &self.pulses {
            if let Some(OptionalInterval::Present(span)) = values.get(interval) {
                profile.add_pulse(span, height);
            }
        }
        profile
    }

    /// Returns true if every contributing interval is assigned.
    pub fn is_fixed(&self, values: &PartialValuation) -> bool {
        self.pulses.iter().all(|(iv, _)| values.is_assigned(*iv))
    }
}

/// Boolean state, true exactly where some present support interval is.
///
/// A chained state function additionally knows that its support is ordered:
/// a support interval may only be present when its predecessor is, and
/// starts at least `gap` slots after the predecessor ends.
#[derive(Debug, Clone, PartialEq)]
pub struct StateFunction {
    name: String,
    support: Vec<IntervalId>,
    chain_gap: Option<usize>,
}

impl StateFunction {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn support(&self) -> &[IntervalId] {
        &self.support
    }

    pub fn is_chained(&self) -> bool {
        self.chain_gap.is_some()
    }

    /// Whether the state is true over all of `span`.
    ///
    /// Returns `None` while some slot of `span` is uncovered but may still be
    /// covered by an unassigned support interval.
    pub fn holds_over(&self, values: &PartialValuation, span: SlotInterval) -> Option<bool> {
        let mut present = Vec::with_capacity(self.support.len());
        for &interval in &self.support {
            if let Some(OptionalInterval::Present(s)) = values.get(interval) {
                present.push(s);
            }
        }
        let frontier = self.open_from(values);

        let mut undecided = false;
        for slot in span.slots() {
            if present.iter().any(|s| s.contains(slot)) {
                continue;
            }
            match frontier {
                Some(first) if slot >= first => undecided = true,
                _ => return Some(false),
            }
        }
        if undecided {
            None
        } else {
            Some(true)
        }
    }

    /// First slot that an unassigned support interval could still cover, or
    /// `None` when no uncovered slot can change any more.
    fn open_from(&self, values: &PartialValuation) -> Option<usize> {
        let Some(gap) = self.chain_gap else {
            return self
                .support
                .iter()
                .any(|&iv| !values.is_assigned(iv))
                .then_some(0);
        };

        // Later chain members start after every earlier present one.
        let mut first = 0;
        for &interval in &self.support {
            match values.get(interval) {
                None => return Some(first),
                Some(OptionalInterval::Absent) => return None,
                Some(OptionalInterval::Present(s)) => first = s.end() + gap,
            }
        }
        None
    }
}

/// A check that a complete valuation fails.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// The value lies outside the variable's domain.
    Domain(IntervalId),
    /// The constraint at this index is violated.
    Constraint(usize),
    /// The objective is below the declared floor.
    BelowFloor { objective: f64, floor: f64 },
}

/// Declarative model: variables, constraints and an additive objective.
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    horizon: usize,
    intervals: Vec<IntervalVar>,
    cumuls: Vec<CumulExpr>,
    states: Vec<StateFunction>,
    constraints: Vec<Constraint>,
    objective: Vec<CostTerm>,
    floor: Option<f64>,
    search_phase: Vec<IntervalId>,
    /// Node `i` stands for interval `i`; edges are end-before-start precedences.
    precedence: DiGraph<(), usize>,
}

impl Model {
    pub fn new(name: impl Into<String>, horizon: usize) -> Self {
        Self {
            name: name.into(),
            horizon,
            intervals: Vec::new(),
            cumuls: Vec::new(),
            states: Vec::new(),
            constraints: Vec::new(),
            objective: Vec::new(),
            floor: None,
            search_phase: Vec::new(),
            precedence: DiGraph::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    // ── declarations ────────────────────────────────────────────────────

    /// Declares an interval variable and returns its handle.
    pub fn interval_var(&mut self, var: IntervalVar) -> IntervalId {
        let id = IntervalId(self.intervals.len());
        self.intervals.push(var);
        self.precedence.add_node(());
        id
    }

    /// Declares an empty cumulative expression.
    pub fn cumul(&mut self, name: impl Into<String>) -> CumulId {
        let id = CumulId(self.cumuls.len());
        self.cumuls.push(CumulExpr {
            name: name.into(),
            pulses: Vec::new(),
        });
        id
    }

    /// Adds a pulse of `height` over `interval` to `cumul`.
    ///
    /// # Errors
    ///
    /// `UnknownCumul`, `UnknownInterval`, or `NegativeHeight` for a negative
    /// or non-finite height.
    pub fn add_pulse(
        &mut self,
        cumul: CumulId,
        interval: IntervalId,
        height: f64,
    ) -> Result<(), ModelError> {
        self.check_interval(interval)?;
        if !height.is_finite() || height < 0.0 {
            return Err(ModelError::NegativeHeight(height));
        }
        let expr = self
            .cumuls
            .get_mut(cumul.0)
            .ok_or(ModelError::UnknownCumul(cumul))?;
        expr.pulses.push((interval, height));
        Ok(())
    }

    /// Declares a state function that is true over its present `support`.
    pub fn state_function(
        &mut self,
        name: impl Into<String>,
        support: Vec<IntervalId>,
    ) -> Result<StateId, ModelError> {
        for &interval in &support {
            self.check_interval(interval)?;
        }
        let id = StateId(self.states.len());
        self.states.push(StateFunction {
            name: name.into(),
            support,
            chain_gap: None,
        });
        Ok(id)
    }

    /// Orders `segments` into a chain and declares the state that is true
    /// over their union.
    ///
    /// Segment `i` may only be present when segment `i - 1` is, and starts at
    /// least `gap` slots after it ends.
    pub fn add_segment_chain(
        &mut self,
        name: impl Into<String>,
        segments: Vec<IntervalId>,
        gap: usize,
    ) -> Result<StateId, ModelError> {
        for &segment in &segments {
            self.check_interval(segment)?;
        }
        for pair in segments.windows(2) {
            self.add_presence_implies(pair[1], pair[0])?;
            self.add_end_before_start(pair[0], pair[1], gap)?;
        }
        let id = StateId(self.states.len());
        self.states.push(StateFunction {
            name: name.into(),
            support: segments,
            chain_gap: Some(gap),
        });
        Ok(id)
    }

    pub fn add_presence_implies(
        &mut self,
        premise: IntervalId,
        consequence: IntervalId,
    ) -> Result<(), ModelError> {
        self.check_interval(premise)?;
        self.check_interval(consequence)?;
        self.constraints.push(Constraint::PresenceImplies {
            premise,
            consequence,
        });
        Ok(())
    }

    /// Requires `after` to start at least `delay` slots after `before` ends.
    ///
    /// # Errors
    ///
    /// `CycleDetected` if `before` is already (transitively) required to come
    /// after `after`.
    pub fn add_end_before_start(
        &mut self,
        before: IntervalId,
        after: IntervalId,
        delay: usize,
    ) -> Result<(), ModelError> {
        self.check_interval(before)?;
        self.check_interval(after)?;
        let (from, to) = (NodeIndex::new(before.0), NodeIndex::new(after.0));
        if before == after || has_path_connecting(&self.precedence, to, from, None) {
            return Err(ModelError::CycleDetected { before, after });
        }
        self.precedence.add_edge(from, to, delay);
        self.constraints.push(Constraint::EndBeforeStart {
            before,
            after,
            delay,
        });
        Ok(())
    }

    /// Requires exactly one of `candidates` to take the span of a present
    /// `master`. With no candidates the master can never be present.
    pub fn add_alternative(
        &mut self,
        master: IntervalId,
        candidates: Vec<IntervalId>,
    ) -> Result<(), ModelError> {
        self.check_interval(master)?;
        for &candidate in &candidates {
            self.check_interval(candidate)?;
        }
        self.constraints
            .push(Constraint::Alternative { master, candidates });
        Ok(())
    }

    pub fn add_always_true(
        &mut self,
        state: StateId,
        interval: IntervalId,
    ) -> Result<(), ModelError> {
        self.check_state(state)?;
        self.check_interval(interval)?;
        self.constraints
            .push(Constraint::AlwaysTrue { state, interval });
        Ok(())
    }

    pub fn add_always_in(
        &mut self,
        cumul: CumulId,
        interval: IntervalId,
        min: f64,
        max: f64,
    ) -> Result<(), ModelError> {
        self.check_cumul(cumul)?;
        self.check_interval(interval)?;
        self.constraints.push(Constraint::AlwaysIn {
            cumul,
            interval,
            min,
            max,
        });
        Ok(())
    }

    /// Caps `cumul` at `max` over the whole horizon.
    pub fn add_cumul_ceiling(&mut self, cumul: CumulId, max: f64) -> Result<(), ModelError> {
        self.check_cumul(cumul)?;
        self.constraints.push(Constraint::CumulCeiling { cumul, max });
        Ok(())
    }

    // ── objective ───────────────────────────────────────────────────────

    /// Adds a term to the minimized objective.
    pub fn add_cost(&mut self, term: CostTerm) -> Result<(), ModelError> {
        self.check_interval(term.interval())?;
        let weight = term.weight();
        if !weight.is_finite() || weight < 0.0 {
            return Err(ModelError::NegativeWeight(weight));
        }
        self.objective.push(term);
        Ok(())
    }

    pub fn clear_objective(&mut self) {
        self.objective.clear();
    }

    /// Rejects solutions whose objective is below `floor`.
    pub fn set_objective_floor(&mut self, floor: f64) {
        self.floor = Some(floor);
    }

    pub fn objective_floor(&self) -> Option<f64> {
        self.floor
    }

    /// Variables the engine should branch on first, in this order.
    pub fn set_search_phase(&mut self, order: Vec<IntervalId>) -> Result<(), ModelError> {
        for &interval in &order {
            self.check_interval(interval)?;
        }
        self.search_phase = order;
        Ok(())
    }

    // ── read access ─────────────────────────────────────────────────────

    pub fn interval(&self, id: IntervalId) -> &IntervalVar {
        &self.intervals[id.0]
    }

    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    pub fn interval_ids(&self) -> impl Iterator<Item = IntervalId> {
        (0..self.intervals.len()).map(IntervalId)
    }

    pub fn cumul_expr(&self, id: CumulId) -> &CumulExpr {
        &self.cumuls[id.0]
    }

    pub fn state(&self, id: StateId) -> &StateFunction {
        &self.states[id.0]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    pub fn objective(&self) -> &[CostTerm] {
        &self.objective
    }

    /// Search phase variables first, then every other variable in declaration order.
    pub fn search_order(&self) -> Vec<IntervalId> {
        let mut seen = HashSet::with_capacity(self.intervals.len());
        let mut order = Vec::with_capacity(self.intervals.len());
        for id in self.search_phase.iter().copied().chain(self.interval_ids()) {
            if seen.insert(id) {
                order.push(id);
            }
        }
        order
    }

    // ── evaluation ──────────────────────────────────────────────────────

    /// Objective value of a complete valuation.
    pub fn evaluate(&self, valuation: &Valuation) -> f64 {
        self.objective
            .iter()
            .map(|term| term.cost(&valuation.get(term.interval())))
            .sum()
    }

    /// Every domain, constraint and floor check that `valuation` fails.
    pub fn violations(&self, valuation: &Valuation) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self
            .interval_ids()
            .filter(|&id| !self.interval(id).admits(&valuation.get(id)))
            .map(Violation::Domain)
            .collect();

        let values = PartialValuation::from(valuation);
        violations.extend(
            self.constraints
                .iter()
                .enumerate()
                .filter(|(_, c)| c.is_violated(self, &values))
                .map(|(i, _)| Violation::Constraint(i)),
        );

        if let Some(floor) = self.floor {
            let objective = self.evaluate(valuation);
            if objective < floor - TOLERANCE {
                violations.push(Violation::BelowFloor { objective, floor });
            }
        }
        violations
    }

    // ── handle checks ───────────────────────────────────────────────────

    fn check_interval(&self, id: IntervalId) -> Result<(), ModelError> {
        if id.0 < self.intervals.len() {
            Ok(())
        } else {
            Err(ModelError::UnknownInterval(id))
        }
    }

    fn check_cumul(&self, id: CumulId) -> Result<(), ModelError> {
        if id.0 < self.cumuls.len() {
            Ok(())
        } else {
            Err(ModelError::UnknownCumul(id))
        }
    }

    fn check_state(&self, id: StateId) -> Result<(), ModelError> {
        if id.0 < self.states.len() {
            Ok(())
        } else {
            Err(ModelError::UnknownState(id))
        }
    }
}
