//! Constraint kinds and their evaluation on partial valuations.
//!
//! Every check here is sound on partial valuations: a constraint reports a
//! violation only when no completion of the currently assigned variables can
//! satisfy it. On a complete valuation the checks are exact.

use std::fmt;

use super::interval::OptionalInterval;
use super::valuation::PartialValuation;
use super::{CumulId, IntervalId, Model, StateId, TOLERANCE};

/// A relation between interval variables, cumuls and state functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// If `premise` is present then `consequence` is present.
    PresenceImplies {
        premise: IntervalId,
        consequence: IntervalId,
    },
    /// When both are present, `after` starts at least `delay` slots after `before` ends.
    EndBeforeStart {
        before: IntervalId,
        after: IntervalId,
        delay: usize,
    },
    /// When `master` is present exactly one candidate is present, with the
    /// master's span; when `master` is absent every candidate is absent.
    Alternative {
        master: IntervalId,
        candidates: Vec<IntervalId>,
    },
    /// When `interval` is present the state is true at every slot of its span.
    AlwaysTrue { state: StateId, interval: IntervalId },
    /// When `interval` is present the cumul stays within `[min, max]` over its span.
    AlwaysIn {
        cumul: CumulId,
        interval: IntervalId,
        min: f64,
        max: f64,
    },
    /// The cumul never exceeds `max` at any slot.
    CumulCeiling { cumul: CumulId, max: f64 },
}

impl Constraint {
    /// Interval variables whose value can change the outcome of this constraint.
    pub fn scope(&self, model: &Model) -> Vec<IntervalId> {
        match self {
            Constraint::PresenceImplies {
                premise,
                consequence,
            } => vec![*premise, *consequence],
            Constraint::EndBeforeStart { before, after, .. } => vec![*before, *after],
            Constraint::Alternative { master, candidates } => {
                std::iter::once(*master).chain(candidates.iter().copied()).collect()
            }
            Constraint::AlwaysTrue { state, interval } => {
                let mut scope = model.state(*state).support().to_vec();
                scope.push(*interval);
                scope
            }
            Constraint::AlwaysIn {
                cumul, interval, ..
            } => {
                let pulses = model.cumul_expr(*cumul).pulses();
                let mut scope: Vec<_> = pulses.iter().map(|p| p.0).collect();
                scope.push(*interval);
                scope
            }
            Constraint::CumulCeiling { cumul, .. } => {
                model.cumul_expr(*cumul).pulses().iter().map(|p| p.0).collect()
            }
        }
    }

    /// Returns true if no completion of `values` can satisfy this constraint.
    pub fn is_violated(&self, model: &Model, values: &PartialValuation) -> bool {
        match self {
            Constraint::PresenceImplies {
                premise,
                consequence,
            } => matches!(
                (values.get(*premise), values.get(*consequence)),
                (
                    Some(OptionalInterval::Present(_)),
                    Some(OptionalInterval::Absent)
                )
            ),
            Constraint::EndBeforeStart {
                before,
                after,
                delay,
            } => match (values.get(*before), values.get(*after)) {
                (Some(OptionalInterval::Present(a)), Some(OptionalInterval::Present(b))) => {
                    a.end() + delay > b.start()
                }
                _ => false,
            },
            Constraint::Alternative { master, candidates } => {
                alternative_violated(model, values, *master, candidates)
            }
            Constraint::AlwaysTrue { state, interval } => {
                let Some(OptionalInterval::Present(span)) = values.get(*interval) else {
                    return false;
                };
                matches!(model.state(*state).holds_over(values, span), Some(false))
            }
            Constraint::AlwaysIn {
                cumul,
                interval,
                min,
                max,
            } => {
                let Some(OptionalInterval::Present(span)) = values.get(*interval) else {
                    return false;
                };
                let expr = model.cumul_expr(*cumul);
                let (low, high) = expr.profile(values).extrema_over(span);
                // Pulse heights are non-negative, so unassigned pulses can only raise the level.
                high > max + TOLERANCE || (expr.is_fixed(values) && low < min - TOLERANCE)
            }
            Constraint::CumulCeiling { cumul, max } => {
                model.cumul_expr(*cumul).profile(values).peak() > max + TOLERANCE
            }
        }
    }

    /// Short label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Constraint::PresenceImplies { .. } => "presence_implies",
            Constraint::EndBeforeStart { .. } => "end_before_start",
            Constraint::Alternative { .. } => "alternative",
            Constraint::AlwaysTrue { .. } => "always_true",
            Constraint::AlwaysIn { .. } => "always_in",
            Constraint::CumulCeiling { .. } => "cumul_ceiling",
        }
    }
}

fn alternative_violated(
    model: &Model,
    values: &PartialValuation,
    master: IntervalId,
    candidates: &[IntervalId],
) -> bool {
    let mut realized = None;
    let mut unassigned = 0;
    for &candidate in candidates {
        match values.get(candidate) {
            None => unassigned += 1,
            Some(OptionalInterval::Absent) => {}
            Some(OptionalInterval::Present(span)) => {
                if realized.is_some() {
                    return true;
                }
                realized = Some(span);
            }
        }
    }

    match values.get(master) {
        Some(OptionalInterval::Absent) => realized.is_some(),
        Some(OptionalInterval::Present(master_span)) => match realized {
            Some(span) => span != master_span,
            None => unassigned == 0,
        },
        None => {
            realized.is_none() && unassigned == 0 && !model.interval(master).is_optional()
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::PresenceImplies {
                premise,
                consequence,
            } => write!(f, "presence({premise}) => presence({consequence})"),
            Constraint::EndBeforeStart {
                before,
                after,
                delay,
            } => write!(f, "end({before}) + {delay} <= start({after})"),
            Constraint::Alternative { master, candidates } => {
                write!(f, "alternative({master}, {} candidates)", candidates.len())
            }
            Constraint::AlwaysTrue { state, interval } => {
                write!(f, "always_true({state}, {interval})")
            }
            Constraint::AlwaysIn {
                cumul,
                interval,
                min,
                max,
            } => write!(f, "always_in({cumul}, {interval}, {min}, {max})"),
            Constraint::CumulCeiling { cumul, max } => write!(f, "{cumul} <= {max}"),
        }
    }
}
