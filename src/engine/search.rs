//! Depth-first branch and bound over interval values.

use std::cmp::Reverse;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::{Engine, SearchStats, Solution, SolveParams, SolveStatus};
use crate::model::{IntervalId, Model, OptionalInterval, PartialValuation, Valuation, TOLERANCE};

/// Deterministic complete search.
///
/// Variables are branched on in the model's search order. Each variable's
/// values are tried cheapest first by their own objective contribution, with
/// the warm-start value (if any) ahead of all others. After every assignment
/// the constraints watching that variable are checked on the partial
/// valuation, and branches whose optimistic cost cannot beat the incumbent
/// are cut.
///
/// The search stops early when the incumbent meets the best proven bound
/// (the sum of per-variable minimum costs, or the model's objective floor).
#[derive(Debug, Clone)]
pub struct DepthFirstEngine {
    clock_stride: u64,
}

impl DepthFirstEngine {
    /// Creates an engine that reads the clock every `clock_stride` nodes.
    pub fn new(clock_stride: u64) -> Self {
        Self {
            clock_stride: clock_stride.max(1),
        }
    }
}

impl Default for DepthFirstEngine {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Engine for DepthFirstEngine {
    fn solve(&self, model: &Model, params: &SolveParams) -> Solution {
        Search::new(model, params, self.clock_stride).run()
    }
}

struct Search<'a> {
    model: &'a Model,
    params: &'a SolveParams,
    clock_stride: u64,
    order: Vec<IntervalId>,
    /// Ordered candidate values per interval index.
    domains: Vec<Vec<OptionalInterval>>,
    /// Constraint indices to re-check when an interval is assigned.
    watchers: Vec<Vec<usize>>,
    /// Objective term indices attached to each interval.
    terms: Vec<Vec<usize>>,
    /// Cheapest contribution each interval can make.
    floors: Vec<f64>,
    values: PartialValuation,
    partial_bound: f64,
    proven_bound: f64,
    incumbent: Option<(f64, Valuation)>,
    started: Instant,
    stats: SearchStats,
    limit_hit: bool,
    bound_reached: bool,
}

impl<'a> Search<'a> {
    fn new(model: &'a Model, params: &'a SolveParams, clock_stride: u64) -> Self {
        let count = model.interval_count();

        let mut terms = vec![Vec::new(); count];
        for (i, term) in model.objective().iter().enumerate() {
            terms[term.interval().index()].push(i);
        }

        let mut watchers: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (i, constraint) in model.constraints().iter().enumerate() {
            for interval in constraint.scope(model) {
                let list = &mut watchers[interval.index()];
                if list.last() != Some(&i) {
                    list.push(i);
                }
            }
        }

        let warm_start = params.warm_start.as_ref().filter(|w| {
            let usable = w.len() == count;
            if !usable {
                warn!(
                    expected = count,
                    actual = w.len(),
                    "ignoring warm start of the wrong size"
                );
            }
            usable
        });

        let mut search = Self {
            model,
            params,
            clock_stride,
            order: model.search_order(),
            domains: Vec::with_capacity(count),
            watchers,
            terms,
            floors: Vec::with_capacity(count),
            values: PartialValuation::unassigned(count),
            partial_bound: 0.0,
            proven_bound: 0.0,
            incumbent: None,
            started: Instant::now(),
            stats: SearchStats::default(),
            limit_hit: false,
            bound_reached: false,
        };

        for id in model.interval_ids() {
            let domain = search.ordered_domain(id, warm_start.map(|w| w.get(id)));
            let floor = domain
                .iter()
                .map(|v| search.local_cost(id, v))
                .fold(f64::INFINITY, f64::min);
            search.domains.push(domain);
            search.floors.push(floor);
        }

        search.partial_bound = search.floors.iter().sum();
        search.proven_bound = match model.objective_floor() {
            Some(floor) => search.partial_bound.max(floor),
            None => search.partial_bound,
        };
        search
    }

    /// Values of `id`, cheapest first; ties prefer present, earlier, longer.
    fn ordered_domain(
        &self,
        id: IntervalId,
        warm: Option<OptionalInterval>,
    ) -> Vec<OptionalInterval> {
        let var = self.model.interval(id);
        let mut domain: Vec<OptionalInterval> = var
            .present_values()
            .map(OptionalInterval::Present)
            .collect();
        if var.is_optional() {
            domain.push(OptionalInterval::Absent);
        }

        let mut keyed: Vec<_> = domain
            .into_iter()
            .map(|v| (self.local_cost(id, &v), v))
            .collect();
        keyed.sort_by(|(ca, a), (cb, b)| {
            ca.total_cmp(cb)
                .then_with(|| sort_key(a).cmp(&sort_key(b)))
        });
        let mut domain: Vec<_> = keyed.into_iter().map(|(_, v)| v).collect();

        if let Some(warm) = warm {
            if let Some(pos) = domain.iter().position(|v| *v == warm) {
                let value = domain.remove(pos);
                domain.insert(0, value);
            }
        }
        domain
    }

    fn local_cost(&self, id: IntervalId, value: &OptionalInterval) -> f64 {
        let objective = self.model.objective();
        self.terms[id.index()]
            .iter()
            .map(|&t| objective[t].cost(value))
            .sum()
    }

    fn run(mut self) -> Solution {
        if self.partial_bound.is_finite() {
            self.descend(0);
        } else {
            debug!(model = self.model.name(), "some variable has no finite value");
        }
        self.stats.elapsed = self.started.elapsed();

        let proven = !self.limit_hit || self.bound_reached;
        let status = match (&self.incumbent, proven) {
            (Some(_), true) => SolveStatus::Optimal,
            (Some(_), false) => SolveStatus::Feasible,
            (None, true) => SolveStatus::Infeasible,
            (None, false) => SolveStatus::Unknown,
        };
        let objective = self.incumbent.as_ref().map(|(obj, _)| *obj);
        let lower_bound = match (status, objective) {
            (SolveStatus::Optimal, Some(obj)) => obj,
            (SolveStatus::Infeasible, _) => f64::INFINITY,
            _ => self.proven_bound,
        };

        info!(
            model = self.model.name(),
            status = ?status,
            objective = ?objective,
            lower_bound,
            nodes = self.stats.nodes,
            solutions = self.stats.solutions,
            elapsed_ms = self.stats.elapsed.as_millis() as u64,
            "search finished"
        );

        Solution {
            status,
            objective,
            lower_bound,
            values: self.incumbent.map(|(_, values)| values),
            stats: self.stats,
        }
    }

    fn descend(&mut self, depth: usize) {
        let Some(&var) = self.order.get(depth) else {
            self.record_leaf();
            return;
        };
        let idx = var.index();

        for k in 0..self.domains[idx].len() {
            if self.out_of_budget() {
                return;
            }
            let value = self.domains[idx][k];
            self.stats.nodes += 1;

            let bound = self.partial_bound + self.local_cost(var, &value) - self.floors[idx];
            if self.is_dominated(bound) {
                // Past the first slot values are sorted by cost, so the rest are no better.
                if k > 0 {
                    break;
                }
                continue;
            }

            self.values.set(var, value);
            if self.is_consistent(idx) {
                let saved = self.partial_bound;
                self.partial_bound = bound;
                self.descend(depth + 1);
                self.partial_bound = saved;
            }
            self.values.clear(var);

            if self.limit_hit || self.bound_reached {
                return;
            }
        }
    }

    fn is_consistent(&self, idx: usize) -> bool {
        let constraints = self.model.constraints();
        self.watchers[idx]
            .iter()
            .all(|&c| !constraints[c].is_violated(self.model, &self.values))
    }

    fn is_dominated(&self, bound: f64) -> bool {
        !bound.is_finite()
            || self
                .incumbent
                .as_ref()
                .is_some_and(|(best, _)| bound >= best - TOLERANCE)
    }

    fn out_of_budget(&mut self) -> bool {
        if self.limit_hit || self.bound_reached {
            return true;
        }
        if let Some(limit) = self.params.node_limit {
            if self.stats.nodes >= limit {
                self.limit_hit = true;
            }
        }
        if self.stats.nodes % self.clock_stride == 0
            && self.started.elapsed() >= self.params.time_limit
        {
            self.limit_hit = true;
        }
        self.limit_hit
    }

    fn record_leaf(&mut self) {
        let Some(valuation) = self.values.complete() else {
            return;
        };
        let objective = self.model.evaluate(&valuation);
        if !objective.is_finite() {
            return;
        }
        if let Some(floor) = self.model.objective_floor() {
            if objective < floor - TOLERANCE {
                return;
            }
        }
        if self
            .incumbent
            .as_ref()
            .is_some_and(|(best, _)| objective >= best - TOLERANCE)
        {
            return;
        }

        self.stats.solutions += 1;
        debug!(
            model = self.model.name(),
            objective,
            nodes = self.stats.nodes,
            "new incumbent"
        );
        self.incumbent = Some((objective, valuation));
        if objective <= self.proven_bound + TOLERANCE {
            self.bound_reached = true;
        }
    }
}

/// Tie-break order: present before absent, earlier start, longer span.
fn sort_key(value: &OptionalInterval) -> (bool, usize, Reverse<usize>) {
    match value {
        OptionalInterval::Present(span) => (false, span.start(), Reverse(span.length())),
        OptionalInterval::Absent => (true, 0, Reverse(0)),
    }
}
