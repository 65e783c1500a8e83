//! Behavioural tests for [`DepthFirstEngine`].

use super::*;
use crate::model::{CostTerm, IntervalId, IntervalVar, OptionalInterval, SlotInterval};

fn present(start: usize, end: usize) -> OptionalInterval {
    OptionalInterval::present(start, end)
}

fn params() -> SolveParams {
    SolveParams::with_time_limit(Duration::from_secs(5))
}

/// One mandatory 2-slot task priced by start over prices `[1, 2, 3, 4]`.
fn single_task_model() -> (Model, IntervalId) {
    let mut model = Model::new("single", 4);
    let task = model.interval_var(IntervalVar::fixed_length("task", 0, 4, 2));
    model
        .add_cost(CostTerm::StartTable {
            interval: task,
            table: vec![3.0, 5.0, 7.0, 1e12].into(),
            weight: 1.0,
        })
        .unwrap();
    (model, task)
}

/// Two tasks on one machine sharing a capacity of 3 with demands of 2 each.
fn contended_model() -> (Model, IntervalId, IntervalId) {
    let mut model = Model::new("contended", 4);
    let a = model.interval_var(IntervalVar::fixed_length("a", 0, 4, 2));
    let b = model.interval_var(IntervalVar::fixed_length("b", 0, 4, 2));
    let load = model.cumul("load");
    model.add_pulse(load, a, 2.0).unwrap();
    model.add_pulse(load, b, 2.0).unwrap();
    model.add_cumul_ceiling(load, 3.0).unwrap();
    let table: std::sync::Arc<[f64]> = vec![3.0, 5.0, 7.0, 1e12].into();
    for iv in [a, b] {
        model
            .add_cost(CostTerm::StartTable {
                interval: iv,
                table: table.clone(),
                weight: 1.0,
            })
            .unwrap();
    }
    (model, a, b)
}

#[cfg(test)]
mod outcomes {
    use super::*;

    #[test]
    fn test_picks_cheapest_start() {
        let (model, task) = single_task_model();
        let solution = DepthFirstEngine::default().solve(&model, &params());

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, Some(3.0));
        assert_eq!(solution.lower_bound, 3.0);
        assert_eq!(solution.values.unwrap().get(task), present(0, 2));
    }

    #[test]
    fn test_empty_domain_is_infeasible() {
        let mut model = Model::new("narrow", 4);
        model.interval_var(IntervalVar::fixed_length("task", 3, 4, 2));
        let solution = DepthFirstEngine::default().solve(&model, &params());

        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(!solution.is_solution_found());
        assert!(solution.values.is_none());
        assert_eq!(solution.lower_bound, f64::INFINITY);
    }

    #[test]
    fn test_contention_staggers_tasks() {
        let (model, a, b) = contended_model();
        let solution = DepthFirstEngine::default().solve(&model, &params());

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, Some(10.0));
        let values = solution.values.unwrap();
        let (sa, sb) = (values.get(a).span().unwrap(), values.get(b).span().unwrap());
        assert!(!sa.overlaps(&sb));
        assert!(model.violations(&values).is_empty());
    }

    #[test]
    fn test_contention_without_room_is_infeasible() {
        let mut model = Model::new("no-room", 3);
        let a = model.interval_var(IntervalVar::fixed_length("a", 0, 3, 2));
        let b = model.interval_var(IntervalVar::fixed_length("b", 0, 3, 2));
        let load = model.cumul("load");
        model.add_pulse(load, a, 2.0).unwrap();
        model.add_pulse(load, b, 2.0).unwrap();
        model.add_cumul_ceiling(load, 3.0).unwrap();

        let solution = DepthFirstEngine::default().solve(&model, &params());
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_alternative_prefers_cheaper_candidate() {
        let mut model = Model::new("alt", 4);
        let master = model.interval_var(IntervalVar::fixed_length("m", 0, 4, 2));
        let x = model.interval_var(IntervalVar::fixed_length("x", 0, 4, 2).optional());
        let y = model.interval_var(IntervalVar::fixed_length("y", 0, 4, 2).optional());
        model.add_alternative(master, vec![x, y]).unwrap();
        let table: std::sync::Arc<[f64]> = vec![3.0, 5.0, 7.0, 1e12].into();
        for (iv, weight) in [(x, 2.0), (y, 1.0)] {
            model
                .add_cost(CostTerm::StartTable {
                    interval: iv,
                    table: table.clone(),
                    weight,
                })
                .unwrap();
        }

        let solution = DepthFirstEngine::default().solve(&model, &params());
        let values = solution.values.unwrap();
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(values.get(x), OptionalInterval::Absent);
        assert_eq!(values.get(y), present(0, 2));
        assert_eq!(values.get(master), present(0, 2));
    }

    #[test]
    fn test_presence_cost_keeps_optional_absent() {
        let mut model = Model::new("presence", 4);
        let seg = model.interval_var(IntervalVar::variable_length("seg", 0, 4, 1, 4).optional());
        model
            .add_cost(CostTerm::Presence {
                interval: seg,
                weight: 2.0,
            })
            .unwrap();

        let solution = DepthFirstEngine::default().solve(&model, &params());
        assert_eq!(solution.objective, Some(0.0));
        assert_eq!(solution.values.unwrap().get(seg), OptionalInterval::Absent);
    }

    #[test]
    fn test_model_without_variables() {
        let model = Model::new("empty", 4);
        let solution = DepthFirstEngine::default().solve(&model, &params());
        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, Some(0.0));
    }
}

#[cfg(test)]
mod limits_and_hints {
    use super::*;

    #[test]
    fn test_node_limit_without_solution_is_unknown() {
        let (model, _, _) = contended_model();
        let solution = DepthFirstEngine::default().solve(&model, &params().node_limit(1));

        assert_eq!(solution.status, SolveStatus::Unknown);
        assert!(solution.values.is_none());
        assert!(solution.lower_bound <= 10.0);
    }

    #[test]
    fn test_warm_start_is_first_leaf() {
        let (model, a, b) = contended_model();
        let warm = Valuation::new(vec![present(2, 4), present(0, 2)]);
        let solution = DepthFirstEngine::default()
            .solve(&model, &params().node_limit(2).warm_start(warm.clone()));

        assert_eq!(solution.status, SolveStatus::Feasible);
        assert_eq!(solution.values, Some(warm));
        assert_eq!(solution.objective, Some(10.0));
        assert!(solution.lower_bound <= 10.0);
        let _ = (a, b);
    }

    #[test]
    fn test_wrong_sized_warm_start_is_ignored() {
        let (model, task) = single_task_model();
        let warm = Valuation::new(vec![present(1, 3), present(0, 1)]);
        let solution = DepthFirstEngine::default().solve(&model, &params().warm_start(warm));
        assert_eq!(solution.values.unwrap().get(task), present(0, 2));
    }

    #[test]
    fn test_floor_rejects_cheaper_solutions() {
        let (mut model, task) = single_task_model();
        model.set_objective_floor(4.0);
        let solution = DepthFirstEngine::default().solve(&model, &params());

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, Some(5.0));
        assert_eq!(solution.values.unwrap().get(task), present(1, 3));
    }

    #[test]
    fn test_floor_at_optimum_stops_at_first_match() {
        let (mut model, _, _) = contended_model();
        model.set_objective_floor(10.0);
        let solution = DepthFirstEngine::default().solve(&model, &params());

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, Some(10.0));
        assert_eq!(solution.stats.solutions, 1);
    }

    #[test]
    fn test_zero_time_limit_stops_immediately() {
        let (model, _, _) = contended_model();
        let solution = DepthFirstEngine::new(1)
            .solve(&model, &SolveParams::with_time_limit(Duration::ZERO));
        assert_eq!(solution.status, SolveStatus::Unknown);
        assert_eq!(solution.stats.nodes, 0);
    }

    #[test]
    fn test_status_helpers() {
        assert!(SolveStatus::Optimal.has_solution());
        assert!(SolveStatus::Feasible.has_solution());
        assert!(!SolveStatus::Infeasible.has_solution());
        assert!(!SolveStatus::Unknown.has_solution());
        assert!(SolveStatus::Optimal.is_optimal());
        assert!(!SolveStatus::Feasible.is_optimal());
    }

    #[test]
    fn test_span_of_result_is_slot_interval() {
        let (model, task) = single_task_model();
        let solution = DepthFirstEngine::default().solve(&model, &params());
        assert_eq!(
            solution.values.unwrap().get(task).span(),
            Some(SlotInterval::new(0, 2))
        );
    }
}
