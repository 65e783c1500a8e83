//! Model-building and end-to-end decoding tests for [`SchedulingModel`].

use std::time::Duration;

use super::*;
use crate::engine::{DepthFirstEngine, Engine, SolveParams, SolveStatus};
use crate::instance::{Machine, Task};
use crate::model::{OptionalInterval, SlotInterval, Violation};

fn machine(id: u64, capacity: f64, idle: f64) -> Machine {
    Machine {
        id,
        idle_consumption: idle,
        power_up_cost: 0.0,
        power_down_cost: 0.0,
        resource_capacities: vec![capacity],
    }
}

fn task(id: u64, duration: usize, window: (usize, usize), usage: f64) -> Task {
    Task {
        id,
        duration,
        earliest_start: window.0,
        latest_end: window.1,
        power_consumption: 1.0,
        resource_usage: vec![usage],
    }
}

/// Horizon 4 with prices `[1, 2, 3, 4]`.
fn instance(machines: Vec<Machine>, tasks: Vec<Task>) -> Instance {
    Instance {
        time_resolution: 360,
        resources: 1,
        energy_prices: vec![1.0, 2.0, 3.0, 4.0],
        machines,
        tasks,
    }
}

fn build(instance: &Instance) -> (SchedulingModel, EnergyLedger) {
    let ledger = EnergyLedger::new(&instance.energy_prices);
    let model = SchedulingModel::build(instance, &ledger, &TimelineOptions::default()).unwrap();
    (model, ledger)
}

fn solve(model: &Model) -> crate::engine::Solution {
    DepthFirstEngine::default().solve(model, &SolveParams::with_time_limit(Duration::from_secs(10)))
}

#[cfg(test)]
mod construction {
    use super::*;

    #[test]
    fn test_segment_count_defaults_to_min_of_horizon_and_tasks() {
        let options = TimelineOptions::default();
        assert_eq!(options.segment_count(4, 1), 1);
        assert_eq!(options.segment_count(4, 9), 4);

        let options = TimelineOptions {
            max_segments_per_machine: Some(2),
            ..options
        };
        assert_eq!(options.segment_count(4, 9), 2);
    }

    #[test]
    fn test_variables_and_search_order() {
        let inst = instance(
            vec![machine(1, 2.0, 1.0), machine(2, 2.0, 1.0)],
            vec![task(10, 2, (0, 4), 1.0)],
        );
        let (model, _) = build(&inst);

        // One segment per machine, one master, one candidate per machine.
        assert_eq!(model.base().interval_count(), 5);
        assert_eq!(model.timelines().len(), 2);

        let assignment = &model.assignments()[0];
        assert_eq!(assignment.task_id(), 10);
        let mut expected: Vec<_> = assignment.decision_order().collect();
        expected.extend(model.timelines().iter().flat_map(|t| t.segments().iter().copied()));
        assert_eq!(model.base().search_order(), expected);
    }

    #[test]
    fn test_resource_profiles_per_machine_and_resource() {
        let inst = instance(vec![machine(1, 2.0, 1.0)], vec![task(10, 2, (0, 4), 1.0)]);
        let (model, _) = build(&inst);
        let cumul = model.resources().profile(0, 0).unwrap();
        assert_eq!(model.base().cumul_expr(cumul).pulses().len(), 1);
        assert_eq!(model.resources().profile(0, 1), None);
        assert_eq!(model.resources().profile(1, 0), None);
    }

    #[test]
    fn test_zero_usage_adds_no_pulse() {
        let inst = instance(vec![machine(1, 2.0, 1.0)], vec![task(10, 2, (0, 4), 0.0)]);
        let (model, _) = build(&inst);
        let cumul = model.resources().profile(0, 0).unwrap();
        assert!(model.base().cumul_expr(cumul).pulses().is_empty());
    }

    #[test]
    fn test_objectives_per_phase() {
        let inst = instance(vec![machine(1, 2.0, 1.0)], vec![task(10, 2, (0, 4), 1.0)]);
        let (model, _) = build(&inst);

        let phase1 = model.task_energy_model().unwrap();
        assert_eq!(phase1.objective().len(), 1);
        assert_eq!(phase1.objective_floor(), None);

        let phase2 = model.full_cost_model(3.0).unwrap();
        assert_eq!(phase2.objective().len(), 3);
        assert_eq!(phase2.objective_floor(), Some(3.0));
        assert_eq!(phase2.interval_count(), phase1.interval_count());
    }

    #[test]
    fn test_feed_rejects_unknown_machine_row() {
        let inst = instance(vec![machine(1, 2.0, 1.0)], vec![task(10, 2, (0, 4), 1.0)]);
        let (model, _) = build(&inst);
        let mut base = model.base().clone();
        let candidate = model.assignments()[0].candidates()[0].1;
        assert_eq!(
            model.resources().feed(&mut base, 1, candidate, &[1.0]),
            Err(ModelError::MissingProfiles(1))
        );
    }
}

#[cfg(test)]
mod timeline_rules {
    use super::*;

    fn timeline(gap: usize) -> (Model, MachineTimeline) {
        let mut model = Model::new("timeline", 8);
        let tl = MachineTimeline::build(&mut model, &machine(1, 1.0, 1.0), 3, gap).unwrap();
        (model, tl)
    }

    fn valuation(values: &[OptionalInterval]) -> Valuation {
        Valuation::new(values.to_vec())
    }

    #[test]
    fn test_segments_fill_from_first_index() {
        let (model, _) = timeline(1);
        let absent = OptionalInterval::Absent;
        let gap = valuation(&[absent, OptionalInterval::present(0, 2), absent]);
        assert!(!model.violations(&gap).is_empty());

        let prefix = valuation(&[OptionalInterval::present(0, 2), absent, absent]);
        assert!(model.violations(&prefix).is_empty());
    }

    #[test]
    fn test_segments_keep_the_gap() {
        let (model, _) = timeline(1);
        let touching = valuation(&[
            OptionalInterval::present(0, 2),
            OptionalInterval::present(2, 4),
            OptionalInterval::Absent,
        ]);
        assert!(matches!(
            model.violations(&touching).as_slice(),
            [Violation::Constraint(_)]
        ));

        let (model, _) = timeline(0);
        assert!(model.violations(&touching).is_empty());
    }

    #[test]
    fn test_decode_and_cycling_terms() {
        let (_, tl) = timeline(1);
        let values = valuation(&[
            OptionalInterval::present(0, 2),
            OptionalInterval::present(4, 6),
            OptionalInterval::Absent,
        ]);
        let schedule = tl.decode(&values).unwrap();
        assert_eq!(schedule.machine_id(), 1);
        assert_eq!(
            schedule.segments().collect::<Vec<_>>(),
            vec![SlotInterval::new(0, 2), SlotInterval::new(4, 6)]
        );

        let ledger = EnergyLedger::new(&[1.0; 8]);
        let terms = tl.cycling_terms(&machine(1, 1.0, 2.0), &ledger);
        assert_eq!(terms.len(), 6);
        let total: f64 = terms.iter().map(|t| t.cost(&values.get(t.interval()))).sum();
        assert_eq!(total, 8.0);
    }
}

#[cfg(test)]
mod solved {
    use super::*;

    #[test]
    fn test_single_task_takes_cheapest_window() {
        let inst = instance(vec![machine(1, 2.0, 1.0)], vec![task(10, 2, (0, 4), 1.0)]);
        let (model, ledger) = build(&inst);

        let phase1 = solve(&model.task_energy_model().unwrap());
        assert_eq!(phase1.status, SolveStatus::Optimal);
        assert_eq!(phase1.objective, Some(3.0));

        let phase2 = solve(&model.full_cost_model(phase1.lower_bound).unwrap());
        assert_eq!(phase2.status, SolveStatus::Optimal);
        assert_eq!(phase2.objective, Some(6.0));

        let schedule = model.decode(&inst, &ledger, &phase2.values.unwrap()).unwrap();
        assert_eq!(schedule.placement(10).unwrap().span, SlotInterval::new(0, 2));
        assert_eq!(
            schedule.machine(1).unwrap().segments().collect::<Vec<_>>(),
            vec![SlotInterval::new(0, 2)]
        );
        assert_eq!(schedule.cost().task_energy, 3.0);
        assert_eq!(schedule.cost().idle_energy, 3.0);
        assert_eq!(schedule.verify(&inst, 1), Ok(()));
    }

    #[test]
    fn test_contention_staggers_on_one_machine() {
        let inst = instance(
            vec![machine(1, 3.0, 0.0)],
            vec![task(10, 2, (0, 4), 2.0), task(11, 2, (0, 4), 2.0)],
        );
        let (model, ledger) = build(&inst);
        let solution = solve(&model.task_energy_model().unwrap());

        assert_eq!(solution.status, SolveStatus::Optimal);
        assert_eq!(solution.objective, Some(10.0));
        let schedule = model.decode(&inst, &ledger, &solution.values.unwrap()).unwrap();
        let a = schedule.placement(10).unwrap().span;
        let b = schedule.placement(11).unwrap().span;
        assert!(!a.overlaps(&b));
        assert_eq!(schedule.verify(&inst, 1), Ok(()));
    }

    #[test]
    fn test_second_machine_absorbs_contention() {
        let inst = instance(
            vec![machine(1, 3.0, 0.0), machine(2, 3.0, 0.0)],
            vec![task(10, 2, (0, 4), 2.0), task(11, 2, (0, 4), 2.0)],
        );
        let (model, ledger) = build(&inst);
        let solution = solve(&model.task_energy_model().unwrap());

        assert_eq!(solution.objective, Some(6.0));
        let schedule = model.decode(&inst, &ledger, &solution.values.unwrap()).unwrap();
        assert_ne!(
            schedule.placement(10).unwrap().machine_id,
            schedule.placement(11).unwrap().machine_id
        );
        assert_eq!(schedule.verify(&inst, 1), Ok(()));
    }

    #[test]
    fn test_contention_without_room_is_infeasible() {
        let inst = instance(
            vec![machine(1, 3.0, 0.0)],
            vec![task(10, 2, (0, 3), 2.0), task(11, 2, (0, 3), 2.0)],
        );
        let (model, _) = build(&inst);
        let solution = solve(&model.task_energy_model().unwrap());
        assert_eq!(solution.status, SolveStatus::Infeasible);
    }

    #[test]
    fn test_task_without_machines_is_infeasible() {
        let inst = instance(vec![], vec![task(10, 2, (0, 4), 1.0)]);
        let (model, _) = build(&inst);
        assert!(model.assignments()[0].candidates().is_empty());

        let solution = solve(&model.task_energy_model().unwrap());
        assert_eq!(solution.status, SolveStatus::Infeasible);
        assert!(solution.values.is_none());
    }

    #[test]
    fn test_decode_requires_a_realized_candidate() {
        let inst = instance(vec![machine(1, 2.0, 1.0)], vec![task(10, 2, (0, 4), 1.0)]);
        let (model, ledger) = build(&inst);
        let values = Valuation::new(vec![OptionalInterval::Absent; model.base().interval_count()]);
        assert_eq!(
            model.decode(&inst, &ledger, &values),
            Err(ScheduleError::UnplacedTask(10))
        );
    }
}
