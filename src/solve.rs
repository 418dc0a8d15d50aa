use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assignment::{constrain_assignment, init_placement_variables};
use crate::cbc::CbcEngine;
use crate::engine::{Engine, EngineStatus};
use crate::error::SolveError;
use crate::instance::{Config, Instance, LevelTensor};
use crate::model::{Model, VarGrid};
use crate::waiver::{constrain_waivers, init_waiver_variables};

/// Status surfaced to callers of [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveStatus {
    Optimal,
    /// The time limit ran out before optimality (or anything at all) was proven.
    FeasibleOrUnknown,
    Infeasible,
}

/// Result of one solve attempt.
///
/// `placements` is item-major (`item * num_groups + group`) and `waivers` is
/// group-major (`group * num_properties + property`). Both are empty unless
/// the status is [`SolveStatus::Optimal`].
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub status: SolveStatus,
    pub placements: Vec<bool>,
    pub waivers: Vec<bool>,
    /// Weighted count of waived requirements.
    pub objective: Option<i64>,
    /// Human-readable diagnostic, no contractual meaning beyond `status`.
    pub message: String,
    num_groups: usize,
    num_properties: usize,
}

impl Outcome {
    fn unsolved(status: SolveStatus, message: String, instance: &Instance) -> Self {
        Outcome {
            status,
            placements: Vec::new(),
            waivers: Vec::new(),
            objective: None,
            message,
            num_groups: instance.num_groups(),
            num_properties: instance.num_properties(),
        }
    }

    /// Group index of every item, decoded from the placement flags.
    pub fn assignment(&self) -> Option<Vec<usize>> {
        if self.status != SolveStatus::Optimal || self.num_groups == 0 {
            return None;
        }
        self.placements
            .chunks(self.num_groups)
            .map(|row| row.iter().position(|&placed| placed))
            .collect()
    }

    /// `(group, property)` pairs whose requirement was waived.
    pub fn waived(&self) -> Vec<(usize, usize)> {
        if self.num_properties == 0 {
            return Vec::new();
        }
        self.waivers
            .iter()
            .enumerate()
            .filter(|&(_, &waived)| waived)
            .map(|(index, _)| (index / self.num_properties, index % self.num_properties))
            .collect()
    }
}

/// The composed model plus the two variable blocks result extraction reads.
#[derive(Debug, Clone)]
pub struct Encoding {
    pub model: Model,
    pub placement: VarGrid,
    pub waivers: VarGrid,
}

/// Build the full model: uniqueness, minimum size, waiver eligibility,
/// satisfaction (only when something is required) and the cost objective.
pub fn encode(instance: &Instance) -> Encoding {
    let levels = LevelTensor::new(instance);

    let mut model = Model::new();
    let placement = init_placement_variables(&mut model, instance);
    let waivers = init_waiver_variables(&mut model, instance);

    let model = constrain_assignment(model, instance, &placement);
    let model = constrain_waivers(model, instance, &levels, &placement, &waivers);

    Encoding {
        model,
        placement,
        waivers,
    }
}

/// Solve with the default CBC engine.
pub fn solve(instance: &Instance, config: &Config) -> Result<Outcome, SolveError> {
    solve_with(&CbcEngine, instance, config)
}

/// Encode `instance`, run `engine` exactly once and interpret its report.
///
/// Infeasibility and an exhausted time budget are ordinary outcomes; only a
/// rejected instance or a model the engine refuses is an error.
pub fn solve_with<E: Engine + ?Sized>(
    engine: &E,
    instance: &Instance,
    config: &Config,
) -> Result<Outcome, SolveError> {
    let time_limit = config.time_limit()?;
    let encoding = encode(instance);

    let report = engine.solve(&encoding.model, time_limit);
    info!("Status = {}", report.status);

    let outcome = match report.status {
        EngineStatus::Optimal => {
            if report.values.len() != encoding.model.num_vars() {
                return Err(SolveError::IncompleteSolution {
                    expected: encoding.model.num_vars(),
                    found: report.values.len(),
                });
            }
            let objective = match report.objective {
                Some(value) => value.round() as i64,
                None => encoding
                    .model
                    .objective()
                    .map_or(0, |objective| objective.expr.evaluate(&report.values)),
            };
            info!("Total cost = {objective}");
            Outcome {
                status: SolveStatus::Optimal,
                placements: encoding.placement.values(&report.values),
                waivers: encoding.waivers.values(&report.values),
                objective: Some(objective),
                message: format!("Optimal solution found with total cost {objective}"),
                num_groups: instance.num_groups(),
                num_properties: instance.num_properties(),
            }
        }
        EngineStatus::Feasible | EngineStatus::Unknown => {
            let message = match report.detail {
                Some(detail) => {
                    format!("No optimal solution could be found in the allotted time ({detail})")
                }
                None => "No optimal solution could be found in the allotted time".to_string(),
            };
            warn!("{message}");
            Outcome::unsolved(SolveStatus::FeasibleOrUnknown, message, instance)
        }
        EngineStatus::Infeasible => {
            let message = "There is no solution".to_string();
            info!("{message}");
            Outcome::unsolved(SolveStatus::Infeasible, message, instance)
        }
        EngineStatus::ModelInvalid => {
            return Err(SolveError::ModelInvalid(
                report
                    .detail
                    .unwrap_or_else(|| EngineStatus::ModelInvalid.to_string()),
            ));
        }
    };

    info!("Done!");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineReport;
    use crate::error::InstanceError;
    use std::cell::Cell;
    use std::time::Duration;

    /// Engine that returns a canned report and counts its calls.
    struct StubEngine {
        report: EngineReport,
        calls: Cell<usize>,
        last_time_limit: Cell<Option<Duration>>,
    }

    impl StubEngine {
        fn new(report: EngineReport) -> Self {
            StubEngine {
                report,
                calls: Cell::new(0),
                last_time_limit: Cell::new(None),
            }
        }
    }

    impl Engine for StubEngine {
        fn solve(&self, _model: &Model, time_limit: Duration) -> EngineReport {
            self.calls.set(self.calls.get() + 1);
            self.last_time_limit.set(Some(time_limit));
            self.report.clone()
        }
    }

    fn scenario_a_levels() -> Vec<Vec<u8>> {
        vec![
            vec![2, 0, 1, 0, 1],
            vec![0, 2, 1, 1, 1],
            vec![0, 2, 3, 0, 0],
            vec![0, 1, 1, 2, 2],
        ]
    }

    fn scenario_requirements() -> Vec<Vec<u8>> {
        vec![
            vec![1, 1, 0, 0, 0],
            vec![0, 1, 1, 0, 0],
            vec![0, 0, 0, 1, 1],
        ]
    }

    fn scenario_a() -> Instance {
        Instance::new(scenario_a_levels(), scenario_requirements(), vec![1, 1, 1]).unwrap()
    }

    fn scenario_b() -> Instance {
        let mut levels = scenario_a_levels();
        levels[3][3] = 1;
        Instance::new(levels, scenario_requirements(), vec![1, 1, 1]).unwrap()
    }

    const EXPECTED_PLACEMENTS: [bool; 12] = [
        true, false, false, true, false, false, false, true, false, false, false, true,
    ];

    #[test]
    fn scenario_a_waives_nothing() {
        let outcome = solve(&scenario_a(), &Config::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.placements, EXPECTED_PLACEMENTS);
        assert_eq!(outcome.waivers, vec![false; 15]);
        assert_eq!(outcome.objective, Some(0));
        assert_eq!(outcome.assignment(), Some(vec![0, 0, 1, 2]));
        assert!(outcome.waived().is_empty());
    }

    #[test]
    fn scenario_b_waives_one_requirement() {
        let outcome = solve(&scenario_b(), &Config::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.placements, EXPECTED_PLACEMENTS);
        let mut expected_waivers = vec![false; 15];
        expected_waivers[13] = true;
        assert_eq!(outcome.waivers, expected_waivers);
        assert_eq!(outcome.objective, Some(1));
        assert_eq!(outcome.waived(), vec![(2, 3)]);
    }

    #[test]
    fn oversubscribed_groups_are_infeasible() {
        let instance =
            Instance::new(scenario_a_levels(), scenario_requirements(), vec![2, 2, 1]).unwrap();
        let outcome = solve(&instance, &Config::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.placements.is_empty());
        assert!(outcome.waivers.is_empty());
        assert_eq!(outcome.objective, None);
        assert_eq!(outcome.assignment(), None);
    }

    #[test]
    fn custom_costs_steer_which_requirement_is_waived() {
        // Only item 0 qualifies for anything, so exactly one group must waive
        let instance = Instance::new(
            vec![vec![3, 3], vec![0, 0]],
            vec![vec![1, 0], vec![0, 1]],
            vec![1, 1],
        )
        .unwrap()
        .with_costs(vec![vec![3, 0], vec![0, 8]])
        .unwrap();
        let outcome = solve(&instance, &Config::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.assignment(), Some(vec![1, 0]));
        assert_eq!(outcome.waivers, vec![true, false, false, false]);
        assert_eq!(outcome.objective, Some(3));
    }

    #[test]
    fn missing_objective_is_recomputed_from_values() {
        let instance = scenario_b();
        let encoding = encode(&instance);
        let mut values = vec![false; encoding.model.num_vars()];
        for (item, group) in [(0, 0), (1, 0), (2, 1), (3, 2)] {
            values[encoding.placement.get(item, group).index()] = true;
        }
        values[encoding.waivers.get(2, 3).index()] = true;
        let engine = StubEngine::new(EngineReport {
            status: EngineStatus::Optimal,
            values,
            objective: None,
            detail: None,
        });

        let outcome = solve_with(&engine, &instance, &Config::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert_eq!(outcome.objective, Some(1));
        assert_eq!(outcome.waived(), vec![(2, 3)]);
    }

    #[test]
    fn optimal_report_without_values_is_rejected() {
        let engine = StubEngine::new(EngineReport::empty(EngineStatus::Optimal));
        let err = solve_with(&engine, &scenario_a(), &Config::default()).unwrap_err();
        assert!(matches!(
            err,
            SolveError::IncompleteSolution {
                expected: 27,
                found: 0
            }
        ));
    }

    #[test]
    fn timeout_surfaces_no_partial_assignment() {
        let instance = scenario_a();
        let mut values = vec![false; encode(&instance).model.num_vars()];
        values[0] = true;
        let engine = StubEngine::new(EngineReport {
            status: EngineStatus::Feasible,
            values,
            objective: Some(2.0),
            detail: None,
        });

        let outcome = solve_with(&engine, &instance, &Config::with_time_limit(0.001)).unwrap();
        assert_eq!(outcome.status, SolveStatus::FeasibleOrUnknown);
        assert!(outcome.placements.is_empty());
        assert!(outcome.waivers.is_empty());
        assert_eq!(outcome.objective, None);
        assert_eq!(engine.calls.get(), 1);
        assert_eq!(engine.last_time_limit.get(), Some(Duration::from_millis(1)));
    }

    #[test]
    fn unknown_status_is_reported_as_feasible_or_unknown() {
        let engine =
            StubEngine::new(EngineReport::empty(EngineStatus::Unknown).with_detail("Stopped"));
        let outcome = solve_with(&engine, &scenario_a(), &Config::default()).unwrap();
        assert_eq!(outcome.status, SolveStatus::FeasibleOrUnknown);
        assert!(outcome.message.contains("Stopped"));
    }

    #[test]
    fn model_invalid_is_fatal() {
        let engine =
            StubEngine::new(EngineReport::empty(EngineStatus::ModelInvalid).with_detail("bad row"));
        let err = solve_with(&engine, &scenario_a(), &Config::default()).unwrap_err();
        assert!(matches!(err, SolveError::ModelInvalid(detail) if detail == "bad row"));
    }

    #[test]
    fn invalid_config_fails_before_the_engine_runs() {
        let engine = StubEngine::new(EngineReport::empty(EngineStatus::Optimal));
        let err = solve_with(&engine, &scenario_a(), &Config::with_time_limit(0.0)).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Instance(InstanceError::InvalidTimeLimit(_))
        ));
        assert_eq!(engine.calls.get(), 0);
    }

    #[test]
    fn tiny_time_limit_never_crashes() {
        let instance = Instance::new(
            (0..40).map(|i| (0..8).map(|k| ((i * 7 + k * 3) % 4) as u8).collect()).collect(),
            (0..12).map(|j| (0..8).map(|k| u8::from((j + k) % 3 == 0)).collect()).collect(),
            vec![3; 12],
        )
        .unwrap();
        let outcome = solve(&instance, &Config::with_time_limit(0.01)).unwrap();
        match outcome.status {
            SolveStatus::Optimal => assert_eq!(outcome.placements.len(), 40 * 12),
            SolveStatus::FeasibleOrUnknown => {
                assert!(outcome.placements.is_empty());
                assert!(outcome.waivers.is_empty());
            }
            SolveStatus::Infeasible => panic!("instance has room for every group"),
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let first = encode(&scenario_b());
        let second = encode(&scenario_b());
        assert_eq!(first.model.constraints(), second.model.constraints());
        assert_eq!(first.model.objective(), second.model.objective());
        assert_eq!(first.placement.get(3, 2).index(), 11);
        assert_eq!(first.waivers.get(0, 0).index(), 12);
    }

    #[test]
    fn independent_instances_solve_concurrently() {
        let instances = [scenario_a(), scenario_b()];
        let objectives: Vec<Option<i64>> = std::thread::scope(|scope| {
            let handles: Vec<_> = instances
                .iter()
                .map(|instance| scope.spawn(move || solve(instance, &Config::default())))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap().unwrap().objective)
                .collect()
        });
        assert_eq!(objectives, vec![Some(0), Some(1)]);
    }
}
