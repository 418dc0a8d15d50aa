use good_lp::Solution as LpSolution;
use good_lp::solvers::coin_cbc::{CoinCbcProblem, coin_cbc};
use good_lp::{
    Constraint, Expression, ProblemVariables, ResolutionError, SolutionStatus, SolverModel,
    Variable, variable, variables,
};
use std::time::Duration;
use tracing::debug;

use crate::engine::{Engine, EngineReport, EngineStatus};
use crate::model::{Comparison, LinearConstraint, LinearExpr, Literal, Model, Sense};

/// Solves models as a MILP with COIN-OR CBC through `good_lp`.
///
/// Enforcement literals are linearised with a big-M taken from the bounds of
/// the guarded expression, which is exact because every variable is binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct CbcEngine;

impl Engine for CbcEngine {
    fn solve(&self, model: &Model, time_limit: Duration) -> EngineReport {
        if model.num_vars() == 0 {
            // CBC refuses an empty column set; the empty assignment decides the model
            let status = if model.is_satisfied_by(&[]) {
                EngineStatus::Optimal
            } else {
                EngineStatus::Infeasible
            };
            return EngineReport {
                objective: (status == EngineStatus::Optimal).then_some(0.0),
                ..EngineReport::empty(status)
            };
        }

        let (variables, lp_vars) = init_variables(model);
        let objective = create_objective_function(model, &lp_vars);
        let problem = create_model(variables, objective, model, time_limit);
        let problem = constrain_model(problem, model.constraints(), &lp_vars);

        debug!(
            variables = lp_vars.len(),
            constraints = model.constraints().len(),
            "handing model to CBC"
        );

        match problem.solve() {
            Ok(solution) => {
                let values = read_values(&solution, &lp_vars);
                let status = match solution.status() {
                    SolutionStatus::Optimal => EngineStatus::Optimal,
                    _ => EngineStatus::Feasible,
                };
                let objective = model
                    .objective()
                    .map_or(0.0, |objective| objective.expr.evaluate(&values) as f64);
                EngineReport {
                    status,
                    values,
                    objective: Some(objective),
                    detail: None,
                }
            }
            Err(ResolutionError::Infeasible) => EngineReport::empty(EngineStatus::Infeasible),
            Err(ResolutionError::Unbounded) => EngineReport::empty(EngineStatus::ModelInvalid)
                .with_detail("objective is unbounded"),
            Err(other) => EngineReport::empty(EngineStatus::Unknown).with_detail(other.to_string()),
        }
    }
}

/// Create one binary LP column per model variable, in model order
fn init_variables(model: &Model) -> (ProblemVariables, Vec<Variable>) {
    let mut problem_vars = variables!();
    let lp_vars = model
        .vars()
        .map(|var| problem_vars.add(variable().binary().name(model.var_name(var))))
        .collect();
    (problem_vars, lp_vars)
}

fn to_expression(expr: &LinearExpr, lp_vars: &[Variable]) -> Expression {
    expr.terms()
        .iter()
        .fold(Expression::from(0.0), |sum, &(var, coefficient)| {
            sum + lp_vars[var.index()] * coefficient as f64
        })
}

fn create_objective_function(model: &Model, lp_vars: &[Variable]) -> Expression {
    model
        .objective()
        .map_or(Expression::from(0.0), |objective| to_expression(&objective.expr, lp_vars))
}

/// Create a CBC problem with the given objective function and time budget
fn create_model(
    variables: ProblemVariables,
    objective: Expression,
    model: &Model,
    time_limit: Duration,
) -> CoinCbcProblem {
    let unsolved = match model.objective().map(|objective| objective.sense) {
        Some(Sense::Maximise) => variables.maximise(objective),
        Some(Sense::Minimise) | None => variables.minimise(objective),
    };
    let mut problem = unsolved.using(coin_cbc);
    problem.set_parameter("seconds", &seconds_parameter(time_limit));
    #[cfg(not(debug_assertions))]
    problem.set_parameter("loglevel", "0");
    problem
}

/// CBC `seconds` value, at full precision so sub-millisecond budgets survive
fn seconds_parameter(time_limit: Duration) -> String {
    time_limit.as_secs_f64().to_string()
}

/// Add every model constraint, linearising the conditional ones
fn constrain_model<LpModel: SolverModel>(
    problem: LpModel,
    constraints: &[LinearConstraint],
    lp_vars: &[Variable],
) -> LpModel {
    constraints
        .iter()
        .flat_map(|constraint| linearise(constraint, lp_vars))
        .fold(problem, |m, constraint| m.with(constraint))
}

fn linearise(constraint: &LinearConstraint, lp_vars: &[Variable]) -> Vec<Constraint> {
    let rhs = constraint.rhs as f64;
    let Some(literal) = constraint.enforce_if else {
        let lhs = to_expression(&constraint.expr, lp_vars);
        return vec![match constraint.comparison {
            Comparison::Eq => lhs.eq(rhs),
            Comparison::Leq => lhs.leq(rhs),
            Comparison::Geq => lhs.geq(rhs),
        }];
    };

    // lhs >= rhs - M * (1 - literal) and lhs <= rhs + M * (1 - literal)
    let (low, high) = constraint.expr.bounds();
    let lower = || {
        let big_m = (constraint.rhs - low).max(0) as f64;
        (to_expression(&constraint.expr, lp_vars) + relaxation(literal, big_m, lp_vars)).geq(rhs)
    };
    let upper = || {
        let big_m = (high - constraint.rhs).max(0) as f64;
        (to_expression(&constraint.expr, lp_vars) - relaxation(literal, big_m, lp_vars)).leq(rhs)
    };
    match constraint.comparison {
        Comparison::Geq => vec![lower()],
        Comparison::Leq => vec![upper()],
        Comparison::Eq => vec![lower(), upper()],
    }
}

/// `big_m * (1 - literal)` as an affine expression
fn relaxation(literal: Literal, big_m: f64, lp_vars: &[Variable]) -> Expression {
    let var = lp_vars[literal.var.index()];
    if literal.negated {
        Expression::from(0.0) + var * big_m
    } else {
        Expression::from(big_m) + var * -big_m
    }
}

fn read_values(solution: &impl LpSolution, lp_vars: &[Variable]) -> Vec<bool> {
    lp_vars.iter().map(|&var| solution.value(var) > 0.5).collect()
}
