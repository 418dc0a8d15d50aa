//! Boundary to the search engine.
//!
//! An engine receives a finished [`Model`] and a wall-clock budget, searches
//! once, and reports a status plus, when it found one, a value for every
//! variable. The encoding never depends on which engine is plugged in.

use std::fmt;
use std::time::Duration;

use crate::model::Model;

/// Status reported by an engine after a single search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Proven optimal assignment.
    Optimal,
    /// An assignment was found but optimality was not proven in time.
    Feasible,
    /// No assignment satisfies the constraints.
    Infeasible,
    /// The search stopped without a conclusion.
    Unknown,
    /// The engine could not accept the model.
    ModelInvalid,
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineStatus::Optimal => "OPTIMAL",
            EngineStatus::Feasible => "FEASIBLE",
            EngineStatus::Infeasible => "INFEASIBLE",
            EngineStatus::Unknown => "UNKNOWN",
            EngineStatus::ModelInvalid => "MODEL_INVALID",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineReport {
    pub status: EngineStatus,
    /// One value per model variable, indexed by [`crate::model::BoolVar::index`].
    /// Empty unless the status is `Optimal` or `Feasible`.
    pub values: Vec<bool>,
    /// Achieved objective value, when a solution was found.
    pub objective: Option<f64>,
    /// Engine-specific explanation, if any.
    pub detail: Option<String>,
}

impl EngineReport {
    /// A report that carries no solution.
    pub fn empty(status: EngineStatus) -> Self {
        EngineReport {
            status,
            values: Vec::new(),
            objective: None,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, EngineStatus::Optimal | EngineStatus::Feasible)
    }
}

/// A constraint/integer-optimisation backend.
///
/// Implementations must not keep state between calls: each call searches
/// the given model from scratch and stops once `time_limit` has elapsed.
pub trait Engine {
    fn solve(&self, model: &Model, time_limit: Duration) -> EngineReport;
}
