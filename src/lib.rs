//! Assign items to groups so every group reaches its minimum size and has,
//! for each property it requires, a member holding that property at level 2
//! or better. Requirements that cannot be met are waived at a cost, and the
//! total waiver cost is minimised with an integer program.

pub mod assignment;
pub mod cbc;
pub mod engine;
pub mod error;
pub mod instance;
pub mod logging;
pub mod model;
pub mod solve;
pub mod types;
pub mod waiver;

pub use cbc::CbcEngine;
pub use engine::{Engine, EngineReport, EngineStatus};
pub use error::{InstanceError, SolveError};
pub use instance::{Config, Instance, LevelTensor};
pub use solve::{Encoding, Outcome, SolveStatus, encode, solve, solve_with};
pub use types::{GroupSpec, Problem, Solution, Waiver};
