use serde::{Deserialize, Serialize};

use crate::error::{InstanceError, SolveError};
use crate::instance::{Config, Instance};
use crate::solve::{Outcome, SolveStatus, solve};

/// A problem document, as read from YAML.
#[derive(Debug, Serialize, Deserialize)]
pub struct Problem {
    /// One row of property levels (0..=3) per item.
    pub items: Vec<Vec<u8>>,
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub config: Config,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupSpec {
    /// One 0/1 flag per property.
    pub requires: Vec<u8>,
    #[serde(rename = "minSize", default)]
    pub min_size: u32,
    /// Waiver cost per property; defaults to the requirement flags.
    pub costs: Option<Vec<i64>>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub status: SolveStatus,
    pub objective: Option<i64>,
    /// Group index per item. Empty unless the status is optimal.
    #[serde(default)]
    pub assignment: Vec<usize>,
    #[serde(default)]
    pub waived: Vec<Waiver>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct Waiver {
    pub group: usize,
    pub property: usize,
}

impl Problem {
    pub fn instance(&self) -> Result<Instance, InstanceError> {
        let requirements = self.groups.iter().map(|g| g.requires.clone()).collect();
        let min_sizes = self.groups.iter().map(|g| g.min_size).collect();
        let instance = Instance::new(self.items.clone(), requirements, min_sizes)?;

        if self.groups.iter().all(|g| g.costs.is_none()) {
            return Ok(instance);
        }
        let costs = self
            .groups
            .iter()
            .map(|g| match &g.costs {
                Some(costs) => costs.clone(),
                None => g.requires.iter().map(|&flag| i64::from(flag)).collect(),
            })
            .collect();
        instance.with_costs(costs)
    }

    pub fn solve(&self) -> Result<Solution, SolveError> {
        let instance = self.instance()?;
        let outcome = solve(&instance, &self.config)?;
        Ok(Solution::from(&outcome))
    }
}

impl From<&Outcome> for Solution {
    fn from(outcome: &Outcome) -> Self {
        Solution {
            status: outcome.status,
            objective: outcome.objective,
            assignment: outcome.assignment().unwrap_or_default(),
            waived: outcome
                .waived()
                .into_iter()
                .map(|(group, property)| Waiver { group, property })
                .collect(),
        }
    }
}
