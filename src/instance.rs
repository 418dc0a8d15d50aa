use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::InstanceError;

/// Number of quality grades an item can hold for a property (0..=3).
pub const NUM_LEVELS: usize = 4;

/// Largest accepted waiver cost; keeps costs exact as `f64` coefficients.
pub const MAX_COST: i64 = 1 << 53;

/// Minimum level an assigned item needs to satisfy a requirement without waiver.
pub const SATISFACTION_LEVEL: usize = 2;

/// Immutable description of items, groups and their properties.
///
/// Construction validates every shape eagerly so the encoding never sees a
/// malformed matrix. Once built, an instance is read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    item_levels: Vec<Vec<u8>>,
    requirements: Vec<Vec<u8>>,
    min_sizes: Vec<u32>,
    costs: Vec<Vec<i64>>,
    num_properties: usize,
}

impl Instance {
    /// Builds an instance whose waiver costs equal the requirement flags.
    pub fn new(
        item_levels: Vec<Vec<u8>>,
        requirements: Vec<Vec<u8>>,
        min_sizes: Vec<u32>,
    ) -> Result<Self, InstanceError> {
        let num_properties = item_levels
            .first()
            .or(requirements.first())
            .map_or(0, Vec::len);

        for (item, row) in item_levels.iter().enumerate() {
            if row.len() != num_properties {
                return Err(InstanceError::RaggedItemRow {
                    item,
                    found: row.len(),
                    expected: num_properties,
                });
            }
            if let Some((property, &level)) = row
                .iter()
                .enumerate()
                .find(|&(_, &level)| level as usize >= NUM_LEVELS)
            {
                return Err(InstanceError::LevelOutOfRange {
                    item,
                    property,
                    level,
                });
            }
        }

        for (group, row) in requirements.iter().enumerate() {
            if row.len() != num_properties {
                return Err(InstanceError::RequirementShape {
                    group,
                    found: row.len(),
                    expected: num_properties,
                });
            }
            if let Some((property, &flag)) = row.iter().enumerate().find(|&(_, &flag)| flag > 1) {
                return Err(InstanceError::RequirementNotBinary {
                    group,
                    property,
                    flag,
                });
            }
        }

        if min_sizes.len() != requirements.len() {
            return Err(InstanceError::MinSizeShape {
                found: min_sizes.len(),
                expected: requirements.len(),
            });
        }

        let costs = requirements
            .iter()
            .map(|row| row.iter().map(|&flag| i64::from(flag)).collect())
            .collect();

        Ok(Instance {
            item_levels,
            requirements,
            min_sizes,
            costs,
            num_properties,
        })
    }

    /// Replaces the default unit waiver costs with an explicit cost matrix.
    ///
    /// Costs for properties a group does not require are accepted but can
    /// never contribute, since such waivers are forced to zero.
    pub fn with_costs(mut self, costs: Vec<Vec<i64>>) -> Result<Self, InstanceError> {
        if costs.len() != self.num_groups() {
            return Err(InstanceError::CostRows {
                found: costs.len(),
                expected: self.num_groups(),
            });
        }
        for (group, row) in costs.iter().enumerate() {
            if row.len() != self.num_properties {
                return Err(InstanceError::CostShape {
                    group,
                    found: row.len(),
                    expected: self.num_properties,
                });
            }
            if let Some((property, &cost)) = row.iter().enumerate().find(|&(_, &cost)| cost < 0) {
                return Err(InstanceError::NegativeCost {
                    group,
                    property,
                    cost,
                });
            }
            if let Some((property, &cost)) =
                row.iter().enumerate().find(|&(_, &cost)| cost > MAX_COST)
            {
                return Err(InstanceError::CostTooLarge {
                    group,
                    property,
                    cost,
                });
            }
        }
        self.costs = costs;
        Ok(self)
    }

    pub fn num_items(&self) -> usize {
        self.item_levels.len()
    }

    pub fn num_groups(&self) -> usize {
        self.requirements.len()
    }

    pub fn num_properties(&self) -> usize {
        self.num_properties
    }

    pub fn level(&self, item: usize, property: usize) -> u8 {
        self.item_levels[item][property]
    }

    pub fn requires(&self, group: usize, property: usize) -> bool {
        self.requirements[group][property] == 1
    }

    /// Whether any group requires any property at all.
    pub fn has_requirements(&self) -> bool {
        self.requirements.iter().flatten().any(|&flag| flag == 1)
    }

    pub fn min_size(&self, group: usize) -> u32 {
        self.min_sizes[group]
    }

    pub fn cost(&self, group: usize, property: usize) -> i64 {
        self.costs[group][property]
    }
}

/// Solve parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Wall-clock budget handed to the engine.
    pub time_limit_seconds: f64,
    /// Reserved. Accepted and carried, but no constraint, objective or engine
    /// parameter reads it.
    pub iterations: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            time_limit_seconds: 60.0,
            iterations: 100,
        }
    }
}

impl Config {
    pub fn with_time_limit(time_limit_seconds: f64) -> Self {
        Config {
            time_limit_seconds,
            ..Config::default()
        }
    }

    pub fn validate(&self) -> Result<(), InstanceError> {
        self.time_limit().map(|_| ())
    }

    /// The time budget as a [`Duration`]; rejects budgets that are not
    /// positive or do not fit in a `Duration`.
    pub fn time_limit(&self) -> Result<Duration, InstanceError> {
        let invalid = InstanceError::InvalidTimeLimit(self.time_limit_seconds);
        if self.time_limit_seconds.is_nan() || self.time_limit_seconds <= 0.0 {
            return Err(invalid);
        }
        Duration::try_from_secs_f64(self.time_limit_seconds).map_err(|_| invalid)
    }
}

/// `has_level(l, i, k)` is true iff item `i` holds property `k` at level `l` or better.
#[derive(Debug, Clone)]
pub struct LevelTensor {
    num_items: usize,
    num_properties: usize,
    cells: Vec<bool>,
}

impl LevelTensor {
    pub fn new(instance: &Instance) -> Self {
        let num_items = instance.num_items();
        let num_properties = instance.num_properties();
        let cells = (0..NUM_LEVELS)
            .flat_map(|level| {
                (0..num_items).flat_map(move |item| {
                    (0..num_properties)
                        .map(move |property| instance.level(item, property) as usize >= level)
                })
            })
            .collect();

        LevelTensor {
            num_items,
            num_properties,
            cells,
        }
    }

    pub fn has_level(&self, level: usize, item: usize, property: usize) -> bool {
        assert!(level < NUM_LEVELS, "level {level} out of range");
        self.cells[(level * self.num_items + item) * self.num_properties + property]
    }
}
