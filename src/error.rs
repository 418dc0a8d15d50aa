use thiserror::Error;

/// Rejections raised while validating an instance, before any variable exists.
#[derive(Debug, Error, PartialEq)]
pub enum InstanceError {
    #[error("Item {item} has {found} property levels, expected {expected}")]
    RaggedItemRow {
        item: usize,
        found: usize,
        expected: usize,
    },
    #[error("Item {item} has level {level} for property {property} (levels are 0..=3)")]
    LevelOutOfRange {
        item: usize,
        property: usize,
        level: u8,
    },
    #[error("Group {group} has {found} requirement flags, expected {expected}")]
    RequirementShape {
        group: usize,
        found: usize,
        expected: usize,
    },
    #[error("Group {group} has flag {flag} for property {property} (flags are 0 or 1)")]
    RequirementNotBinary {
        group: usize,
        property: usize,
        flag: u8,
    },
    #[error("Minimum size vector has {found} entries but there are {expected} groups")]
    MinSizeShape { found: usize, expected: usize },
    #[error("Cost matrix has {found} rows but there are {expected} groups")]
    CostRows { found: usize, expected: usize },
    #[error("Group {group} has {found} cost coefficients, expected {expected}")]
    CostShape {
        group: usize,
        found: usize,
        expected: usize,
    },
    #[error("Group {group} has negative cost {cost} for property {property}")]
    NegativeCost {
        group: usize,
        property: usize,
        cost: i64,
    },
    #[error("Group {group} has cost {cost} for property {property} (at most 2^53)")]
    CostTooLarge {
        group: usize,
        property: usize,
        cost: i64,
    },
    #[error("Time limit must be a positive number of seconds (found {0})")]
    InvalidTimeLimit(f64),
}

#[derive(Debug, Error)]
pub enum SolveError {
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error("Engine rejected the model: {0}")]
    ModelInvalid(String),
    #[error("Engine reported a solution with {found} values for {expected} variables")]
    IncompleteSolution { expected: usize, found: usize },
}
