//! Engine-neutral model arena.
//!
//! Variables are plain indices into the model, created in a fixed order, so
//! the same instance always yields the same variable numbering. Constraints
//! carry integer coefficients and may be guarded by an enforcement literal.

/// Handle to a boolean decision variable owned by a [`Model`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(usize);

impl BoolVar {
    pub fn index(self) -> usize {
        self.0
    }

    pub fn is_true(self) -> Literal {
        Literal {
            var: self,
            negated: false,
        }
    }

    pub fn is_false(self) -> Literal {
        Literal {
            var: self,
            negated: true,
        }
    }
}

/// A boolean variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Literal {
    pub var: BoolVar,
    pub negated: bool,
}

impl Literal {
    pub fn holds(&self, values: &[bool]) -> bool {
        values[self.var.index()] != self.negated
    }
}

/// Sum of `coefficient * variable` terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    terms: Vec<(BoolVar, i64)>,
}

impl LinearExpr {
    pub fn terms(&self) -> &[(BoolVar, i64)] {
        &self.terms
    }

    pub fn evaluate(&self, values: &[bool]) -> i64 {
        self.terms
            .iter()
            .filter(|(var, _)| values[var.index()])
            .fold(0i64, |sum, &(_, coefficient)| sum.saturating_add(coefficient))
    }

    /// Smallest and largest values the expression can take over booleans.
    pub fn bounds(&self) -> (i64, i64) {
        self.terms
            .iter()
            .fold((0, 0), |(low, high), &(_, coefficient)| {
                (
                    low.saturating_add(coefficient.min(0)),
                    high.saturating_add(coefficient.max(0)),
                )
            })
    }
}

impl FromIterator<BoolVar> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = BoolVar>>(iter: I) -> Self {
        LinearExpr {
            terms: iter.into_iter().map(|var| (var, 1)).collect(),
        }
    }
}

impl FromIterator<(BoolVar, i64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (BoolVar, i64)>>(iter: I) -> Self {
        LinearExpr {
            terms: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Leq,
    Geq,
}

/// `expr <cmp> rhs`, optionally only enforced while `enforce_if` holds.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub comparison: Comparison,
    pub rhs: i64,
    pub enforce_if: Option<Literal>,
}

impl LinearConstraint {
    pub fn only_enforce_if(&mut self, literal: Literal) -> &mut Self {
        self.enforce_if = Some(literal);
        self
    }

    /// Whether `values` satisfies this constraint (vacuously so when not enforced).
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        if let Some(literal) = self.enforce_if {
            if !literal.holds(values) {
                return true;
            }
        }
        let lhs = self.expr.evaluate(values);
        match self.comparison {
            Comparison::Eq => lhs == self.rhs,
            Comparison::Leq => lhs <= self.rhs,
            Comparison::Geq => lhs >= self.rhs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Minimise,
    Maximise,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub sense: Sense,
    pub expr: LinearExpr,
}

#[derive(Debug, Clone, Default)]
pub struct Model {
    names: Vec<String>,
    constraints: Vec<LinearConstraint>,
    objective: Option<Objective>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.names.push(name.into());
        BoolVar(self.names.len() - 1)
    }

    pub fn add_linear(
        &mut self,
        expr: LinearExpr,
        comparison: Comparison,
        rhs: i64,
    ) -> &mut LinearConstraint {
        self.constraints.push(LinearConstraint {
            expr,
            comparison,
            rhs,
            enforce_if: None,
        });
        let last = self.constraints.len() - 1;
        &mut self.constraints[last]
    }

    pub fn minimise(&mut self, expr: LinearExpr) {
        self.objective = Some(Objective {
            sense: Sense::Minimise,
            expr,
        });
    }

    pub fn maximise(&mut self, expr: LinearExpr) {
        self.objective = Some(Objective {
            sense: Sense::Maximise,
            expr,
        });
    }

    pub fn num_vars(&self) -> usize {
        self.names.len()
    }

    /// All variables in creation order.
    pub fn vars(&self) -> impl Iterator<Item = BoolVar> + use<> {
        (0..self.names.len()).map(BoolVar)
    }

    pub fn var_name(&self, var: BoolVar) -> &str {
        &self.names[var.index()]
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    /// Whether a full assignment satisfies every constraint of the model.
    pub fn is_satisfied_by(&self, values: &[bool]) -> bool {
        values.len() == self.num_vars()
            && self.constraints.iter().all(|c| c.is_satisfied_by(values))
    }
}

/// Row-major block of variables addressed by `(row, col)`.
///
/// Placement variables are items × groups, waiver variables are
/// groups × properties; iteration order is the extraction order.
#[derive(Debug, Clone)]
pub struct VarGrid {
    rows: usize,
    cols: usize,
    vars: Vec<BoolVar>,
}

impl VarGrid {
    /// Creates `rows * cols` variables named `{prefix}[row,col]`.
    pub fn new(model: &mut Model, prefix: &str, rows: usize, cols: usize) -> Self {
        let vars = (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .map(|(row, col)| model.new_bool_var(format!("{prefix}[{row},{col}]")))
            .collect();
        VarGrid { rows, cols, vars }
    }

    pub fn get(&self, row: usize, col: usize) -> BoolVar {
        assert!(row < self.rows && col < self.cols, "({row},{col}) outside grid");
        self.vars[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> impl Iterator<Item = BoolVar> + '_ {
        self.vars[row * self.cols..(row + 1) * self.cols].iter().copied()
    }

    pub fn col(&self, col: usize) -> impl Iterator<Item = BoolVar> + '_ {
        (0..self.rows).map(move |row| self.get(row, col))
    }

    pub fn iter(&self) -> impl Iterator<Item = BoolVar> + '_ {
        self.vars.iter().copied()
    }

    /// Reads the grid's values out of a full assignment, row-major.
    pub fn values(&self, values: &[bool]) -> Vec<bool> {
        self.iter().map(|var| values[var.index()]).collect()
    }
}
