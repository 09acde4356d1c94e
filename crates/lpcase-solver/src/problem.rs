use crate::SolveError;

/// A linear program over non-negative columns
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Column names
    pub variables: Vec<String>,
    /// Objective coefficients and sense
    pub objective: Objective,
    /// Rows
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each column
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Row name, used to report duals and binding rows
    pub name: String,
    /// Coefficients for each column
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl ConstraintOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Check dimensions and that every number is finite.
    pub fn validate(&self) -> Result<(), SolveError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(SolveError::DimensionMismatch {
                row: "objective".to_string(),
                expected: n,
                found: self.objective.coefficients.len(),
            });
        }
        if let Some(j) = self.objective.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(SolveError::NonFinite {
                row: "objective".to_string(),
                column: self.variables[j].clone(),
            });
        }
        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolveError::DimensionMismatch {
                    row: c.name.clone(),
                    expected: n,
                    found: c.coefficients.len(),
                });
            }
            if let Some(j) = c.coefficients.iter().position(|v| !v.is_finite()) {
                return Err(SolveError::NonFinite {
                    row: c.name.clone(),
                    column: self.variables[j].clone(),
                });
            }
            if !c.rhs.is_finite() {
                return Err(SolveError::NonFinite {
                    row: c.name.clone(),
                    column: "rhs".to_string(),
                });
            }
        }
        Ok(())
    }
}
