use std::collections::BTreeMap;

use lpcase_solver::{ConstraintOp, LpProblem, Solution, SolutionStatus, SolveError, Solver};
use thiserror::Error;
use tracing::debug;

use crate::expr::{LinearExpr, Relation};
use crate::model::{Domain, Model, ModelError, Sense};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Model '{0}' has no objective")]
    MissingObjective(String),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

/// How a model variable is represented by non-negative solver columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarColumns {
    /// `x = col`
    Single(usize),
    /// `x = -col`
    Negated(usize),
    /// `x = pos - neg`
    Split { pos: usize, neg: usize },
}

/// Where a solver row came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOrigin {
    Constraint(String),
    LowerBound(String),
    UpperBound(String),
}

/// A model lowered to an [`LpProblem`] over non-negative columns
#[derive(Debug, Clone)]
pub struct CompiledModel {
    pub name: String,
    pub sense: Sense,
    pub objective_constant: f64,
    /// Model variable names, in declaration order
    pub variables: Vec<String>,
    /// Columns per model variable, parallel to `variables`
    pub columns: Vec<VarColumns>,
    /// Origin per solver row
    pub rows: Vec<RowOrigin>,
    pub lp_problem: LpProblem,
}

/// A solver result expressed in terms of the model's names
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSolution {
    pub status: SolutionStatus,
    /// Objective value, including any constant term; `None` unless optimal
    pub objective: Option<f64>,
    pub values: BTreeMap<String, f64>,
    /// Dual per active model constraint (suffix `dual`)
    pub duals: BTreeMap<String, f64>,
    /// Reduced cost per variable (suffix `rc`)
    pub reduced_costs: BTreeMap<String, f64>,
    pub iterations: usize,
}

impl ModelSolution {
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn dual(&self, name: &str) -> Option<f64> {
        self.duals.get(name).copied()
    }

    pub fn reduced_cost(&self, name: &str) -> Option<f64> {
        self.reduced_costs.get(name).copied()
    }

    /// Copy variable values onto `model`; variables without a value are reset to `None`.
    pub fn load_into(&self, model: &mut Model) -> Result<(), ModelError> {
        let ids: Vec<_> = model.var_ids().collect();
        for id in ids {
            let value = model.var_by_id(id).and_then(|v| self.value(&v.name));
            model.set_value(id, value)?;
        }
        Ok(())
    }
}

/// Lower `model` to a solver problem.
pub fn compile(model: &Model) -> Result<CompiledModel, CompileError> {
    let objective = model
        .objective()
        .ok_or_else(|| CompileError::MissingObjective(model.name.clone()))?;

    let mut column_names = Vec::new();
    let mut columns = Vec::with_capacity(model.vars().len());
    for var in model.vars() {
        let mapping = match var.domain {
            Domain::NonNegativeReals => {
                column_names.push(var.name.clone());
                VarColumns::Single(column_names.len() - 1)
            }
            Domain::NonPositiveReals => {
                column_names.push(format!("{}(-)", var.name));
                VarColumns::Negated(column_names.len() - 1)
            }
            Domain::Reals => {
                column_names.push(format!("{}(+)", var.name));
                column_names.push(format!("{}(-)", var.name));
                let neg = column_names.len() - 1;
                VarColumns::Split { pos: neg - 1, neg }
            }
        };
        columns.push(mapping);
    }

    let n_cols = column_names.len();
    let lower = |expr: &LinearExpr| -> Vec<f64> {
        let mut row = vec![0.0; n_cols];
        for &(var, coef) in &expr.terms {
            match columns[var.index()] {
                VarColumns::Single(c) => row[c] += coef,
                VarColumns::Negated(c) => row[c] -= coef,
                VarColumns::Split { pos, neg } => {
                    row[pos] += coef;
                    row[neg] -= coef;
                }
            }
        }
        row
    };

    let mut lp = LpProblem::new(column_names.clone());
    lp.set_objective(lower(&objective.expr), objective.sense == Sense::Minimize);

    let mut rows = Vec::new();
    for c in model.constraints().iter().filter(|c| c.active) {
        let op = match c.relation {
            Relation::Le => ConstraintOp::Le,
            Relation::Ge => ConstraintOp::Ge,
            Relation::Eq => ConstraintOp::Eq,
        };
        lp.add_constraint(c.name.clone(), lower(&c.body), op, c.rhs - c.body.constant);
        rows.push(RowOrigin::Constraint(c.name.clone()));
    }

    // Bounds tighter than the domain become explicit rows
    for (id, var) in model.var_ids().zip(model.vars()) {
        let (dom_lo, dom_hi) = var.domain.bounds();
        let (lo, hi) = var.bounds();
        let single = lower(&LinearExpr::from(id));
        if lo.is_finite() && lo > dom_lo {
            lp.add_constraint(format!("{}_lb", var.name), single.clone(), ConstraintOp::Ge, lo);
            rows.push(RowOrigin::LowerBound(var.name.clone()));
        }
        if hi.is_finite() && hi < dom_hi {
            lp.add_constraint(format!("{}_ub", var.name), single, ConstraintOp::Le, hi);
            rows.push(RowOrigin::UpperBound(var.name.clone()));
        }
    }

    debug!(
        model = %model.name,
        columns = lp.num_variables(),
        rows = lp.num_constraints(),
        "lowered model"
    );

    Ok(CompiledModel {
        name: model.name.clone(),
        sense: objective.sense,
        objective_constant: objective.expr.constant,
        variables: model.vars().iter().map(|v| v.name.clone()).collect(),
        columns,
        rows,
        lp_problem: lp,
    })
}

/// Lower and solve `model`, reporting the result by model names.
pub fn solve(model: &Model, solver: &Solver) -> Result<ModelSolution, CompileError> {
    let compiled = compile(model)?;
    let solution = solver.solve(&compiled.lp_problem)?;
    Ok(compiled.interpret(&solution))
}

impl CompiledModel {
    /// Map a solver solution back onto model variables and constraints.
    pub fn interpret(&self, solution: &Solution) -> ModelSolution {
        let mut out = ModelSolution {
            status: solution.status,
            objective: None,
            values: BTreeMap::new(),
            duals: BTreeMap::new(),
            reduced_costs: BTreeMap::new(),
            iterations: solution.iterations,
        };
        if !solution.is_optimal() {
            return out;
        }

        out.objective = Some(solution.objective_value + self.objective_constant);

        let rc = |col: usize| solution.reduced_costs.get(col).map_or(0.0, |r| r.reduced_cost);
        for (name, mapping) in self.variables.iter().zip(&self.columns) {
            let (value, reduced) = match *mapping {
                VarColumns::Single(c) => (solution.values[c], rc(c)),
                VarColumns::Negated(c) => (-solution.values[c], -rc(c)),
                VarColumns::Split { pos, neg } => (solution.values[pos] - solution.values[neg], rc(pos)),
            };
            out.values.insert(name.clone(), value + 0.0);
            out.reduced_costs.insert(name.clone(), reduced);
        }

        for (origin, dual) in self.rows.iter().zip(&solution.duals) {
            match origin {
                RowOrigin::Constraint(name) => {
                    out.duals.insert(name.clone(), dual.value);
                }
                // A bound's dual is part of its variable's reduced cost
                RowOrigin::LowerBound(var) | RowOrigin::UpperBound(var) => {
                    if let Some(r) = out.reduced_costs.get_mut(var) {
                        *r += dual.value;
                    }
                }
            }
        }

        out
    }
}
