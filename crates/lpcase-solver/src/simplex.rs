use crate::SolveError;
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{ReducedCost, RowDual, Solution, SolutionStatus};
use tracing::{debug, warn};

/// Entering-column selection
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotRule {
    /// Most positive reduced cost
    #[default]
    Dantzig,
    /// Lowest eligible index; never cycles
    Bland,
}

/// Simplex solver for linear programming problems
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots across both phases
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    pivot_rule: PivotRule,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
            pivot_rule: PivotRule::Dantzig,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_pivot_rule(mut self, rule: PivotRule) -> Self {
        self.pivot_rule = rule;
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn pivot_rule(&self) -> PivotRule {
        self.pivot_rule
    }

    /// Solve the LP problem using the two-phase simplex method
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(SolveError::InvalidTolerance(self.tolerance));
        }
        problem.validate()?;

        let mut tableau = self.build_tableau(problem);
        let mut iterations = 0;

        // Phase 1: find an initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau, &mut iterations) {
                SimplexResult::Optimal => {}
                SimplexResult::Infeasible => {
                    debug!(iterations, "phase 1 ended with positive artificials");
                    return Ok(Solution::infeasible(iterations));
                }
                SimplexResult::IterationLimit => {
                    warn!(iterations, "iteration limit reached in phase 1");
                    return Ok(Solution::iteration_limit(iterations));
                }
                // Phase 1 is bounded below by zero
                SimplexResult::Unbounded => return Ok(Solution::infeasible(iterations)),
            }
            debug!(iterations, "phase 1 found a feasible basis");
        }

        // Phase 2: optimize
        match self.phase2(&mut tableau, &mut iterations) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => {
                debug!(iterations, "phase 2 found an unbounded ray");
                return Ok(Solution::unbounded(problem.objective.minimize, iterations));
            }
            SimplexResult::IterationLimit => {
                warn!(iterations, "iteration limit reached in phase 2");
                return Ok(Solution::iteration_limit(iterations));
            }
            SimplexResult::Infeasible => return Ok(Solution::infeasible(iterations)),
        }
        debug!(iterations, "phase 2 reached optimality");

        Ok(self.extract_solution(&tableau, problem, iterations))
    }

    fn build_tableau(&self, problem: &LpProblem) -> Tableau {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Rows with a negative rhs are negated, which swaps <= and >=
        let rows: Vec<(bool, ConstraintOp)> = problem
            .constraints
            .iter()
            .map(|c| {
                let flip = c.rhs < 0.0;
                let op = match (c.op, flip) {
                    (ConstraintOp::Le, true) => ConstraintOp::Ge,
                    (ConstraintOp::Ge, true) => ConstraintOp::Le,
                    (op, _) => op,
                };
                (flip, op)
            })
            .collect();

        let n_slack = rows.iter().filter(|(_, op)| *op != ConstraintOp::Eq).count();
        let n_artificial = rows.iter().filter(|(_, op)| *op != ConstraintOp::Le).count();

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let total_rows = n_constraints + 1; // +1 for objective

        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; total_rows],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
            rows: Vec::with_capacity(n_constraints),
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (c, &(flip, op))) in problem.constraints.iter().zip(&rows).enumerate() {
            let sign = if flip { -1.0 } else { 1.0 };
            for (j, &coef) in c.coefficients.iter().enumerate() {
                tableau.data[i][j] = sign * coef;
            }
            tableau.data[i][total_cols - 1] = sign * c.rhs;

            let dual_col = match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                    (slack_idx - 1, 1.0)
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                    (slack_idx - 1, -1.0)
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                    (artificial_idx - 1, 1.0)
                }
            };
            tableau.rows.push(RowInfo {
                flipped: flip,
                dual_col: dual_col.0,
                dual_coef: dual_col.1,
            });
        }

        // The tableau always maximizes; a positive entry in the objective row
        // marks a column that can still improve the objective
        let obj_row = n_constraints;
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            tableau.data[obj_row][j] = if problem.objective.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[n_constraints].clone();

        // Maximize -sum(artificials)
        for j in 0..n_cols {
            tableau.data[n_constraints][j] = 0.0;
        }
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        match self.iterate(tableau, n_cols - 1, iterations) {
            SimplexResult::Optimal => {}
            other => return other,
        }

        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > self.tolerance {
                return SimplexResult::Infeasible;
            }
        }

        self.drive_out_artificials(tableau);

        // Restore the real objective and price out the basis
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    /// Pivot zero-valued artificials out of the basis where a real column allows it.
    /// Rows with no such column are redundant and keep their artificial at zero.
    fn drive_out_artificials(&self, tableau: &mut Tableau) {
        let art_start = tableau.art_start();
        for i in 0..tableau.basic_vars.len() {
            if tableau.basic_vars[i] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                self.pivot(tableau, i, col);
            }
        }
    }

    fn phase2(&self, tableau: &mut Tableau, iterations: &mut usize) -> SimplexResult {
        // Artificial columns never re-enter
        let allowed = tableau.art_start();
        self.iterate(tableau, allowed, iterations)
    }

    fn iterate(&self, tableau: &mut Tableau, allowed_cols: usize, iterations: &mut usize) -> SimplexResult {
        loop {
            let Some(pivot_col) = self.find_pivot_column(tableau, allowed_cols) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            if *iterations >= self.max_iterations {
                return SimplexResult::IterationLimit;
            }
            self.pivot(tableau, pivot_row, pivot_col);
            *iterations += 1;
        }
    }

    fn find_pivot_column(&self, tableau: &Tableau, allowed_cols: usize) -> Option<usize> {
        let obj = &tableau.data[tableau.data.len() - 1];
        match self.pivot_rule {
            PivotRule::Bland => (0..allowed_cols).find(|&j| obj[j] > self.tolerance),
            PivotRule::Dantzig => {
                let mut max_val = self.tolerance;
                let mut max_col = None;
                for (j, &value) in obj.iter().enumerate().take(allowed_cols) {
                    if value > max_val {
                        max_val = value;
                        max_col = Some(j);
                    }
                }
                max_col
            }
        }
    }

    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row: Option<usize> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            let better = match min_row {
                None => true,
                Some(r) if (ratio - min_ratio).abs() <= self.tolerance => {
                    self.pivot_rule == PivotRule::Bland && tableau.basic_vars[i] < tableau.basic_vars[r]
                }
                Some(_) => ratio < min_ratio,
            };
            if better {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();
        let n_cols = tableau.data[0].len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for j in 0..n_cols {
            tableau.data[row][j] /= pivot_val;
        }

        for i in 0..n_rows {
            if i != row {
                let factor = tableau.data[i][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n_cols {
                    tableau.data[i][j] -= factor * tableau.data[row][j];
                }
            }
        }
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem, iterations: usize) -> Solution {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();
        let rhs_col = tableau.data[0].len() - 1;
        let obj = &tableau.data[n_constraints];

        let mut values = vec![0.0; n_vars];
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            if basic < n_vars {
                let v = tableau.data[i][rhs_col];
                values[basic] = if v.abs() <= self.tolerance { 0.0 } else { v };
            }
        }

        let objective_value = problem
            .objective
            .coefficients
            .iter()
            .zip(&values)
            .map(|(c, x)| c * x)
            .sum();

        // Objective-row entries are reduced costs of the maximized form;
        // flip them back for minimization
        let orient = if problem.objective.minimize { -1.0 } else { 1.0 };

        let duals = problem
            .constraints
            .iter()
            .zip(&tableau.rows)
            .map(|(c, row)| {
                let mut value = -obj[row.dual_col] / row.dual_coef;
                if row.flipped {
                    value = -value;
                }
                RowDual {
                    constraint: c.name.clone(),
                    value: clean(orient * value, self.tolerance),
                }
            })
            .collect();

        let reduced_costs = problem
            .variables
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let is_basic = tableau.basic_vars.contains(&j);
                let rc = if is_basic { 0.0 } else { clean(orient * obj[j], self.tolerance) };
                ReducedCost {
                    variable: name.clone(),
                    value: values[j],
                    reduced_cost: rc,
                    is_basic,
                }
            })
            .collect();

        let binding_constraints = problem
            .constraints
            .iter()
            .filter(|c| {
                let lhs: f64 = c.coefficients.iter().zip(&values).map(|(a, x)| a * x).sum();
                (lhs - c.rhs).abs() <= 1e-7 * (1.0 + c.rhs.abs())
            })
            .map(|c| c.name.clone())
            .collect();

        Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
            duals,
            reduced_costs,
            binding_constraints,
            iterations,
        }
    }
}

fn clean(value: f64, tolerance: f64) -> f64 {
    if value.abs() <= tolerance { 0.0 } else { value }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    rows: Vec<RowInfo>,
}

impl Tableau {
    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

/// Where a row's dual can be read off the final objective row
struct RowInfo {
    flipped: bool,
    dual_col: usize,
    dual_coef: f64,
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::LpProblem;

    fn names(n: &[&str]) -> Vec<String> {
        n.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_simple_maximization() {
        // Maximize: 3x + 2y
        //   x + y <= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=11
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.set_objective(vec![3.0, 2.0], false);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6, "x = {} (expected 3)", solution.values[0]);
        assert!((solution.values[1] - 1.0).abs() < 1e-6, "y = {} (expected 1)", solution.values[1]);
        assert!((solution.objective_value - 11.0).abs() < 1e-6, "obj = {} (expected 11)", solution.objective_value);

        assert!((solution.dual("sum").unwrap() - 2.0).abs() < 1e-6);
        assert!((solution.dual("x_max").unwrap() - 1.0).abs() < 1e-6);
        assert!(solution.dual("y_max").unwrap().abs() < 1e-6);
        assert_eq!(solution.binding_constraints, vec!["sum".to_string(), "x_max".to_string()]);
    }

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.set_objective(vec![2.0, 3.0], true);
        problem.add_constraint("sum", vec![1.0, 1.0], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![1.0, 0.0], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![0.0, 1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 3.0).abs() < 1e-6);
        assert!((solution.values[1] - 1.0).abs() < 1e-6);
        assert!((solution.objective_value - 9.0).abs() < 1e-6);

        // Raising the requirement costs one more unit of y; raising x_max swaps y for x
        assert!((solution.dual("sum").unwrap() - 3.0).abs() < 1e-6);
        assert!((solution.dual("x_max").unwrap() + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_wikipedia_example_duals_and_reduced_costs() {
        // Minimize: -2x - 3y - 4z
        //   3x + 2y + z <= 10
        //   2x + 5y + 3z <= 15
        let mut problem = LpProblem::new(names(&["x", "y", "z"]));
        problem.set_objective(vec![-2.0, -3.0, -4.0], true);
        problem.add_constraint("c1", vec![3.0, 2.0, 1.0], ConstraintOp::Le, 10.0);
        problem.add_constraint("c2", vec![2.0, 5.0, 3.0], ConstraintOp::Le, 15.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(solution.values[0].abs() < 1e-9);
        assert!(solution.values[1].abs() < 1e-9);
        assert!((solution.values[2] - 5.0).abs() < 1e-9);
        assert!((solution.objective_value + 20.0).abs() < 1e-9);
        assert!(solution.dual("c1").unwrap().abs() < 1e-9);
        assert!((solution.dual("c2").unwrap() + 4.0 / 3.0).abs() < 1e-9);
        assert!((solution.reduced_cost("x").unwrap() - 2.0 / 3.0).abs() < 1e-9);
        assert!((solution.reduced_cost("y").unwrap() - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(solution.reduced_cost("z"), Some(0.0));
        assert_eq!(solution.iterations, 1);
    }

    #[test]
    fn test_equality_and_negative_rhs() {
        // Minimize: x + y
        //   x - y = -2    (flipped internally)
        //   -x <= -1      (x >= 1)
        // Optimal: x=1, y=3, obj=4
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.set_objective(vec![1.0, 1.0], true);
        problem.add_constraint("diff", vec![1.0, -1.0], ConstraintOp::Eq, -2.0);
        problem.add_constraint("x_min", vec![-1.0, 0.0], ConstraintOp::Le, -1.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 1.0).abs() < 1e-9, "x = {}", solution.values[0]);
        assert!((solution.values[1] - 3.0).abs() < 1e-9, "y = {}", solution.values[1]);
        assert!((solution.objective_value - 4.0).abs() < 1e-9);
        // diff: rhs -2 -> -1 lowers y by one
        assert!((solution.dual("diff").unwrap() + 1.0).abs() < 1e-9);
        // x_min: rhs -1 -> 0 lets x=0, y=2
        assert!((solution.dual("x_min").unwrap() + 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_infeasible() {
        let mut problem = LpProblem::new(names(&["x"]));
        problem.set_objective(vec![1.0], true);
        problem.add_constraint("lower", vec![1.0], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![1.0], ConstraintOp::Le, 3.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
    }

    #[test]
    fn test_unbounded() {
        // Maximize x + y with only x - y <= 1
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("c", vec![1.0, -1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert_eq!(solution.objective_value, f64::INFINITY);
    }

    #[test]
    fn test_no_constraints() {
        let mut problem = LpProblem::new(names(&["x"]));
        problem.set_objective(vec![1.0], true);
        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![0.0]);
    }

    #[test]
    fn test_iteration_limit_is_reported() {
        let mut problem = LpProblem::new(names(&["x", "y", "z"]));
        problem.set_objective(vec![-2.0, -3.0, -4.0], true);
        problem.add_constraint("c1", vec![3.0, 2.0, 1.0], ConstraintOp::Le, 10.0);
        problem.add_constraint("c2", vec![2.0, 5.0, 3.0], ConstraintOp::Le, 15.0);

        let solution = Solver::new().with_max_iterations(0).solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::IterationLimit);
    }

    #[test]
    fn test_bland_on_degenerate_problem() {
        // Beale's cycling example, written as a minimization
        let mut problem = LpProblem::new(names(&["x4", "x5", "x6", "x7"]));
        problem.set_objective(vec![-0.75, 150.0, -0.02, 6.0], true);
        problem.add_constraint("r1", vec![0.25, -60.0, -0.04, 9.0], ConstraintOp::Le, 0.0);
        problem.add_constraint("r2", vec![0.5, -90.0, -0.02, 3.0], ConstraintOp::Le, 0.0);
        problem.add_constraint("r3", vec![0.0, 0.0, 1.0, 0.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new()
            .with_pivot_rule(PivotRule::Bland)
            .solve(&problem)
            .unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.objective_value + 0.05).abs() < 1e-9, "obj = {}", solution.objective_value);
    }

    #[test]
    fn test_invalid_problem_is_an_error() {
        let mut problem = LpProblem::new(names(&["x"]));
        problem.set_objective(vec![1.0, 2.0], true);
        assert!(Solver::new().solve(&problem).is_err());
    }

    #[test]
    fn test_invalid_tolerance_is_an_error() {
        let mut problem = LpProblem::new(names(&["x", "y", "z"]));
        problem.set_objective(vec![-2.0, -3.0, -4.0], true);
        problem.add_constraint("c1", vec![3.0, 2.0, 1.0], ConstraintOp::Le, 10.0);
        problem.add_constraint("c2", vec![2.0, 5.0, 3.0], ConstraintOp::Le, 15.0);

        for tol in [f64::NAN, f64::INFINITY, -1.0] {
            let result = Solver::new().with_tolerance(tol).solve(&problem);
            assert!(
                matches!(result, Err(SolveError::InvalidTolerance(_))),
                "tolerance {} gave {:?}",
                tol,
                result.map(|s| s.status)
            );
        }

        let solution = Solver::new().with_tolerance(0.0).solve(&problem).unwrap();
        assert!((solution.objective_value + 20.0).abs() < 1e-9);
    }
}
