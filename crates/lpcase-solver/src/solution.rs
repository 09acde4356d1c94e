/// The result of solving an LP problem
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Termination status
    pub status: SolutionStatus,
    /// Value of each column (empty unless optimal)
    pub values: Vec<f64>,
    /// Objective value
    pub objective_value: f64,
    /// Dual value per row, d(objective)/d(rhs)
    pub duals: Vec<RowDual>,
    /// Reduced cost per column, d(objective)/d(column)
    pub reduced_costs: Vec<ReducedCost>,
    /// Rows satisfied with equality at the optimum
    pub binding_constraints: Vec<String>,
    /// Pivots performed across both phases
    pub iterations: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The pivot limit was reached before optimality was proven
    IterationLimit,
}

impl SolutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolutionStatus::Optimal => "optimal",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::IterationLimit => "maxIterations",
        }
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct RowDual {
    /// Row name
    pub constraint: String,
    /// Dual value
    pub value: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ReducedCost {
    /// Column name
    pub variable: String,
    /// Current value in solution
    pub value: f64,
    /// Reduced cost
    pub reduced_cost: f64,
    /// Is this column in the basis?
    pub is_basic: bool,
}

impl Solution {
    fn without_point(status: SolutionStatus, objective_value: f64, iterations: usize) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value,
            duals: Vec::new(),
            reduced_costs: Vec::new(),
            binding_constraints: Vec::new(),
            iterations,
        }
    }

    pub fn infeasible(iterations: usize) -> Self {
        Self::without_point(SolutionStatus::Infeasible, f64::NAN, iterations)
    }

    /// Unbounded in the direction of optimization: `-inf` for minimization, `+inf` for maximization.
    pub fn unbounded(minimize: bool, iterations: usize) -> Self {
        let objective_value = if minimize { f64::NEG_INFINITY } else { f64::INFINITY };
        Self::without_point(SolutionStatus::Unbounded, objective_value, iterations)
    }

    pub fn iteration_limit(iterations: usize) -> Self {
        Self::without_point(SolutionStatus::IterationLimit, f64::NAN, iterations)
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn dual(&self, constraint: &str) -> Option<f64> {
        self.duals.iter().find(|d| d.constraint == constraint).map(|d| d.value)
    }

    pub fn reduced_cost(&self, variable: &str) -> Option<f64> {
        self.reduced_costs
            .iter()
            .find(|rc| rc.variable == variable)
            .map(|rc| rc.reduced_cost)
    }
}
