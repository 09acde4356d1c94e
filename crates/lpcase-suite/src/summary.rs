use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::runner::{Outcome, ScenarioResult};

/// Outcome counts for one solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub pass: usize,
    pub fail: usize,
    pub ok_fail: usize,
    pub bad_pass: usize,
}

impl Tally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Pass => self.pass += 1,
            Outcome::UnexpectedFailure => self.fail += 1,
            Outcome::ExpectedFailure => self.ok_fail += 1,
            Outcome::UnexpectedSuccess => self.bad_pass += 1,
        }
    }

    fn add(&mut self, other: &Tally) {
        self.pass += other.pass;
        self.fail += other.fail;
        self.ok_fail += other.ok_fail;
        self.bad_pass += other.bad_pass;
    }

    pub fn total(&self) -> usize {
        self.pass + self.fail + self.ok_fail + self.bad_pass
    }

    /// Share of results matching expectations, truncated to a whole percent.
    /// An empty tally counts as fully OK.
    pub fn percent_ok(&self) -> usize {
        match self.total() {
            0 => 100,
            total => 100 * (self.pass + self.ok_fail) / total,
        }
    }
}

/// Per-solver outcome counts of a test run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub solvers: BTreeMap<String, Tally>,
    /// Unexpected results in run order, as `(problem, solver, io, outcome)`
    pub unexpected: Vec<(String, String, String, Outcome)>,
}

impl Summary {
    pub fn from_results(results: &[ScenarioResult]) -> Self {
        let mut summary = Summary::default();
        for r in results {
            summary.solvers.entry(r.solver.clone()).or_default().record(r.outcome);
            if !r.outcome.is_ok() {
                summary
                    .unexpected
                    .push((r.problem.clone(), r.solver.clone(), r.io.to_string(), r.outcome));
            }
        }
        summary
    }

    pub fn totals(&self) -> Tally {
        let mut total = Tally::default();
        for tally in self.solvers.values() {
            total.add(tally);
        }
        total
    }

    pub fn has_unexpected(&self) -> bool {
        !self.unexpected.is_empty()
    }

    /// The verbose failure listing
    pub fn render_failures(&self) -> String {
        let mut out = String::from("---------------\n Test Failures\n---------------\n");
        for (problem, solver, io, outcome) in &self.unexpected {
            let label = match outcome {
                Outcome::UnexpectedSuccess => "Unexpected Test Success",
                _ => "Unexpected Test Failure",
            };
            out.push_str(&format!("- {}: {}, {}, {}\n", label, problem, solver, io));
        }
        if self.unexpected.is_empty() {
            out.push_str("- NONE\n");
        }
        out.push('\n');
        out
    }

    /// Fixed-width summary table
    pub fn render(&self) -> String {
        let width = self
            .solvers
            .keys()
            .map(|name| name.len())
            .chain(std::iter::once("Solver".len()))
            .max()
            .unwrap_or(0);
        let rule = "=".repeat(width + 66);

        let mut out = String::new();
        let row = |out: &mut String, name: &str, cells: [String; 5]| {
            let [pass, fail, ok_fail, bad_pass, ok] = cells;
            // Writing to a String cannot fail
            let _ = writeln!(
                out,
                "{:<w$}| {:>8} | {:>8} | {:>10} | {:>10} | {:>13}",
                name,
                pass,
                fail,
                ok_fail,
                bad_pass,
                ok,
                w = width + 2
            );
        };
        let cells = |t: &Tally| {
            [
                t.pass.to_string(),
                t.fail.to_string(),
                t.ok_fail.to_string(),
                t.bad_pass.to_string(),
                t.percent_ok().to_string(),
            ]
        };

        out.push_str("\nSolver Test Summary\n");
        out.push_str(&rule);
        out.push('\n');
        row(
            &mut out,
            "Solver",
            ["# Pass", "# Fail", "# OK Fail", "# Bad Pass", "% OK"].map(String::from),
        );
        out.push_str(&rule);
        out.push('\n');
        for (name, tally) in &self.solvers {
            row(&mut out, name, cells(tally));
        }
        out.push_str(&rule);
        out.push('\n');
        row(&mut out, "TOTALS", cells(&self.totals()));
        out.push_str(&rule);
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solvers::Io;

    fn result(problem: &str, solver: &str, io: Io, outcome: Outcome) -> ScenarioResult {
        ScenarioResult {
            problem: problem.to_string(),
            solver: solver.to_string(),
            io,
            outcome,
            detail: String::new(),
        }
    }

    fn sample() -> Summary {
        Summary::from_results(&[
            result("LP_basic", "simplex", Io::Direct, Outcome::Pass),
            result("LP_basic", "simplex", Io::Lp, Outcome::UnexpectedFailure),
            result("LP_basic", "simplex_bland", Io::Direct, Outcome::ExpectedFailure),
            result("LP_unbounded", "simplex", Io::Direct, Outcome::Pass),
            result("LP_unbounded", "simplex_bland", Io::Direct, Outcome::UnexpectedSuccess),
        ])
    }

    #[test]
    fn test_tally() {
        let summary = sample();
        let simplex = summary.solvers["simplex"];
        assert_eq!((simplex.pass, simplex.fail, simplex.ok_fail, simplex.bad_pass), (2, 1, 0, 0));
        assert_eq!(simplex.percent_ok(), 66);
        let bland = summary.solvers["simplex_bland"];
        assert_eq!(bland.percent_ok(), 50);
        assert_eq!(summary.totals().total(), 5);
        assert_eq!(summary.totals().percent_ok(), 60);
        assert_eq!(Tally::default().percent_ok(), 100);
        assert!(summary.has_unexpected());
    }

    #[test]
    fn test_render_table() {
        let table = sample().render();
        let rule = "=".repeat(13 + 66);
        let expected = format!(
            "\nSolver Test Summary\n{rule}\n\
Solver         |   # Pass |   # Fail |  # OK Fail | # Bad Pass |          % OK\n{rule}\n\
simplex        |        2 |        1 |          0 |          0 |            66\n\
simplex_bland  |        0 |        0 |          1 |          1 |            50\n{rule}\n\
TOTALS         |        2 |        1 |          1 |          1 |            60\n{rule}\n"
        );
        assert_eq!(table, expected);
    }

    #[test]
    fn test_render_failures() {
        let listing = sample().render_failures();
        assert_eq!(
            listing,
            "---------------\n Test Failures\n---------------\n\
- Unexpected Test Failure: LP_basic, simplex, lp\n\
- Unexpected Test Success: LP_unbounded, simplex_bland, direct\n\n"
        );
        assert!(Summary::default().render_failures().contains("- NONE\n"));
    }
}
