use std::fmt;
use std::str::FromStr;

use lpcase_lang::{Model, ModelSolution, Parser, solve, write_lp};
use lpcase_solver::{PivotRule, Solver};
use serde::Deserialize;
use tracing::debug;

use crate::error::SuiteError;
use crate::problems::Capability;

/// How a model reaches the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Io {
    /// Lowered in memory
    Direct,
    /// Written as CPLEX LP text and parsed back first
    Lp,
}

impl Io {
    pub fn as_str(self) -> &'static str {
        match self {
            Io::Direct => "direct",
            Io::Lp => "lp",
        }
    }
}

impl fmt::Display for Io {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Io {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Io::Direct),
            "lp" => Ok(Io::Lp),
            other => Err(format!("unknown io '{}', expected 'direct' or 'lp'", other)),
        }
    }
}

/// Four-part solver version, compared lexicographically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Version(pub [u32; 4]);

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self([major, minor, patch, build])
    }
}

impl FromStr for Version {
    type Err = SuiteError;

    /// Missing trailing parts are zero: `"1.2"` is `1.2.0.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SuiteError::InvalidVersion(s.to_string());
        let mut parts = [0u32; 4];
        let mut count = 0;
        for piece in s.trim().split('.') {
            if count == 4 {
                return Err(invalid());
            }
            parts[count] = piece.parse().map_err(|_| invalid())?;
            count += 1;
        }
        Ok(Version(parts))
    }
}

impl TryFrom<String> for Version {
    type Error = SuiteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

/// A solver under test together with the way models are handed to it
#[derive(Debug, Clone, PartialEq)]
pub struct SolverCase {
    pub name: &'static str,
    pub io: Io,
    pub version: Version,
    pub capabilities: &'static [Capability],
    pub available: bool,
    pub pivot_rule: PivotRule,
}

const ALL_CAPABILITIES: &[Capability] = &[
    Capability::Linear,
    Capability::FreeVariables,
    Capability::VariableBounds,
];

/// Solver cases registered with the harness
pub fn builtin_solvers() -> Vec<SolverCase> {
    let version = Version::new(0, 1, 0, 0);
    vec![
        SolverCase {
            name: "simplex",
            io: Io::Direct,
            version,
            capabilities: ALL_CAPABILITIES,
            available: true,
            pivot_rule: PivotRule::Dantzig,
        },
        SolverCase {
            name: "simplex",
            io: Io::Lp,
            version,
            capabilities: ALL_CAPABILITIES,
            available: true,
            pivot_rule: PivotRule::Dantzig,
        },
        SolverCase {
            name: "simplex_bland",
            io: Io::Direct,
            version,
            capabilities: ALL_CAPABILITIES,
            available: true,
            pivot_rule: PivotRule::Bland,
        },
    ]
}

impl SolverCase {
    /// `simplex/direct`
    pub fn label(&self) -> String {
        format!("{}/{}", self.name, self.io)
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// `base` with this case's pivot rule applied
    pub fn configure(&self, base: &Solver) -> Solver {
        base.clone().with_pivot_rule(self.pivot_rule)
    }

    pub fn solve(&self, model: &Model, base: &Solver) -> Result<ModelSolution, SuiteError> {
        let solver = self.configure(base);
        debug!(solver = %self.label(), model = %model.name, "solving");
        match self.io {
            Io::Direct => Ok(solve(model, &solver)?),
            Io::Lp => {
                let text = write_lp(model)?;
                let parsed = Parser::parse(&text)?;
                Ok(solve(&parsed, &solver)?)
            }
        }
    }
}

/// Parse `solver/io` into its parts.
pub fn parse_label(label: &str) -> Result<(String, Io), SuiteError> {
    let (name, io) = label
        .split_once('/')
        .ok_or_else(|| SuiteError::UnknownSolverCase(label.to_string()))?;
    let io = io.parse().map_err(|_| SuiteError::UnknownSolverCase(label.to_string()))?;
    Ok((name.to_string(), io))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problems::problem;

    #[test]
    fn test_version_parsing() {
        assert_eq!("1.2".parse::<Version>().unwrap(), Version::new(1, 2, 0, 0));
        assert_eq!("12.6.3.1".parse::<Version>().unwrap(), Version::new(12, 6, 3, 1));
        assert!("1.2.3.4.5".parse::<Version>().is_err());
        assert!("1.x".parse::<Version>().is_err());
        assert!(Version::new(1, 10, 0, 0) > Version::new(1, 9, 9, 9));
        assert_eq!(Version::new(4, 0, 1, 0).to_string(), "4.0.1.0");
    }

    #[test]
    fn test_labels() {
        let labels: Vec<_> = builtin_solvers().iter().map(SolverCase::label).collect();
        assert_eq!(labels, vec!["simplex/direct", "simplex/lp", "simplex_bland/direct"]);
        assert_eq!(
            parse_label("simplex/lp").unwrap(),
            ("simplex".to_string(), Io::Lp)
        );
        assert!(parse_label("simplex").is_err());
        assert!(parse_label("simplex/nl").is_err());
    }

    #[test]
    fn test_every_io_solves_basic_problem() {
        let model = problem("LP_basic").unwrap().build_model().unwrap();
        for case in builtin_solvers() {
            let solution = case.solve(&model, &Solver::new()).unwrap();
            assert!((solution.objective.unwrap() + 20.0).abs() < 1e-9, "{}", case.label());
            assert!((solution.dual("c2").unwrap() + 4.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_configure_keeps_base_options() {
        let base = Solver::new().with_tolerance(1e-7);
        let bland = &builtin_solvers()[2];
        let solver = bland.configure(&base);
        assert_eq!(solver.pivot_rule(), PivotRule::Bland);
        assert_eq!(solver.tolerance(), 1e-7);
    }
}
