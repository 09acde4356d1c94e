use crate::expr::{ConstraintExpr, LinearExpr, Relation, VarId};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Component '{0}' is already declared on the model")]
    DuplicateName(String),
    #[error("Expression references variable #{0}, which is not declared on this model")]
    UnknownVariable(usize),
    #[error("Unknown component: {0}")]
    UnknownComponent(String),
    #[error("Model already has objective '{0}'")]
    ObjectiveAlreadySet(String),
    #[error("Invalid bounds on {name}: lower {lb} is greater than upper {ub}")]
    InvalidBounds { name: String, lb: f64, ub: f64 },
    #[error("Non-finite number in {0}")]
    NonFinite(String),
}

/// Set a variable ranges over
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Domain {
    #[default]
    NonNegativeReals,
    NonPositiveReals,
    Reals,
}

impl Domain {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Domain::NonNegativeReals => (0.0, f64::INFINITY),
            Domain::NonPositiveReals => (f64::NEG_INFINITY, 0.0),
            Domain::Reals => (f64::NEG_INFINITY, f64::INFINITY),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Domain::NonNegativeReals => "NonNegativeReals",
            Domain::NonPositiveReals => "NonPositiveReals",
            Domain::Reals => "Reals",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub name: String,
    pub domain: Domain,
    /// Extra lower bound, intersected with the domain
    pub lb: Option<f64>,
    /// Extra upper bound, intersected with the domain
    pub ub: Option<f64>,
    pub value: Option<f64>,
}

impl Var {
    /// Effective `(lower, upper)` after intersecting the domain with the explicit bounds
    pub fn bounds(&self) -> (f64, f64) {
        let (lo, hi) = self.domain.bounds();
        let lo = self.lb.map_or(lo, |lb| lb.max(lo));
        let hi = self.ub.map_or(hi, |ub| ub.min(hi));
        (lo, hi)
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

impl Sense {
    pub fn name(self) -> &'static str {
        match self {
            Sense::Minimize => "minimize",
            Sense::Maximize => "maximize",
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    pub name: String,
    pub expr: LinearExpr,
    pub sense: Sense,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    /// Normalized body without a constant term
    pub body: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
    pub active: bool,
}

/// A concrete linear model: named variables, at most one objective, named constraints
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Model {
    pub name: String,
    vars: Vec<Var>,
    objective: Option<Objective>,
    constraints: Vec<Constraint>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn name_taken(&self, name: &str) -> bool {
        self.vars.iter().any(|v| v.name == name)
            || self.constraints.iter().any(|c| c.name == name)
            || self.objective.as_ref().is_some_and(|o| o.name == name)
    }

    fn claim(&self, name: &str) -> Result<(), ModelError> {
        if self.name_taken(name) {
            return Err(ModelError::DuplicateName(name.to_string()));
        }
        Ok(())
    }

    fn check_expr(&self, expr: &LinearExpr, owner: &str) -> Result<(), ModelError> {
        for &(var, coef) in &expr.terms {
            if var.0 >= self.vars.len() {
                return Err(ModelError::UnknownVariable(var.0));
            }
            if !coef.is_finite() {
                return Err(ModelError::NonFinite(owner.to_string()));
            }
        }
        if !expr.constant.is_finite() {
            return Err(ModelError::NonFinite(owner.to_string()));
        }
        Ok(())
    }

    pub fn add_var(&mut self, name: impl Into<String>, domain: Domain) -> Result<VarId, ModelError> {
        self.add_var_bounded(name, domain, None, None)
    }

    pub fn add_var_bounded(
        &mut self,
        name: impl Into<String>,
        domain: Domain,
        lb: Option<f64>,
        ub: Option<f64>,
    ) -> Result<VarId, ModelError> {
        let name = name.into();
        self.claim(&name)?;
        if lb.is_some_and(f64::is_nan) || ub.is_some_and(f64::is_nan) {
            return Err(ModelError::NonFinite(name));
        }
        let var = Var {
            name,
            domain,
            lb,
            ub,
            value: None,
        };
        let (lo, hi) = var.bounds();
        if lo > hi {
            return Err(ModelError::InvalidBounds {
                name: var.name,
                lb: lo,
                ub: hi,
            });
        }
        self.vars.push(var);
        Ok(VarId(self.vars.len() - 1))
    }

    pub fn set_objective(&mut self, name: impl Into<String>, expr: LinearExpr, sense: Sense) -> Result<(), ModelError> {
        let name = name.into();
        if let Some(existing) = &self.objective {
            return Err(ModelError::ObjectiveAlreadySet(existing.name.clone()));
        }
        self.claim(&name)?;
        self.check_expr(&expr, &name)?;
        self.objective = Some(Objective {
            name,
            expr: expr.normalized(),
            sense,
        });
        Ok(())
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, constraint: ConstraintExpr) -> Result<(), ModelError> {
        let name = name.into();
        self.claim(&name)?;
        self.check_expr(&constraint.body, &name)?;
        if !constraint.rhs.is_finite() {
            return Err(ModelError::NonFinite(name));
        }
        let body = constraint.body.normalized();
        let rhs = constraint.rhs - body.constant;
        self.constraints.push(Constraint {
            name,
            body: LinearExpr {
                terms: body.terms,
                constant: 0.0,
            },
            relation: constraint.relation,
            rhs,
            active: true,
        });
        Ok(())
    }

    pub fn deactivate(&mut self, name: &str) -> Result<(), ModelError> {
        self.set_active(name, false)
    }

    pub fn activate(&mut self, name: &str) -> Result<(), ModelError> {
        self.set_active(name, true)
    }

    fn set_active(&mut self, name: &str, active: bool) -> Result<(), ModelError> {
        let c = self
            .constraints
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| ModelError::UnknownComponent(name.to_string()))?;
        c.active = active;
        Ok(())
    }

    /// Tighten the explicit bounds of an existing variable; `None` leaves a side untouched.
    pub fn set_bounds(&mut self, id: VarId, lb: Option<f64>, ub: Option<f64>) -> Result<(), ModelError> {
        let var = self.vars.get(id.0).ok_or(ModelError::UnknownVariable(id.0))?;
        if lb.is_some_and(f64::is_nan) || ub.is_some_and(f64::is_nan) {
            return Err(ModelError::NonFinite(var.name.clone()));
        }
        let mut updated = var.clone();
        if lb.is_some() {
            updated.lb = lb;
        }
        if ub.is_some() {
            updated.ub = ub;
        }
        self.replace_var(id, updated)
    }

    /// Move a variable to another domain; explicit bounds are kept and must
    /// still leave a non-empty range.
    pub fn set_domain(&mut self, id: VarId, domain: Domain) -> Result<(), ModelError> {
        let var = self.vars.get(id.0).ok_or(ModelError::UnknownVariable(id.0))?;
        let updated = Var {
            domain,
            ..var.clone()
        };
        self.replace_var(id, updated)
    }

    fn replace_var(&mut self, id: VarId, updated: Var) -> Result<(), ModelError> {
        let (lo, hi) = updated.bounds();
        if lo > hi {
            return Err(ModelError::InvalidBounds {
                name: updated.name,
                lb: lo,
                ub: hi,
            });
        }
        self.vars[id.0] = updated;
        Ok(())
    }

    pub fn var(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    pub fn var_by_id(&self, id: VarId) -> Option<&Var> {
        self.vars.get(id.0)
    }

    pub fn vars(&self) -> &[Var] {
        &self.vars
    }

    pub fn var_ids(&self) -> impl Iterator<Item = VarId> + '_ {
        (0..self.vars.len()).map(VarId)
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn set_value(&mut self, id: VarId, value: Option<f64>) -> Result<(), ModelError> {
        let var = self.vars.get_mut(id.0).ok_or(ModelError::UnknownVariable(id.0))?;
        var.value = value;
        Ok(())
    }

    pub fn value(&self, id: VarId) -> Option<f64> {
        self.vars.get(id.0).and_then(|v| v.value)
    }

    /// Value of `expr` at the current variable values; `None` while any term's variable is unset
    pub fn evaluate(&self, expr: &LinearExpr) -> Option<f64> {
        let mut total = expr.constant;
        for &(var, coef) in &expr.terms {
            total += coef * self.value(var)?;
        }
        Some(total)
    }

    /// Render `expr` with variable names, e.g. `3 x + 2 y - z`
    pub fn format_expr(&self, expr: &LinearExpr) -> String {
        let mut out = String::new();
        for (i, &(var, coef)) in expr.terms.iter().enumerate() {
            let name = self
                .var_by_id(var)
                .map_or_else(|| format!("#{}", var.0), |v| v.name.clone());
            let magnitude = coef.abs();
            let sign = if coef < 0.0 { "-" } else { "+" };
            if i == 0 {
                if coef < 0.0 {
                    out.push('-');
                }
            } else {
                out.push(' ');
                out.push_str(sign);
                out.push(' ');
            }
            if magnitude != 1.0 {
                out.push_str(&format!("{} ", magnitude));
            }
            out.push_str(&name);
        }
        if expr.constant != 0.0 || expr.terms.is_empty() {
            if expr.terms.is_empty() {
                out.push_str(&format!("{}", expr.constant));
            } else if expr.constant < 0.0 {
                out.push_str(&format!(" - {}", -expr.constant));
            } else {
                out.push_str(&format!(" + {}", expr.constant));
            }
        }
        out
    }
}

fn format_bound(value: f64) -> String {
    if value == f64::INFINITY {
        "+inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{}", value)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model {}", self.name)?;
        writeln!(f, "  {} Var Declarations", self.vars.len())?;
        for v in &self.vars {
            let (lo, hi) = v.bounds();
            let value = v.value.map_or_else(|| "None".to_string(), |x| format!("{}", x));
            writeln!(
                f,
                "    {} : {} [{}, {}] value={}",
                v.name,
                v.domain,
                format_bound(lo),
                format_bound(hi),
                value
            )?;
        }
        let n_obj = usize::from(self.objective.is_some());
        writeln!(f, "  {} Objective Declarations", n_obj)?;
        if let Some(obj) = &self.objective {
            writeln!(f, "    {} : {} {}", obj.name, obj.sense.name(), self.format_expr(&obj.expr))?;
        }
        writeln!(f, "  {} Constraint Declarations", self.constraints.len())?;
        for c in &self.constraints {
            let status = if c.active { "" } else { " (inactive)" };
            writeln!(
                f,
                "    {} : {} {} {}{}",
                c.name,
                self.format_expr(&c.body),
                c.relation.symbol(),
                c.rhs,
                status
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wikipedia() -> (Model, VarId, VarId, VarId) {
        let mut model = Model::new("wiki");
        let x = model.add_var("x", Domain::NonNegativeReals).unwrap();
        let y = model.add_var("y", Domain::NonNegativeReals).unwrap();
        let z = model.add_var("z", Domain::NonNegativeReals).unwrap();
        model
            .set_objective("Z", -2.0 * x - 3.0 * y - 4.0 * z, Sense::Minimize)
            .unwrap();
        model.add_constraint("c1", (3.0 * x + 2.0 * y + z).le(10.0)).unwrap();
        model.add_constraint("c2", (2.0 * x + 5.0 * y + 3.0 * z).le(15.0)).unwrap();
        (model, x, y, z)
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let (mut model, ..) = wikipedia();
        assert_eq!(
            model.add_var("x", Domain::NonNegativeReals),
            Err(ModelError::DuplicateName("x".to_string()))
        );
        let x = model.var("x").unwrap();
        assert_eq!(
            model.add_constraint("Z", x.le(1.0)),
            Err(ModelError::DuplicateName("Z".to_string()))
        );
        assert_eq!(model.vars().len(), 3);
    }

    #[test]
    fn test_second_objective_is_rejected() {
        let (mut model, x, ..) = wikipedia();
        let err = model.set_objective("Z2", x.into(), Sense::Maximize).unwrap_err();
        assert_eq!(err, ModelError::ObjectiveAlreadySet("Z".to_string()));
    }

    #[test]
    fn test_foreign_variable_is_rejected() {
        let (mut model, ..) = wikipedia();
        let other = VarId(42);
        assert_eq!(
            model.add_constraint("bad", other.le(1.0)),
            Err(ModelError::UnknownVariable(42))
        );
    }

    #[test]
    fn test_constant_moves_to_rhs() {
        let mut model = Model::new("m");
        let x = model.add_var("x", Domain::Reals).unwrap();
        model.add_constraint("c", (2.0 * x + 3.0).ge(7.0)).unwrap();
        let c = model.constraint("c").unwrap();
        assert_eq!(c.rhs, 4.0);
        assert_eq!(c.body.constant, 0.0);
        assert_eq!(c.body.terms, vec![(x, 2.0)]);
    }

    #[test]
    fn test_bounds_intersect_domain() {
        let mut model = Model::new("m");
        let x = model
            .add_var_bounded("x", Domain::NonNegativeReals, Some(-5.0), Some(3.0))
            .unwrap();
        assert_eq!(model.var_by_id(x).unwrap().bounds(), (0.0, 3.0));
        let err = model
            .add_var_bounded("w", Domain::NonPositiveReals, Some(1.0), None)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidBounds { .. }));
    }

    #[test]
    fn test_evaluate_and_format() {
        let (mut model, x, y, z) = wikipedia();
        let obj = model.objective().unwrap().expr.clone();
        assert_eq!(model.evaluate(&obj), None);
        model.set_value(x, Some(0.0)).unwrap();
        model.set_value(y, Some(0.0)).unwrap();
        model.set_value(z, Some(5.0)).unwrap();
        assert_eq!(model.evaluate(&obj), Some(-20.0));
        assert_eq!(model.format_expr(&obj), "-2 x - 3 y - 4 z");
        let c1 = model.constraint("c1").unwrap().body.clone();
        assert_eq!(model.format_expr(&c1), "3 x + 2 y + z");
    }

    #[test]
    fn test_deactivate_unknown_constraint() {
        let (mut model, ..) = wikipedia();
        model.deactivate("c2").unwrap();
        assert!(!model.constraint("c2").unwrap().active);
        assert!(model.deactivate("nope").is_err());
    }

    #[test]
    fn test_display_lists_components() {
        let (model, ..) = wikipedia();
        let text = model.to_string();
        assert!(text.contains("3 Var Declarations"));
        assert!(text.contains("x : NonNegativeReals [0, +inf] value=None"));
        assert!(text.contains("Z : minimize -2 x - 3 y - 4 z"));
        assert!(text.contains("c2 : 2 x + 5 y + 3 z <= 15"));
    }

    #[test]
    fn test_set_bounds_checks_range() {
        let mut model = Model::new("m");
        let x = model.add_var("x", Domain::NonNegativeReals).unwrap();
        model.set_bounds(x, Some(1.0), Some(4.0)).unwrap();
        model.set_bounds(x, None, Some(3.0)).unwrap();
        assert_eq!(model.var_by_id(x).unwrap().bounds(), (1.0, 3.0));

        assert_eq!(
            model.set_bounds(x, Some(5.0), None),
            Err(ModelError::InvalidBounds {
                name: "x".to_string(),
                lb: 5.0,
                ub: 3.0
            })
        );
        assert_eq!(
            model.set_bounds(x, Some(f64::NAN), None),
            Err(ModelError::NonFinite("x".to_string()))
        );
        assert_eq!(model.var_by_id(x).unwrap().bounds(), (1.0, 3.0));
        assert_eq!(model.set_bounds(VarId(9), None, None), Err(ModelError::UnknownVariable(9)));
    }

    #[test]
    fn test_set_domain_keeps_range_non_empty() {
        let mut model = Model::new("m");
        let x = model
            .add_var_bounded("x", Domain::NonNegativeReals, Some(1.0), None)
            .unwrap();
        assert_eq!(
            model.set_domain(x, Domain::NonPositiveReals),
            Err(ModelError::InvalidBounds {
                name: "x".to_string(),
                lb: 1.0,
                ub: 0.0
            })
        );
        let var = model.var_by_id(x).unwrap();
        assert_eq!(var.domain, Domain::NonNegativeReals);
        assert_eq!(var.bounds(), (1.0, f64::INFINITY));

        model.set_domain(x, Domain::Reals).unwrap();
        assert_eq!(model.var_by_id(x).unwrap().bounds(), (1.0, f64::INFINITY));
    }
}
