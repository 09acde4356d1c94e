use std::ops::{Add, Mul, Neg, Sub};

/// Handle to a variable declared on a [`crate::Model`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// `sum(coef * var) + constant`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Le => "<=",
            Relation::Ge => ">=",
            Relation::Eq => "=",
        }
    }
}

/// A relation between an expression and a constant, not yet attached to a model
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintExpr {
    pub body: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    /// Sum of coefficients on `var`
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms.iter().filter(|(v, _)| *v == var).map(|(_, c)| c).sum()
    }

    /// Merge repeated variables, keep first-appearance order, drop zero terms.
    pub fn normalized(&self) -> LinearExpr {
        let mut terms: Vec<(VarId, f64)> = Vec::with_capacity(self.terms.len());
        for &(var, coef) in &self.terms {
            match terms.iter_mut().find(|(v, _)| *v == var) {
                Some(existing) => existing.1 += coef,
                None => terms.push((var, coef)),
            }
        }
        terms.retain(|(_, c)| *c != 0.0);
        LinearExpr {
            terms,
            constant: self.constant,
        }
    }

    pub fn le(self, rhs: f64) -> ConstraintExpr {
        ConstraintExpr {
            body: self,
            relation: Relation::Le,
            rhs,
        }
    }

    pub fn ge(self, rhs: f64) -> ConstraintExpr {
        ConstraintExpr {
            body: self,
            relation: Relation::Ge,
            rhs,
        }
    }

    pub fn equals(self, rhs: f64) -> ConstraintExpr {
        ConstraintExpr {
            body: self,
            relation: Relation::Eq,
            rhs,
        }
    }

    fn scaled(mut self, factor: f64) -> LinearExpr {
        for (_, c) in &mut self.terms {
            *c *= factor;
        }
        self.constant *= factor;
        self
    }
}

impl VarId {
    pub fn le(self, rhs: f64) -> ConstraintExpr {
        LinearExpr::from(self).le(rhs)
    }

    pub fn ge(self, rhs: f64) -> ConstraintExpr {
        LinearExpr::from(self).ge(rhs)
    }

    pub fn equals(self, rhs: f64) -> ConstraintExpr {
        LinearExpr::from(self).equals(rhs)
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        LinearExpr::term(var, 1.0)
    }
}

impl From<f64> for LinearExpr {
    fn from(value: f64) -> Self {
        LinearExpr::constant(value)
    }
}

impl<T: Into<LinearExpr>> Add<T> for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: T) -> LinearExpr {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl<T: Into<LinearExpr>> Sub<T> for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        self + rhs.into().scaled(-1.0)
    }
}

impl<T: Into<LinearExpr>> Add<T> for VarId {
    type Output = LinearExpr;

    fn add(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) + rhs
    }
}

impl<T: Into<LinearExpr>> Sub<T> for VarId {
    type Output = LinearExpr;

    fn sub(self, rhs: T) -> LinearExpr {
        LinearExpr::from(self) - rhs
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(self, rhs: f64) -> LinearExpr {
        self.scaled(rhs)
    }
}

impl Mul<LinearExpr> for f64 {
    type Output = LinearExpr;

    fn mul(self, rhs: LinearExpr) -> LinearExpr {
        rhs.scaled(self)
    }
}

impl Mul<f64> for VarId {
    type Output = LinearExpr;

    fn mul(self, rhs: f64) -> LinearExpr {
        LinearExpr::term(self, rhs)
    }
}

impl Mul<VarId> for f64 {
    type Output = LinearExpr;

    fn mul(self, rhs: VarId) -> LinearExpr {
        LinearExpr::term(rhs, self)
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        self.scaled(-1.0)
    }
}

impl Neg for VarId {
    type Output = LinearExpr;

    fn neg(self) -> LinearExpr {
        LinearExpr::term(self, -1.0)
    }
}
