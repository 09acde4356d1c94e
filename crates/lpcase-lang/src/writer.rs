use std::collections::HashSet;
use std::fmt::Write as _;

use thiserror::Error;

use crate::lexer::{is_ident_continue, is_ident_start};
use crate::model::Model;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WriteError {
    #[error("'{0}' is not a valid LP identifier")]
    InvalidName(String),
    #[error("Model '{0}' has no objective")]
    MissingObjective(String),
}

const RESERVED: &[&str] = &[
    "min", "minimize", "minimise", "minimum", "max", "maximize", "maximise", "maximum", "st", "s.t.", "st.",
    "subject", "such", "bounds", "bound", "end", "free", "inf", "infinity", "general", "generals", "gen",
    "binary", "binaries", "bin", "semi", "semis", "sos",
];

fn check_name(name: &str) -> Result<(), WriteError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(is_ident_start)
        && chars.all(is_ident_continue)
        && !RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name));
    if valid {
        Ok(())
    } else {
        Err(WriteError::InvalidName(name.to_string()))
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

/// Write `model` as CPLEX LP text. Inactive constraints are left out.
pub fn write_lp(model: &Model) -> Result<String, WriteError> {
    let objective = model
        .objective()
        .ok_or_else(|| WriteError::MissingObjective(model.name.clone()))?;

    for var in model.vars() {
        check_name(&var.name)?;
    }
    check_name(&objective.name)?;

    let mut out = String::new();
    let mut referenced = HashSet::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "\\ Model {}", model.name);
    let _ = writeln!(out, "{}", objective.sense.name());
    let _ = writeln!(out, " {}: {}", objective.name, model.format_expr(&objective.expr));
    referenced.extend(objective.expr.terms.iter().map(|(v, _)| *v));

    let active: Vec<_> = model.constraints().iter().filter(|c| c.active).collect();
    if !active.is_empty() {
        let _ = writeln!(out, "subject to");
        for c in active {
            check_name(&c.name)?;
            let _ = writeln!(
                out,
                " {}: {} {} {}",
                c.name,
                model.format_expr(&c.body),
                c.relation.symbol(),
                c.rhs
            );
            referenced.extend(c.body.terms.iter().map(|(v, _)| *v));
        }
    }

    // Default bounds are [0, +inf); unreferenced variables are listed so they survive a round trip
    let mut bounds = String::new();
    for (id, var) in model.var_ids().zip(model.vars()) {
        match var.bounds() {
            (lo, hi) if lo == f64::NEG_INFINITY && hi == f64::INFINITY => {
                let _ = writeln!(bounds, " {} free", var.name);
            }
            (lo, hi) if lo == 0.0 && hi == f64::INFINITY && referenced.contains(&id) => {}
            (lo, hi) => {
                let _ = writeln!(bounds, " {} <= {} <= {}", format_bound(lo), var.name, format_bound(hi));
            }
        }
    }
    if !bounds.is_empty() {
        let _ = writeln!(out, "bounds");
        out.push_str(&bounds);
    }

    let _ = writeln!(out, "end");
    Ok(out)
}
