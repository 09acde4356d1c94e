use std::collections::HashMap;

use crate::expr::{LinearExpr, Relation};
use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::model::{Domain, Model, ModelError, Sense};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },
    #[error("Unexpected end of file")]
    UnexpectedEof,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Unsupported section '{section}' at position {span:?}")]
    UnsupportedSection { section: String, span: Span },
    #[error(transparent)]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    SubjectTo,
    Bounds,
    End,
    Unsupported,
}

/// A row as read, before variables are resolved against a model
#[derive(Debug, Clone)]
struct RawRow {
    name: String,
    terms: Vec<(String, f64)>,
    constant: f64,
    relation: Relation,
    rhs: f64,
}

/// Parser for the CPLEX LP subset written by [`crate::write_lp`]
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Variables in order of first appearance
    var_order: Vec<String>,
    bounds: HashMap<String, (f64, f64)>,
}

const MODEL_HEADER: &str = "\\ Model ";

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Comment))
            .collect();
        Self {
            tokens,
            pos: 0,
            var_order: Vec::new(),
            bounds: HashMap::new(),
        }
    }

    /// Parse LP text. The model is named from a leading `\ Model <name>` comment, if any.
    pub fn parse(source: &str) -> Result<Model, ParseError> {
        let tokens = Lexer::tokenize(source);
        let name = tokens
            .iter()
            .take_while(|t| matches!(t.kind, TokenKind::Comment | TokenKind::Newline))
            .find_map(|t| t.text.strip_prefix(MODEL_HEADER).map(|n| n.trim().to_string()))
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "model".to_string());
        let mut parser = Parser::new(tokens);
        parser.parse_program(name)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn peek_kind_at(&self, offset: usize) -> TokenKind {
        self.tokens.get(self.pos + offset).map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        self.pos += 1;
        token
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current() {
            Some(t) if t.kind != TokenKind::Eof => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: format!("{:?} '{}'", t.kind, t.text),
                span: t.span,
            },
            _ => ParseError::UnexpectedEof,
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.current().cloned();
        match token {
            Some(t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("{:?}", kind))),
        }
    }

    fn word_at(&self, offset: usize, word: &str) -> bool {
        self.tokens.get(self.pos + offset).is_some_and(|t| t.is_word(word))
    }

    /// Section keyword at the cursor and how many tokens it spans
    fn section_at(&self) -> Option<(Section, usize)> {
        let token = self.current()?;
        if token.kind != TokenKind::Ident {
            return None;
        }
        let word = token.text.to_ascii_lowercase();
        match word.as_str() {
            "subject" if self.word_at(1, "to") => Some((Section::SubjectTo, 2)),
            "such" if self.word_at(1, "that") => Some((Section::SubjectTo, 2)),
            "st" | "s.t." | "st." => Some((Section::SubjectTo, 1)),
            "bounds" | "bound" => Some((Section::Bounds, 1)),
            "end" => Some((Section::End, 1)),
            "general" | "generals" | "gen" | "binary" | "binaries" | "bin" | "semi" | "semis" | "sos" => {
                Some((Section::Unsupported, 1))
            }
            _ => None,
        }
    }

    fn parse_sense(&mut self) -> Result<Sense, ParseError> {
        let sense = match self.current() {
            Some(t) if t.kind == TokenKind::Ident => match t.text.to_ascii_lowercase().as_str() {
                "min" | "minimize" | "minimise" | "minimum" => Some(Sense::Minimize),
                "max" | "maximize" | "maximise" | "maximum" => Some(Sense::Maximize),
                _ => None,
            },
            _ => None,
        };
        match sense {
            Some(s) => {
                self.advance();
                Ok(s)
            }
            None => Err(self.unexpected("minimize or maximize")),
        }
    }

    /// `name:` prefix, if present
    fn parse_label(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek_kind() == TokenKind::Ident && self.peek_kind_at(1) == TokenKind::Colon && self.section_at().is_none()
        {
            let name = self.expect(TokenKind::Ident)?.text;
            self.expect(TokenKind::Colon)?;
            return Ok(Some(name));
        }
        Ok(None)
    }

    fn parse_number(&mut self) -> Result<f64, ParseError> {
        let token = self.expect(TokenKind::Number)?;
        token
            .text
            .parse::<f64>()
            .map_err(|_| ParseError::InvalidNumber(token.text.clone()))
    }

    fn note_var(&mut self, name: &str) {
        if !self.bounds.contains_key(name) {
            self.var_order.push(name.to_string());
            self.bounds.insert(name.to_string(), (0.0, f64::INFINITY));
        }
    }

    /// Does the cursor start something other than another term?
    fn at_expression_end(&self) -> bool {
        match self.peek_kind() {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Number => false,
            TokenKind::Ident => self.section_at().is_some() || self.peek_kind_at(1) == TokenKind::Colon,
            _ => true,
        }
    }

    /// `[+|-] [number] [ident]` terms until the expression ends
    fn parse_expression(&mut self) -> Result<(Vec<(String, f64)>, f64), ParseError> {
        let mut terms = Vec::new();
        let mut constant = 0.0;
        let mut first = true;

        while !self.at_expression_end() {
            let mut sign = 1.0;
            let mut saw_sign = false;
            while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
                if self.peek_kind() == TokenKind::Minus {
                    sign = -sign;
                }
                saw_sign = true;
                self.advance();
            }
            if !first && !saw_sign {
                return Err(self.unexpected("+ or -"));
            }

            let coef = if self.peek_kind() == TokenKind::Number {
                Some(self.parse_number()?)
            } else {
                None
            };

            let is_var = self.peek_kind() == TokenKind::Ident && self.section_at().is_none();
            if is_var {
                let name = self.expect(TokenKind::Ident)?.text;
                self.note_var(&name);
                terms.push((name, sign * coef.unwrap_or(1.0)));
            } else if let Some(c) = coef {
                constant += sign * c;
            } else {
                return Err(self.unexpected("number or variable"));
            }
            first = false;
        }

        Ok((terms, constant))
    }

    fn parse_relation(&mut self) -> Result<Relation, ParseError> {
        let relation = match self.peek_kind() {
            TokenKind::Le => Relation::Le,
            TokenKind::Ge => Relation::Ge,
            TokenKind::Eq => Relation::Eq,
            _ => return Err(self.unexpected("<=, >= or =")),
        };
        self.advance();
        Ok(relation)
    }

    fn parse_signed_number(&mut self) -> Result<f64, ParseError> {
        let mut sign = 1.0;
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            if self.peek_kind() == TokenKind::Minus {
                sign = -sign;
            }
            self.advance();
        }
        Ok(sign * self.parse_number()?)
    }

    fn at_infinity(&self, offset: usize) -> bool {
        self.word_at(offset, "inf") || self.word_at(offset, "infinity")
    }

    /// A bound value: signed number or signed `inf`/`infinity`
    fn parse_bound_value(&mut self) -> Result<f64, ParseError> {
        let mut sign = 1.0;
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            if self.peek_kind() == TokenKind::Minus {
                sign = -sign;
            }
            self.advance();
        }
        if self.at_infinity(0) {
            self.advance();
            return Ok(sign * f64::INFINITY);
        }
        Ok(sign * self.parse_number()?)
    }

    fn starts_bound_value(&self) -> bool {
        let mut offset = 0;
        while matches!(self.peek_kind_at(offset), TokenKind::Plus | TokenKind::Minus) {
            offset += 1;
        }
        self.peek_kind_at(offset) == TokenKind::Number || self.at_infinity(offset)
    }

    fn parse_bound_name(&mut self) -> Result<String, ParseError> {
        if self.section_at().is_some() {
            return Err(self.unexpected("variable name"));
        }
        let name = self.expect(TokenKind::Ident)?.text;
        self.note_var(&name);
        Ok(name)
    }

    fn apply_bound(&mut self, name: &str, relation: Relation, value: f64) {
        if let Some(b) = self.bounds.get_mut(name) {
            match relation {
                Relation::Le => b.1 = value,
                Relation::Ge => b.0 = value,
                Relation::Eq => *b = (value, value),
            }
        }
    }

    fn parse_bound_line(&mut self) -> Result<(), ParseError> {
        if self.starts_bound_value() {
            // value rel name [rel value]
            let value = self.parse_bound_value()?;
            let relation = self.parse_relation()?;
            let name = self.parse_bound_name()?;
            // `l <= x` bounds x from below
            let flipped = match relation {
                Relation::Le => Relation::Ge,
                Relation::Ge => Relation::Le,
                Relation::Eq => Relation::Eq,
            };
            self.apply_bound(&name, flipped, value);
            if matches!(self.peek_kind(), TokenKind::Le | TokenKind::Ge | TokenKind::Eq) {
                let relation = self.parse_relation()?;
                let value = self.parse_bound_value()?;
                self.apply_bound(&name, relation, value);
            }
            return Ok(());
        }

        let name = self.parse_bound_name()?;
        if self.word_at(0, "free") {
            self.advance();
            if let Some(b) = self.bounds.get_mut(&name) {
                *b = (f64::NEG_INFINITY, f64::INFINITY);
            }
            return Ok(());
        }
        let relation = self.parse_relation()?;
        let value = self.parse_bound_value()?;
        self.apply_bound(&name, relation, value);
        Ok(())
    }

    fn enter_section(&mut self) -> Result<Option<Section>, ParseError> {
        match self.section_at() {
            Some((Section::Unsupported, _)) => {
                let token = self.current().cloned().ok_or(ParseError::UnexpectedEof)?;
                Err(ParseError::UnsupportedSection {
                    section: token.text,
                    span: token.span,
                })
            }
            Some((section, len)) => {
                self.pos += len;
                Ok(Some(section))
            }
            None => Ok(None),
        }
    }

    fn parse_program(&mut self, name: String) -> Result<Model, ParseError> {
        let sense = self.parse_sense()?;
        let objective_name = self.parse_label()?.unwrap_or_else(|| "obj".to_string());
        let (objective_terms, objective_constant) = self.parse_expression()?;

        let mut rows = Vec::new();
        let mut section = self.enter_section()?;

        if section == Some(Section::SubjectTo) {
            while self.section_at().is_none() && self.peek_kind() != TokenKind::Eof {
                let label = self.parse_label()?;
                let expr_start = self.pos;
                let (terms, constant) = self.parse_expression()?;
                if self.pos == expr_start {
                    return Err(self.unexpected("linear expression"));
                }
                let relation = self.parse_relation()?;
                let rhs = self.parse_signed_number()?;
                rows.push(RawRow {
                    name: label.unwrap_or_else(|| format!("R{}", rows.len() + 1)),
                    terms,
                    constant,
                    relation,
                    rhs,
                });
            }
            section = self.enter_section()?;
        }

        if section == Some(Section::Bounds) {
            while self.section_at().is_none() && self.peek_kind() != TokenKind::Eof {
                self.parse_bound_line()?;
            }
            section = self.enter_section()?;
        }

        match section {
            Some(Section::End) | None if self.peek_kind() == TokenKind::Eof => {}
            _ => return Err(self.unexpected("end of file")),
        }

        self.build_model(name, sense, objective_name, objective_terms, objective_constant, rows)
    }

    fn build_model(
        &self,
        name: String,
        sense: Sense,
        objective_name: String,
        objective_terms: Vec<(String, f64)>,
        objective_constant: f64,
        rows: Vec<RawRow>,
    ) -> Result<Model, ParseError> {
        let mut model = Model::new(name);
        for var in &self.var_order {
            let (lo, hi) = self.bounds[var];
            let finite = |v: f64| if v.is_finite() { Some(v) } else { None };
            if lo >= 0.0 {
                let lb = if lo > 0.0 { Some(lo) } else { None };
                model.add_var_bounded(var.clone(), Domain::NonNegativeReals, lb, finite(hi))?;
            } else if hi <= 0.0 {
                let ub = if hi < 0.0 { Some(hi) } else { None };
                model.add_var_bounded(var.clone(), Domain::NonPositiveReals, finite(lo), ub)?;
            } else {
                model.add_var_bounded(var.clone(), Domain::Reals, finite(lo), finite(hi))?;
            }
        }

        let resolve = |model: &Model, terms: &[(String, f64)], constant: f64| -> LinearExpr {
            let mut expr = LinearExpr::constant(constant);
            for (var, coef) in terms {
                if let Some(id) = model.var(var) {
                    expr = expr + LinearExpr::term(id, *coef);
                }
            }
            expr
        };

        let objective = resolve(&model, &objective_terms, objective_constant);
        model.set_objective(objective_name, objective, sense)?;

        for row in rows {
            let body = resolve(&model, &row.terms, row.constant);
            let constraint = match row.relation {
                Relation::Le => body.le(row.rhs),
                Relation::Ge => body.ge(row.rhs),
                Relation::Eq => body.equals(row.rhs),
            };
            model.add_constraint(row.name, constraint)?;
        }

        Ok(model)
    }
}
