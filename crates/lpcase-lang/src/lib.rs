pub mod compiler;
pub mod expr;
pub mod lexer;
pub mod model;
pub mod parser;
pub mod writer;

pub use compiler::{compile, solve, CompileError, CompiledModel, ModelSolution, RowOrigin, VarColumns};
pub use expr::{ConstraintExpr, LinearExpr, Relation, VarId};
pub use lexer::{Lexer, Span, Token, TokenKind};
pub use model::{Constraint, Domain, Model, ModelError, Objective, Sense, Var};
pub use parser::{ParseError, Parser};
pub use writer::{write_lp, WriteError};
