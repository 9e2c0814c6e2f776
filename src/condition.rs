// Condition module - lexing, parsing and evaluation of filter conditions

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use eval::{evaluate_condition, merge, ConditionEvaluator};
pub use lexer::Lexer;
pub use parser::{parse_condition, Parser};
pub use token::*;
