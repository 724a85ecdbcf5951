//! 脚本模块：AST、表达式引擎与解析器

pub mod ast;
pub mod expr;
pub mod parser;

pub use ast::{Script, TraitValue, Traits};
pub use expr::{DefaultEngine, EvalContext, Expr, ExprEngine, ExprError, ExprValue};
pub use parser::{ArgPart, EXPR_END, EXPR_START, Parser, tokenize_parts};
