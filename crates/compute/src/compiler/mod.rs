//! Expression compiler: validate, tokenize, convert to postfix, build a tree.

mod error;
pub mod postfix;
pub mod token;
pub mod tree;
pub mod validate;


pub use error::CompileError;
pub use postfix::to_postfix;
pub use token::{Operator, Token};
pub use tree::{build, ExprNode, NodeKind, NodeState, OperandSource};
pub use validate::{check, validate};

/// Run the whole front end on one expression.
pub fn compile(expr: &str) -> Result<ExprNode, CompileError> {
    check(expr)?;
    let postfix = to_postfix(expr)?;
    tracing::debug!(postfix = %postfix::render(&postfix), "expression converted");
    build(&postfix)
}
