use thiserror::Error;

/// Why an expression could not be compiled into a tree.
///
/// Positions are byte offsets into the submitted text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("expression is empty")]
    Empty,

    #[error("invalid character '{ch}' at position {pos}")]
    InvalidCharacter { ch: char, pos: usize },

    #[error("malformed number '{literal}' at position {pos}")]
    MalformedNumber { literal: String, pos: usize },

    #[error("operator '{op}' at position {pos} has no left operand")]
    MisplacedOperator { op: char, pos: usize },

    #[error("')' at position {pos} closes an empty group or follows an operator")]
    MisplacedClosingBracket { pos: usize },

    #[error("missing operator before position {pos}")]
    MissingOperator { pos: usize },

    #[error("')' at position {pos} has no matching '('")]
    UnmatchedClosingBracket { pos: usize },

    #[error("{0} unclosed '('")]
    UnclosedBracket(usize),

    #[error("expression ends with '{0}'")]
    TrailingOperator(char),

    #[error("unbalanced parentheses in token stream")]
    MismatchedParenthesis,

    #[error("operator '{0}' is missing an operand")]
    MissingOperand(String),

    #[error("invalid number literal '{0}'")]
    InvalidLiteral(String),

    #[error("malformed expression: {0} operands left without an operator")]
    LeftoverOperands(usize),
}
