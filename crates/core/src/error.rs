use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Expression not found: {0}")]
    ExpressionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
