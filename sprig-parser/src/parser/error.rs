use thiserror::Error;

/// Unexpected token no error handler recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[ERROR] ({line}, {column}): unexpected {tag} {text:?}")]
pub struct SyntaxError {
    pub tag: String,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

pub type ParseResult<T> = Result<T, SyntaxError>;
