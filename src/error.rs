//! Error types for the compiler pipeline

use thiserror::Error;

/// Result type for compiler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Compiler pipeline errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("line {line} column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("repeated {what} name '{name}' in {scope}")]
    DuplicateName {
        what: &'static str,
        name: String,
        scope: String,
    },

    #[error("type {type_name} field {field} references type '{target}' which is not found in the module")]
    UnresolvedTypeReference {
        type_name: String,
        field: String,
        target: String,
    },

    #[error("invalid shape for field '{field}': {reason}")]
    InvalidFieldShape { field: String, reason: String },

    #[error("type {type_name} cannot hold itself through field '{field}': the type is incomplete at that point")]
    IncompleteTypeByValue { type_name: String, field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Syntax error at a source location with an expectation message
    pub fn syntax(line: usize, column: usize, message: impl Into<String>) -> Self {
        Error::Syntax {
            line,
            column,
            message: message.into(),
        }
    }
}
