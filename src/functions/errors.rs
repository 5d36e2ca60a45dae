//! # Function Errors

use thiserror::Error;

/// Result type for function operations
pub type FunctionResult<T> = Result<T, FunctionError>;

/// Function errors
///
/// Resolution errors (`UnknownFunction`, `InvalidPattern`, `UnknownDialog`,
/// `InvalidArguments`) surface while a form is built. The rest happen during
/// evaluation and are absorbed by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunctionError {
    #[error("Function not found: {0}")]
    UnknownFunction(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid arguments for {function}: {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("Not a number: '{0}'")]
    NotANumber(String),

    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Dialog '{0}' has no selected result yet")]
    DialogPending(String),

    #[error("Dialog not found: {0}")]
    UnknownDialog(String),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl FunctionError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            FunctionError::UnknownFunction(_) => "FUNC_UNKNOWN_FUNCTION",
            FunctionError::InvalidPattern { .. } => "FUNC_INVALID_PATTERN",
            FunctionError::InvalidArguments { .. } => "FUNC_INVALID_ARGUMENTS",
            FunctionError::NotANumber(_) => "FUNC_NOT_A_NUMBER",
            FunctionError::Arithmetic(_) => "FUNC_ARITHMETIC",
            FunctionError::DialogPending(_) => "FUNC_DIALOG_PENDING",
            FunctionError::UnknownDialog(_) => "FUNC_UNKNOWN_DIALOG",
            FunctionError::Runtime(_) => "FUNC_RUNTIME",
        }
    }

    /// Whether this error can only arise while resolving an expression
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            FunctionError::UnknownFunction(_)
                | FunctionError::InvalidPattern { .. }
                | FunctionError::UnknownDialog(_)
                | FunctionError::InvalidArguments { .. }
        )
    }
}
