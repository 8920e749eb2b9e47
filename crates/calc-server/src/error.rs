//! Domain errors raised by calculator operations
//!
//! These are reported to the caller as tool results with `isError` set,
//! never as JSON-RPC errors, and never abort the server.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("Division by zero is not allowed")]
    DivisionByZero,

    #[error("Cannot take the square root of a negative number ({0})")]
    NegativeSquareRoot(f64),

    #[error("Operation '{0}' refused: is_safe was set to false")]
    UnsafeCallRefused(&'static str),

    #[error("Operation '{0}' produced a non-finite result")]
    NonFinite(&'static str),

    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument { name: String, reason: String },
}

impl CalcError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        CalcError::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_cause() {
        assert_eq!(
            CalcError::UnsafeCallRefused("add").to_string(),
            "Operation 'add' refused: is_safe was set to false"
        );
        assert!(CalcError::NegativeSquareRoot(-1.0).to_string().contains("-1"));
        assert_eq!(
            CalcError::invalid("a", "missing").to_string(),
            "Invalid argument 'a': missing"
        );
    }
}
