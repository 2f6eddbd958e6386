//! Error types for minirel
//!
//! Every error carries a stable [`ErrorKind`] tag so callers can branch on the
//! failure class without matching on message text.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The main error type for minirel
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Lexer error: invalid number format at position {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    #[error("Parse error: unrecognized command '{0}'")]
    UnrecognizedCommand(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    // ========== Catalog Errors ==========
    #[error("Catalog error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Catalog error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Catalog error: column '{0}' not found in table '{1}'")]
    ColumnNotFound(String, String),

    #[error("Catalog error: column reference '{0}' is ambiguous")]
    AmbiguousColumn(String),

    #[error("Catalog error: column '{0}' declared twice in table '{1}'")]
    DuplicateColumn(String, String),

    #[error("Catalog error: table '{0}' declares more than one primary key")]
    MultiplePrimaryKeys(String),

    #[error("Catalog error: invalid foreign key - {0}")]
    InvalidForeignKey(String),

    #[error("Catalog error: table '{table}' is referenced by '{referenced_by}'")]
    TableReferenced { table: String, referenced_by: String },

    // ========== Index Errors ==========
    #[error("Index error: {0}")]
    InvalidIndex(String),

    // ========== Type Errors ==========
    #[error("Type error: expected {expected} value for column '{column}', found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("Type error: cannot compare {left} with {right}")]
    IncomparableTypes { left: String, right: String },

    #[error("Type error: null value not allowed for column '{0}'")]
    NullNotAllowed(String),

    #[error("Type error: value too long for column '{0}' (max {1} characters)")]
    ValueTooLong(String, usize),

    #[error("Arity error: table '{table}' expects {expected} values, got {found}")]
    ArityMismatch {
        table: String,
        expected: usize,
        found: usize,
    },

    // ========== Constraint Errors ==========
    #[error("Constraint error: duplicate primary key {value} for column '{column}' in table '{table}'")]
    DuplicateKey {
        table: String,
        column: String,
        value: String,
    },

    #[error("Constraint error: duplicate value {value} for unique column '{column}' in table '{table}'")]
    UniqueViolation {
        table: String,
        column: String,
        value: String,
    },

    #[error("Constraint error: foreign key violation - {0}")]
    ForeignKeyViolation(String),
}

/// Stable classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    Parse,
    UnknownTable,
    UnknownColumn,
    DuplicateTable,
    ArityMismatch,
    TypeMismatch,
    DuplicateKey,
    UniqueViolation,
    ForeignKeyViolation,
    InvalidIndex,
}

impl Error {
    /// The stable kind tag for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedCharacter(..)
            | Error::UnterminatedString(_)
            | Error::InvalidNumber(_)
            | Error::UnexpectedToken { .. }
            | Error::UnexpectedEof(_)
            | Error::UnrecognizedCommand(_)
            | Error::ParseError(_)
            | Error::DuplicateColumn(..)
            | Error::MultiplePrimaryKeys(_) => ErrorKind::Parse,
            Error::TableNotFound(_) => ErrorKind::UnknownTable,
            Error::ColumnNotFound(..) | Error::AmbiguousColumn(_) => ErrorKind::UnknownColumn,
            Error::TableAlreadyExists(_) => ErrorKind::DuplicateTable,
            Error::InvalidIndex(_) => ErrorKind::InvalidIndex,
            Error::TypeMismatch { .. }
            | Error::IncomparableTypes { .. }
            | Error::NullNotAllowed(_)
            | Error::ValueTooLong(..) => ErrorKind::TypeMismatch,
            Error::ArityMismatch { .. } => ErrorKind::ArityMismatch,
            Error::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Error::UniqueViolation { .. } => ErrorKind::UniqueViolation,
            Error::InvalidForeignKey(_)
            | Error::TableReferenced { .. }
            | Error::ForeignKeyViolation(_) => ErrorKind::ForeignKeyViolation,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "ParseError",
            ErrorKind::UnknownTable => "UnknownTable",
            ErrorKind::UnknownColumn => "UnknownColumn",
            ErrorKind::DuplicateTable => "DuplicateTable",
            ErrorKind::ArityMismatch => "ArityMismatch",
            ErrorKind::TypeMismatch => "TypeMismatch",
            ErrorKind::DuplicateKey => "DuplicateKey",
            ErrorKind::UniqueViolation => "UniqueViolation",
            ErrorKind::ForeignKeyViolation => "ForeignKeyViolation",
            ErrorKind::InvalidIndex => "InvalidIndex",
        };
        f.write_str(name)
    }
}

/// Result type alias for minirel operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::TableNotFound("users".to_string());
        assert_eq!(err.to_string(), "Catalog error: table 'users' not found");

        let err = Error::UnexpectedCharacter('@', 5);
        assert_eq!(
            err.to_string(),
            "Lexer error: unexpected character '@' at position 5"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(Error::InvalidNumber(3).kind(), ErrorKind::Parse);
        assert_eq!(
            Error::UnrecognizedCommand("FOO".into()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(
            Error::InvalidForeignKey("x".into()).kind(),
            ErrorKind::ForeignKeyViolation
        );
        assert_eq!(
            Error::NullNotAllowed("id".into()).kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(ErrorKind::DuplicateKey.to_string(), "DuplicateKey");
    }
}
