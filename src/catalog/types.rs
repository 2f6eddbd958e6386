//! Data types for minirel
//!
//! This module defines the column types a table may declare.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
    /// Character string with an optional maximum length
    Varchar(Option<usize>),
    /// Boolean
    Bool,
}

impl DataType {
    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int | DataType::Float)
    }

    /// Check if this type is a string type
    pub fn is_string(&self) -> bool {
        matches!(self, DataType::Varchar(_))
    }

    /// Check if values of the two types can be compared with each other
    pub fn is_comparable_with(&self, other: &DataType) -> bool {
        match (self, other) {
            (a, b) if a.is_numeric() && b.is_numeric() => true,
            (a, b) if a.is_string() && b.is_string() => true,
            (DataType::Bool, DataType::Bool) => true,
            _ => false,
        }
    }

    /// Same storage family, ignoring VARCHAR length
    pub fn same_family(&self, other: &DataType) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int => write!(f, "INT"),
            DataType::Float => write!(f, "FLOAT"),
            DataType::Varchar(None) => write!(f, "VARCHAR"),
            DataType::Varchar(Some(n)) => write!(f, "VARCHAR({})", n),
            DataType::Bool => write!(f, "BOOL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_comparison() {
        assert!(DataType::Int.is_comparable_with(&DataType::Float));
        assert!(DataType::Varchar(Some(5)).is_comparable_with(&DataType::Varchar(None)));
        assert!(!DataType::Int.is_comparable_with(&DataType::Varchar(None)));
        assert!(!DataType::Bool.is_comparable_with(&DataType::Int));
    }

    #[test]
    fn test_type_display() {
        assert_eq!(DataType::Varchar(Some(40)).to_string(), "VARCHAR(40)");
        assert_eq!(DataType::Varchar(None).to_string(), "VARCHAR");
        assert!(DataType::Varchar(Some(1)).same_family(&DataType::Varchar(None)));
        assert!(!DataType::Int.same_family(&DataType::Float));
    }
}
