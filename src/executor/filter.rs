//! WHERE predicate evaluation
//!
//! A [`Predicate`] is a single `<column> <op> <literal>` comparison whose
//! literal has already been checked against the column's declared type.

use crate::catalog::DataType;
use crate::error::{Error, Result};
use crate::sql::ast::{CompareOp, Literal};
use crate::storage::{Tuple, Value};
use std::cmp::Ordering;

/// A comparison bound to a column position
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    /// Position of the column in the rows being filtered
    pub position: usize,
    /// Declared type of the column
    pub column_type: DataType,
    /// Comparison operator
    pub op: CompareOp,
    /// Right-hand side
    pub value: Value,
}

impl Predicate {
    /// Bind a literal against a column, rejecting literals that can never
    /// compare with the column's type
    pub fn bind(
        column: &str,
        column_type: DataType,
        position: usize,
        op: CompareOp,
        literal: &Literal,
    ) -> Result<Self> {
        let value = match (literal, column_type) {
            (Literal::Null, _) => Value::Null,
            (Literal::Integer(i), DataType::Int) => Value::Int(*i),
            (Literal::Integer(i), DataType::Float) => Value::Float(*i as f64),
            (Literal::Float(f), DataType::Int | DataType::Float) => Value::Float(*f),
            (Literal::String(s), DataType::Varchar(_)) => Value::Text(s.clone()),
            (Literal::Boolean(b), DataType::Bool) => Value::Bool(*b),
            (lit, ty) => {
                return Err(Error::TypeMismatch {
                    column: column.to_string(),
                    expected: ty.to_string(),
                    found: literal_type(lit).to_string(),
                })
            }
        };

        if op == CompareOp::Like && !column_type.is_string() {
            return Err(Error::IncomparableTypes {
                left: column_type.to_string(),
                right: "LIKE pattern".to_string(),
            });
        }

        Ok(Self {
            position,
            column_type,
            op,
            value,
        })
    }

    /// Same predicate, reading the column at another position
    pub fn at(&self, position: usize) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    /// Evaluate against a full row
    pub fn matches(&self, tuple: &Tuple) -> bool {
        tuple.get(self.position).is_some_and(|cell| self.evaluate(cell))
    }

    /// Evaluate against a single cell. Anything compared with NULL is false.
    pub fn evaluate(&self, cell: &Value) -> bool {
        if cell.is_null() || self.value.is_null() {
            return false;
        }
        if self.op == CompareOp::Like {
            return match (cell, &self.value) {
                (Value::Text(text), Value::Text(pattern)) => like_matches(text, pattern),
                _ => false,
            };
        }

        let Some(ordering) = cell.compare(&self.value) else {
            return false;
        };
        match self.op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Neq => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
            CompareOp::Like => false,
        }
    }

    /// The key to probe an index with, if this predicate can use one
    ///
    /// Only `=` qualifies, and only when the literal is stored exactly the
    /// way the column stores its values.
    pub fn index_key(&self) -> Option<Value> {
        if self.op != CompareOp::Eq {
            return None;
        }
        index_key_for(&self.value, &self.column_type)
    }
}

/// Convert a value into the exact representation a column of `data_type`
/// stores, so it can be used as a hash-index key
pub fn index_key_for(value: &Value, data_type: &DataType) -> Option<Value> {
    match (value, data_type) {
        (Value::Null, _) => None,
        (Value::Int(i), DataType::Float) => Some(Value::Float(*i as f64)),
        (v, ty) if v.fits(ty) => Some(v.clone()),
        _ => None,
    }
}

/// Name of a literal's type, for error messages
pub fn literal_type(literal: &Literal) -> &'static str {
    match literal {
        Literal::Null => "NULL",
        Literal::Boolean(_) => "BOOL",
        Literal::Integer(_) => "INT",
        Literal::Float(_) => "FLOAT",
        Literal::String(_) => "VARCHAR",
    }
}

/// Case-insensitive LIKE: `%` matches any run of characters, `_` exactly one
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    let (mut t, mut p) = (0, 0);
    // Last `%` seen and the text position it is currently absorbing up to
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, absorbed)) = backtrack {
            p = star + 1;
            t = absorbed + 1;
            backtrack = Some((star, t));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == '%')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pred(column_type: DataType, op: CompareOp, literal: Literal) -> Predicate {
        Predicate::bind("c", column_type, 0, op, &literal).unwrap()
    }

    fn row(v: Value) -> Tuple {
        Tuple::new(vec![v])
    }

    #[test]
    fn test_like() {
        assert!(like_matches("Acme Corp", "acme%"));
        assert!(like_matches("Acme Corp", "%CORP"));
        assert!(like_matches("Acme Corp", "%me%"));
        assert!(like_matches("Acme Corp", "A_me Corp"));
        assert!(like_matches("", "%"));
        assert!(like_matches("a%b", "a%b"));
        assert!(!like_matches("Acme Corp", "acme"));
        assert!(!like_matches("Acme", "%x%"));
        assert!(!like_matches("ab", "a_c"));
    }

    #[test]
    fn test_comparisons() {
        let gt = pred(DataType::Int, CompareOp::Gt, Literal::Integer(5));
        assert!(gt.matches(&row(Value::Int(6))));
        assert!(!gt.matches(&row(Value::Int(5))));

        let lte = pred(DataType::Float, CompareOp::Lte, Literal::Integer(5));
        assert_eq!(lte.value, Value::Float(5.0));
        assert!(lte.matches(&row(Value::Float(4.5))));

        let neq = pred(DataType::Varchar(None), CompareOp::Neq, Literal::String("a".into()));
        assert!(neq.matches(&row(Value::from("b"))));

        let like = pred(DataType::Varchar(None), CompareOp::Like, Literal::String("%x.com".into()));
        assert!(like.matches(&row(Value::from("a@X.COM"))));
    }

    #[test]
    fn test_null_never_matches() {
        let eq = pred(DataType::Int, CompareOp::Eq, Literal::Integer(1));
        assert!(!eq.matches(&row(Value::Null)));

        let neq = pred(DataType::Int, CompareOp::Neq, Literal::Integer(1));
        assert!(!neq.matches(&row(Value::Null)));

        let eq_null = pred(DataType::Int, CompareOp::Eq, Literal::Null);
        assert!(!eq_null.matches(&row(Value::Null)));
        assert!(!eq_null.matches(&row(Value::Int(1))));
    }

    #[test]
    fn test_bind_type_errors() {
        let err = Predicate::bind(
            "id",
            DataType::Int,
            0,
            CompareOp::Eq,
            &Literal::String("x".into()),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));

        let err = Predicate::bind("id", DataType::Int, 0, CompareOp::Like, &Literal::Integer(1))
            .unwrap_err();
        assert!(matches!(err, Error::IncomparableTypes { .. }));
    }

    #[test]
    fn test_index_key() {
        let eq = pred(DataType::Int, CompareOp::Eq, Literal::Integer(3));
        assert_eq!(eq.index_key(), Some(Value::Int(3)));

        let widened = pred(DataType::Int, CompareOp::Eq, Literal::Float(3.0));
        assert_eq!(widened.index_key(), None);

        let lt = pred(DataType::Int, CompareOp::Lt, Literal::Integer(3));
        assert_eq!(lt.index_key(), None);

        assert_eq!(
            index_key_for(&Value::Int(2), &DataType::Float),
            Some(Value::Float(2.0))
        );
    }
}
