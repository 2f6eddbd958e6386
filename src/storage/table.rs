//! Table storage for minirel
//!
//! This module combines a schema with an in-memory row store and the hash
//! indexes defined on it. Every mutation runs the index hooks, so the indexes
//! never drift from the rows.

use super::index::HashIndex;
use super::value::{Tuple, Value};
use crate::catalog::{Schema, TableDef};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use std::fmt;

/// Engine-internal row handle, never reused within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A table combining schema and storage
#[derive(Debug, Clone)]
pub struct Table {
    /// Table definition (metadata)
    def: TableDef,
    /// Rows keyed by row id; id order is insertion order
    rows: BTreeMap<RowId, Tuple>,
    /// Next row id to hand out
    next_row_id: u64,
    /// Indexes by name
    indexes: IndexMap<String, HashIndex>,
}

impl Table {
    /// Create a new empty table
    pub fn new(def: TableDef) -> Self {
        Self {
            def,
            rows: BTreeMap::new(),
            next_row_id: 0,
            indexes: IndexMap::new(),
        }
    }

    /// Get table name
    pub fn name(&self) -> &str {
        self.def.name()
    }

    /// Get table schema
    pub fn schema(&self) -> &Schema {
        self.def.schema()
    }

    /// Create an index on a column, populated from the current rows
    pub fn create_index(&mut self, name: &str, column: &str) -> Result<()> {
        let position = self
            .schema()
            .get_column_index(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string(), self.name().to_string()))?;

        let index = HashIndex::build(name, position, self.rows.iter().map(|(id, t)| (*id, t)));
        self.indexes.insert(name.to_string(), index);
        Ok(())
    }

    /// Drop an index by name
    pub fn drop_index(&mut self, name: &str) -> Option<HashIndex> {
        self.indexes.shift_remove(name)
    }

    /// Get index by name
    pub fn get_index(&self, name: &str) -> Option<&HashIndex> {
        self.indexes.get(name)
    }

    /// Get the index covering a column position
    pub fn index_for_column(&self, position: usize) -> Option<&HashIndex> {
        self.indexes.values().find(|idx| idx.column() == position)
    }

    /// Equality lookup through an index
    ///
    /// `None` means the column has no index and the caller must scan.
    pub fn lookup_equal(&self, position: usize, value: &Value) -> Option<Vec<RowId>> {
        self.index_for_column(position).map(|idx| idx.lookup(value))
    }

    /// Insert a tuple into the table
    pub fn insert(&mut self, tuple: Tuple) -> Result<RowId> {
        self.check_arity(&tuple)?;

        let row_id = RowId(self.next_row_id);
        self.next_row_id += 1;

        for index in self.indexes.values_mut() {
            index.on_insert(row_id, &tuple);
        }
        self.rows.insert(row_id, tuple);
        Ok(row_id)
    }

    /// Replace a row in place, returning the previous tuple
    ///
    /// Returns `Ok(None)` if the row does not exist.
    pub fn update(&mut self, row_id: RowId, tuple: Tuple) -> Result<Option<Tuple>> {
        self.check_arity(&tuple)?;

        let Some(slot) = self.rows.get_mut(&row_id) else {
            return Ok(None);
        };
        for index in self.indexes.values_mut() {
            index.on_update(row_id, slot, &tuple);
        }
        Ok(Some(std::mem::replace(slot, tuple)))
    }

    /// Delete a row, returning it
    pub fn delete(&mut self, row_id: RowId) -> Option<Tuple> {
        let tuple = self.rows.remove(&row_id)?;
        for index in self.indexes.values_mut() {
            index.on_delete(row_id, &tuple);
        }
        Some(tuple)
    }

    /// Get a tuple by row id
    pub fn get(&self, row_id: RowId) -> Option<&Tuple> {
        self.rows.get(&row_id)
    }

    /// Scan all tuples in insertion order
    pub fn scan(&self) -> impl Iterator<Item = (RowId, &Tuple)> + '_ {
        self.rows.iter().map(|(id, t)| (*id, t))
    }

    /// Get tuple count
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table holds no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check that every index reflects exactly the current rows
    pub fn indexes_consistent(&self) -> bool {
        self.indexes.values().all(|idx| idx.matches(self.scan()))
    }

    fn check_arity(&self, tuple: &Tuple) -> Result<()> {
        let expected = self.schema().column_count();
        if tuple.len() != expected {
            return Err(Error::ArityMismatch {
                table: self.name().to_string(),
                expected,
                found: tuple.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Column, DataType};

    fn create_test_table() -> Table {
        let mut schema = Schema::new();
        schema.add_column(Column::new("id", DataType::Int, 0).primary_key(true));
        schema.add_column(Column::new("name", DataType::Varchar(Some(100)), 1));
        schema.add_column(Column::new("age", DataType::Int, 2));

        Table::new(TableDef::new("users", schema, 1))
    }

    fn user(id: i64, name: &str, age: i64) -> Tuple {
        Tuple::new(vec![Value::Int(id), Value::from(name), Value::Int(age)])
    }

    #[test]
    fn test_table_insert() {
        let mut table = create_test_table();

        let tuple = user(1, "Alice", 25);
        let row_id = table.insert(tuple.clone()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(row_id), Some(&tuple));
    }

    #[test]
    fn test_table_arity() {
        let mut table = create_test_table();

        let err = table.insert(Tuple::new(vec![Value::Int(1)])).unwrap_err();
        assert!(matches!(
            err,
            Error::ArityMismatch {
                expected: 3,
                found: 1,
                ..
            }
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_row_ids_are_not_reused() {
        let mut table = create_test_table();

        let a = table.insert(user(1, "Alice", 25)).unwrap();
        table.delete(a).unwrap();
        let b = table.insert(user(1, "Alice", 25)).unwrap();
        assert_ne!(a, b);
        assert!(table.delete(a).is_none());
    }

    #[test]
    fn test_index_follows_mutations() {
        let mut table = create_test_table();
        let a = table.insert(user(1, "Alice", 25)).unwrap();
        table.create_index("idx_age", "age").unwrap();
        let b = table.insert(user(2, "Bob", 25)).unwrap();

        assert_eq!(table.lookup_equal(2, &Value::Int(25)), Some(vec![a, b]));
        assert_eq!(table.lookup_equal(1, &Value::from("Bob")), None);

        let old = table.update(b, user(2, "Bob", 30)).unwrap().unwrap();
        assert_eq!(old, user(2, "Bob", 25));
        assert_eq!(table.lookup_equal(2, &Value::Int(25)), Some(vec![a]));
        assert_eq!(table.lookup_equal(2, &Value::Int(30)), Some(vec![b]));

        table.delete(a);
        assert_eq!(table.lookup_equal(2, &Value::Int(25)), Some(vec![]));
        assert!(table.indexes_consistent());

        assert!(table.drop_index("idx_age").is_some());
        assert_eq!(table.lookup_equal(2, &Value::Int(30)), None);
    }

    #[test]
    fn test_index_unknown_column() {
        let mut table = create_test_table();
        assert!(matches!(
            table.create_index("idx", "zip"),
            Err(Error::ColumnNotFound(..))
        ));
    }
}
