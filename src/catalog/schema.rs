//! Schema definitions for minirel
//!
//! This module defines table schemas and column metadata.

use super::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Non-owning reference from a foreign-key column to `table(column)`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.table, self.column)
    }
}

/// Column definition in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// Column position (0-indexed)
    pub position: usize,
    /// Is this the primary key?
    pub primary_key: bool,
    /// Is this column unique?
    pub unique: bool,
    /// Foreign key target, if any
    pub references: Option<ForeignKeyRef>,
}

impl Column {
    /// Create a new column with minimal required fields
    pub fn new(name: impl Into<String>, data_type: DataType, position: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            position,
            primary_key: false,
            unique: false,
            references: None,
        }
    }

    /// Set primary key flag
    pub fn primary_key(mut self, pk: bool) -> Self {
        self.primary_key = pk;
        self
    }

    /// Set unique flag
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    /// Set foreign key target
    pub fn references(mut self, target: Option<ForeignKeyRef>) -> Self {
        self.references = target;
        self
    }

    /// Values in this column must be distinct across rows
    pub fn is_key(&self) -> bool {
        self.primary_key || self.unique
    }
}

/// Table schema - defines the structure of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Ordered list of columns
    columns: Vec<Column>,
    /// Column name to index mapping
    name_to_index: HashMap<String, usize>,
}

impl Schema {
    /// Create a new empty schema
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            name_to_index: HashMap::new(),
        }
    }

    /// Create a schema from a list of columns
    pub fn from_columns(columns: Vec<Column>) -> Self {
        let mut schema = Self::new();
        for col in columns {
            schema.add_column(col);
        }
        schema
    }

    /// Add a column to the schema
    pub fn add_column(&mut self, mut column: Column) {
        column.position = self.columns.len();
        self.name_to_index
            .insert(column.name.clone(), column.position);
        self.columns.push(column);
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.name_to_index.get(name).map(|&idx| &self.columns[idx])
    }

    /// Get column index by name
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get all columns
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Get number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns carrying a foreign key
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&Column, &ForeignKeyRef)> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_ref().map(|r| (c, r)))
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Table definition - full table metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name
    pub name: String,
    /// Table schema
    pub schema: Schema,
    /// Table ID (for internal use)
    pub id: u32,
}

impl TableDef {
    /// Create a new table definition
    pub fn new(name: impl Into<String>, schema: Schema, id: u32) -> Self {
        Self {
            name: name.into(),
            schema,
            id,
        }
    }

    /// Get the table name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the table schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.schema.get_column(name)
    }
}

/// Index definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name
    pub name: String,
    /// Table this index belongs to
    pub table_name: String,
    /// Indexed column
    pub column: String,
    /// Position of the indexed column in the table
    pub position: usize,
    /// Index ID
    pub id: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_creation() {
        let mut schema = Schema::new();
        schema.add_column(Column::new("id", DataType::Int, 0).primary_key(true));
        schema.add_column(Column::new("email", DataType::Varchar(None), 7).unique(true));
        schema.add_column(Column::new("supplier_id", DataType::Int, 0).references(Some(
            ForeignKeyRef {
                table: "s".to_string(),
                column: "id".to_string(),
            },
        )));

        assert_eq!(schema.column_count(), 3);
        assert!(schema.get_column("unknown").is_none());
        assert_eq!(schema.get_column_index("email"), Some(1));
        assert!(schema.get_column("id").unwrap().primary_key);
        assert!(schema.get_column("email").unwrap().is_key());

        let fks: Vec<_> = schema.foreign_keys().collect();
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].0.position, 2);
        assert_eq!(fks[0].1.to_string(), "s(id)");
    }

    #[test]
    fn test_table_def() {
        let schema = Schema::from_columns(vec![
            Column::new("id", DataType::Int, 0).primary_key(true),
            Column::new("value", DataType::Varchar(None), 1),
        ]);

        let table = TableDef::new("test_table", schema, 1);

        assert_eq!(table.name(), "test_table");
        assert_eq!(table.schema().column_count(), 2);
        assert!(table.get_column("id").is_some());
    }
}
