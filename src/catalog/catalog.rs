//! System Catalog for minirel
//!
//! This module manages metadata about tables, indexes, and the foreign keys
//! that link tables together.

use super::schema::{Column, IndexDef, Schema, TableDef};
use super::types::DataType;
use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::Serialize;

/// A foreign key edge: `child.child_column -> parent.parent_column`
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyLink {
    pub child_table: String,
    pub child_column: String,
    pub child_position: usize,
    pub parent_column: String,
    pub parent_position: usize,
}

/// One row of DESCRIBE output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub column: String,
    pub data_type: DataType,
    pub constraints: Vec<String>,
}

/// System Catalog - manages all database metadata
#[derive(Debug)]
pub struct Catalog {
    /// Table definitions by name, in creation order
    tables: IndexMap<String, TableDef>,
    /// Index definitions by name
    indexes: IndexMap<String, IndexDef>,
    /// Next table ID
    next_table_id: u32,
    /// Next index ID
    next_index_id: u32,
}

impl Catalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self {
            tables: IndexMap::new(),
            indexes: IndexMap::new(),
            next_table_id: 1,
            next_index_id: 1,
        }
    }

    /// Create a new table
    ///
    /// Foreign keys must name an existing table and one of its PRIMARY KEY or
    /// UNIQUE columns of the same type family. Since the target has to exist
    /// first, the reference graph can never contain a cycle.
    pub fn create_table(&mut self, name: &str, schema: Schema) -> Result<&TableDef> {
        if self.table_exists(name) {
            return Err(Error::TableAlreadyExists(name.to_string()));
        }
        self.validate_schema(name, &schema)?;

        let table_def = TableDef::new(name, schema, self.next_table_id);
        self.next_table_id += 1;

        let entry = self.tables.entry(name.to_string()).or_insert(table_def);
        Ok(&*entry)
    }

    fn validate_schema(&self, name: &str, schema: &Schema) -> Result<()> {
        if schema.column_count() == 0 {
            return Err(Error::ParseError(format!(
                "table '{}' must declare at least one column",
                name
            )));
        }

        let mut primary_keys = 0;
        for (i, col) in schema.columns().iter().enumerate() {
            if schema.columns()[..i].iter().any(|c| c.name == col.name) {
                return Err(Error::DuplicateColumn(col.name.clone(), name.to_string()));
            }
            if col.primary_key {
                primary_keys += 1;
            }
        }
        if primary_keys > 1 {
            return Err(Error::MultiplePrimaryKeys(name.to_string()));
        }

        for (col, target) in schema.foreign_keys() {
            if target.table == name {
                return Err(Error::InvalidForeignKey(format!(
                    "column '{}' of '{}' cannot reference its own table",
                    col.name, name
                )));
            }
            let parent = self.tables.get(&target.table).ok_or_else(|| {
                Error::InvalidForeignKey(format!(
                    "column '{}' references unknown table '{}'",
                    col.name, target.table
                ))
            })?;
            let parent_col = parent.get_column(&target.column).ok_or_else(|| {
                Error::InvalidForeignKey(format!(
                    "column '{}' references unknown column {}",
                    col.name, target
                ))
            })?;
            if !parent_col.is_key() {
                return Err(Error::InvalidForeignKey(format!(
                    "{} is neither PRIMARY KEY nor UNIQUE",
                    target
                )));
            }
            if !col.data_type.same_family(&parent_col.data_type) {
                return Err(Error::InvalidForeignKey(format!(
                    "column '{}' is {} but {} is {}",
                    col.name, col.data_type, target, parent_col.data_type
                )));
            }
        }

        Ok(())
    }

    /// Get a table by name
    pub fn get_table(&self, name: &str) -> Result<&TableDef> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Check if a table exists
    pub fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Drop a table and every index on it
    ///
    /// Refused while another table still declares a foreign key to it.
    pub fn drop_table(&mut self, name: &str) -> Result<TableDef> {
        if !self.tables.contains_key(name) {
            return Err(Error::TableNotFound(name.to_string()));
        }
        if let Some(link) = self.referencing(name).into_iter().next() {
            return Err(Error::TableReferenced {
                table: name.to_string(),
                referenced_by: link.child_table,
            });
        }

        self.indexes.retain(|_, idx| idx.table_name != name);
        self.tables
            .shift_remove(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// List all table names in creation order
    pub fn list_tables(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// All foreign keys pointing at `parent`
    pub fn referencing(&self, parent: &str) -> Vec<ForeignKeyLink> {
        let parent_schema = match self.tables.get(parent) {
            Some(t) => t.schema(),
            None => return Vec::new(),
        };

        let mut links = Vec::new();
        for child in self.tables.values() {
            for (col, target) in child.schema().foreign_keys() {
                if target.table != parent {
                    continue;
                }
                if let Some(parent_position) = parent_schema.get_column_index(&target.column) {
                    links.push(ForeignKeyLink {
                        child_table: child.name.clone(),
                        child_column: col.name.clone(),
                        child_position: col.position,
                        parent_column: target.column.clone(),
                        parent_position,
                    });
                }
            }
        }
        links
    }

    /// Create an index
    ///
    /// Returns the index definition and whether it was newly created. Asking
    /// for an index on an already-indexed column hands back the existing one.
    pub fn create_index(
        &mut self,
        name: &str,
        table_name: &str,
        column: &str,
    ) -> Result<(IndexDef, bool)> {
        let table = self.get_table(table_name)?;
        let col: &Column = table
            .get_column(column)
            .ok_or_else(|| Error::ColumnNotFound(column.to_string(), table_name.to_string()))?;
        let position = col.position;

        if let Some(existing) = self.index_on(table_name, column) {
            return Ok((existing.clone(), false));
        }
        if let Some(other) = self.indexes.get(name) {
            return Err(Error::InvalidIndex(format!(
                "index '{}' already exists on {}({})",
                name, other.table_name, other.column
            )));
        }

        let index_def = IndexDef {
            name: name.to_string(),
            table_name: table_name.to_string(),
            column: column.to_string(),
            position,
            id: self.next_index_id,
        };
        self.next_index_id += 1;

        self.indexes.insert(name.to_string(), index_def.clone());
        Ok((index_def, true))
    }

    /// Drop an index
    pub fn drop_index(&mut self, name: &str) -> Result<IndexDef> {
        self.indexes
            .shift_remove(name)
            .ok_or_else(|| Error::InvalidIndex(format!("index '{}' does not exist", name)))
    }

    /// The index covering `table.column`, if any
    pub fn index_on(&self, table_name: &str, column: &str) -> Option<&IndexDef> {
        self.indexes
            .values()
            .find(|idx| idx.table_name == table_name && idx.column == column)
    }

    /// Get all indexes for a table
    pub fn get_table_indexes(&self, table_name: &str) -> Vec<&IndexDef> {
        self.indexes
            .values()
            .filter(|idx| idx.table_name == table_name)
            .collect()
    }

    /// Column-by-column description of a table (DESCRIBE)
    pub fn describe_table(&self, name: &str) -> Result<Vec<ColumnDescription>> {
        let table = self.get_table(name)?;

        Ok(table
            .schema()
            .columns()
            .iter()
            .map(|col| {
                let mut constraints = Vec::new();
                if col.primary_key {
                    constraints.push("PRIMARY KEY".to_string());
                }
                if col.unique {
                    constraints.push("UNIQUE".to_string());
                }
                if let Some(target) = &col.references {
                    constraints.push(format!("REFERENCES {}", target));
                }
                if self.index_on(name, &col.name).is_some() {
                    constraints.push("indexed".to_string());
                }
                ColumnDescription {
                    column: col.name.clone(),
                    data_type: col.data_type,
                    constraints,
                }
            })
            .collect())
    }

    /// Get table schema info as a formatted string (for .schema command)
    pub fn get_table_info(&self, name: &str) -> Result<String> {
        let table = self.get_table(name)?;
        let mut info = format!("Table: {}\n", table.name());
        info.push_str("Columns:\n");

        for desc in self.describe_table(name)? {
            let flags_str = if desc.constraints.is_empty() {
                String::new()
            } else {
                format!(" [{}]", desc.constraints.join(", "))
            };
            info.push_str(&format!("  {} {}{}\n", desc.column, desc.data_type, flags_str));
        }

        let indexes = self.get_table_indexes(name);
        if !indexes.is_empty() {
            info.push_str("Indexes:\n");
            for idx in indexes {
                info.push_str(&format!("  {} ({})\n", idx.name, idx.column));
            }
        }

        Ok(info)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
