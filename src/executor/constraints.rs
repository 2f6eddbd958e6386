//! Constraint enforcement
//!
//! Every check here is read-only. The executor asks the enforcer to approve a
//! whole batch of candidate rows (or compute a whole cascade) before it applies
//! a single change, so a failing statement leaves no trace.

use crate::catalog::{Catalog, ForeignKeyLink};
use crate::error::{Error, Result};
use crate::storage::{RowId, Table, Tuple, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Read-only view over the catalog and row store used to validate mutations
pub struct ConstraintEnforcer<'a> {
    catalog: &'a Catalog,
    tables: &'a HashMap<String, Table>,
}

impl<'a> ConstraintEnforcer<'a> {
    pub fn new(catalog: &'a Catalog, tables: &'a HashMap<String, Table>) -> Self {
        Self { catalog, tables }
    }

    fn table(&self, name: &str) -> Result<&'a Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Validate rows about to be inserted
    pub fn check_insert(&self, table_name: &str, rows: &[Tuple]) -> Result<()> {
        let candidates: Vec<&Tuple> = rows.iter().collect();
        self.check_rows(table_name, &candidates, &HashSet::new())
    }

    /// Validate replacement rows for an UPDATE
    ///
    /// The rows being replaced do not count as conflicts. A referenced key
    /// value may not disappear while child rows still point at it.
    pub fn check_update(&self, table_name: &str, changes: &[(RowId, Tuple)]) -> Result<()> {
        let replaced: HashSet<RowId> = changes.iter().map(|(id, _)| *id).collect();
        let candidates: Vec<&Tuple> = changes.iter().map(|(_, t)| t).collect();
        self.check_rows(table_name, &candidates, &replaced)?;

        let table = self.table(table_name)?;
        for link in self.catalog.referencing(table_name) {
            let child = self.table(&link.child_table)?;
            for (row_id, new) in changes {
                let Some(old_value) = table.get(*row_id).and_then(|t| t.get(link.parent_position))
                else {
                    continue;
                };
                if old_value.is_null() || new.get(link.parent_position) == Some(old_value) {
                    continue;
                }
                let still_held = candidates
                    .iter()
                    .any(|t| t.get(link.parent_position) == Some(old_value));
                if !still_held && contains(child, link.child_position, old_value, &HashSet::new()) {
                    return Err(Error::ForeignKeyViolation(format!(
                        "cannot change {}.{} from {}: still referenced by {}.{}",
                        table_name, link.parent_column, old_value, link.child_table, link.child_column
                    )));
                }
            }
        }
        Ok(())
    }

    /// PRIMARY KEY, UNIQUE and FOREIGN KEY checks for a batch of candidate rows
    fn check_rows(
        &self,
        table_name: &str,
        candidates: &[&Tuple],
        replaced: &HashSet<RowId>,
    ) -> Result<()> {
        let def = self.catalog.get_table(table_name)?;
        let table = self.table(table_name)?;

        for col in def.schema().columns() {
            if col.primary_key && candidates.iter().any(|t| is_null_at(t, col.position)) {
                return Err(Error::NullNotAllowed(col.name.clone()));
            }
            if !col.is_key() {
                continue;
            }

            let mut seen: HashSet<&Value> = HashSet::new();
            for tuple in candidates {
                let Some(value) = tuple.get(col.position).filter(|v| !v.is_null()) else {
                    continue;
                };
                if !seen.insert(value) || contains(table, col.position, value, replaced) {
                    let (table, column, value) =
                        (table_name.to_string(), col.name.clone(), value.to_string());
                    return Err(if col.primary_key {
                        Error::DuplicateKey {
                            table,
                            column,
                            value,
                        }
                    } else {
                        Error::UniqueViolation {
                            table,
                            column,
                            value,
                        }
                    });
                }
            }
        }

        for (col, target) in def.schema().foreign_keys() {
            let parent = self.table(&target.table)?;
            let parent_position = parent.schema().get_column_index(&target.column).ok_or_else(
                || Error::ColumnNotFound(target.column.clone(), target.table.clone()),
            )?;

            for tuple in candidates {
                let Some(value) = tuple.get(col.position).filter(|v| !v.is_null()) else {
                    continue;
                };
                if !contains(parent, parent_position, value, &HashSet::new()) {
                    return Err(Error::ForeignKeyViolation(format!(
                        "{}.{} = {} has no matching row in {}",
                        table_name, col.name, value, target
                    )));
                }
            }
        }

        Ok(())
    }

    /// Every row a DELETE of `row_ids` removes, following foreign keys
    /// transitively
    ///
    /// The starting rows come first, then descendants in breadth-first order.
    /// Each row appears once.
    pub fn cascade_set(&self, table_name: &str, row_ids: &[RowId]) -> Result<Vec<(String, RowId)>> {
        let mut links: HashMap<String, Vec<ForeignKeyLink>> = HashMap::new();
        let mut seen: HashSet<(String, RowId)> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        for &row_id in row_ids {
            if seen.insert((table_name.to_string(), row_id)) {
                order.push((table_name.to_string(), row_id));
                queue.push_back((table_name.to_string(), row_id));
            }
        }

        while let Some((parent_name, row_id)) = queue.pop_front() {
            let parent = self.table(&parent_name)?;
            let Some(tuple) = parent.get(row_id) else {
                continue;
            };

            let parent_links = links
                .entry(parent_name.clone())
                .or_insert_with(|| self.catalog.referencing(&parent_name));

            for link in parent_links.iter() {
                let Some(key) = tuple.get(link.parent_position).filter(|v| !v.is_null()) else {
                    continue;
                };
                let child = self.table(&link.child_table)?;
                for child_id in rows_with(child, link.child_position, key) {
                    let entry = (link.child_table.clone(), child_id);
                    if seen.insert(entry.clone()) {
                        order.push(entry.clone());
                        queue.push_back(entry);
                    }
                }
            }
        }

        let cascaded = order.len() - row_ids.len().min(order.len());
        if cascaded > 0 {
            debug!(table = table_name, cascaded, "cascade delete");
        }
        Ok(order)
    }
}

fn is_null_at(tuple: &Tuple, position: usize) -> bool {
    tuple.get(position).map_or(true, Value::is_null)
}

/// Row ids in `table` whose column at `position` equals `value`
fn rows_with(table: &Table, position: usize, value: &Value) -> Vec<RowId> {
    match table.lookup_equal(position, value) {
        Some(ids) => ids,
        None => table
            .scan()
            .filter(|(_, t)| t.get(position) == Some(value))
            .map(|(id, _)| id)
            .collect(),
    }
}

/// Whether any row outside `excluded` holds `value` at `position`
fn contains(table: &Table, position: usize, value: &Value, excluded: &HashSet<RowId>) -> bool {
    rows_with(table, position, value)
        .iter()
        .any(|id| !excluded.contains(id))
}
