//! Query Executor for minirel
//!
//! This module executes logical plans against the catalog and row store and
//! returns results.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::constraints::ConstraintEnforcer;
use super::filter::{index_key_for, Predicate};
use super::planner::{JoinPlan, LogicalPlan, Planner, SelectPlan};
use crate::catalog::{Catalog, Schema};
use crate::error::{Error, Result};
use crate::sql::ast::Statement;
use crate::storage::{RowId, Table, Tuple, Value};

/// A result row: column name to value, in column order
pub type Row = IndexMap<String, Value>;

/// Query result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    /// Rows produced by SELECT, SHOW TABLES or DESCRIBE
    Rows { columns: Vec<String>, rows: Vec<Row> },
    /// Number of rows changed by INSERT, UPDATE or DELETE
    Affected { count: usize, message: String },
    /// Acknowledgement of a schema change
    Ack { message: String },
}

impl QueryResult {
    /// Create a result with a message
    pub fn with_message(message: impl Into<String>) -> Self {
        QueryResult::Ack {
            message: message.into(),
        }
    }

    /// Create a result with affected rows count
    pub fn with_affected_rows(count: usize, message: impl Into<String>) -> Self {
        QueryResult::Affected {
            count,
            message: message.into(),
        }
    }

    /// Create a row result from tuples laid out like `columns`
    pub fn from_tuples(columns: Vec<String>, tuples: Vec<Tuple>) -> Self {
        let rows = tuples
            .into_iter()
            .map(|tuple| columns.iter().cloned().zip(tuple.into_values()).collect())
            .collect();
        QueryResult::Rows { columns, rows }
    }

    /// Column names (empty unless this is a row result)
    pub fn columns(&self) -> &[String] {
        match self {
            QueryResult::Rows { columns, .. } => columns,
            _ => &[],
        }
    }

    /// Result rows (empty unless this is a row result)
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Rows { rows, .. } => rows,
            _ => &[],
        }
    }

    /// Number of affected rows, for INSERT/UPDATE/DELETE
    pub fn affected_rows(&self) -> Option<usize> {
        match self {
            QueryResult::Affected { count, .. } => Some(*count),
            _ => None,
        }
    }

    /// Message
    pub fn message(&self) -> Option<&str> {
        match self {
            QueryResult::Affected { message, .. } | QueryResult::Ack { message } => Some(message),
            QueryResult::Rows { .. } => None,
        }
    }
}

/// Execution Engine
#[derive(Debug, Default)]
pub struct ExecutionEngine {
    /// System catalog
    catalog: Catalog,
    /// Table storage (table_name -> Table)
    tables: HashMap<String, Table>,
}

impl ExecutionEngine {
    /// Create a new execution engine
    pub fn new() -> Self {
        Self::default()
    }

    /// System catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get table storage by name
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Validate and execute a parsed statement
    pub fn execute(&mut self, stmt: Statement) -> Result<QueryResult> {
        let plan = Planner::new(&self.catalog).plan(stmt)?;
        self.execute_plan(plan)
    }

    /// Execute a logical plan
    pub fn execute_plan(&mut self, plan: LogicalPlan) -> Result<QueryResult> {
        debug!(plan = plan.kind(), "executing");

        match plan {
            LogicalPlan::CreateTable { table_name, schema } => {
                self.execute_create_table(&table_name, schema)
            }
            LogicalPlan::DropTable { table_name } => self.execute_drop_table(&table_name),
            LogicalPlan::CreateIndex {
                index_name,
                table_name,
                column,
            } => self.execute_create_index(&index_name, &table_name, &column),
            LogicalPlan::DropIndex { index_name } => self.execute_drop_index(&index_name),
            LogicalPlan::ShowTables => Ok(self.execute_show_tables()),
            LogicalPlan::Describe { table_name } => self.execute_describe(&table_name),
            LogicalPlan::Insert { table_name, rows } => self.execute_insert(&table_name, rows),
            LogicalPlan::Select(select) => self.execute_select(select),
            LogicalPlan::Update {
                table_name,
                assignments,
                predicate,
            } => self.execute_update(&table_name, &assignments, predicate.as_ref()),
            LogicalPlan::Delete {
                table_name,
                predicate,
            } => self.execute_delete(&table_name, predicate.as_ref()),
        }
    }

    fn execute_create_table(&mut self, table_name: &str, schema: Schema) -> Result<QueryResult> {
        let table_def = self.catalog.create_table(table_name, schema)?.clone();
        self.tables
            .insert(table_name.to_string(), Table::new(table_def));

        Ok(QueryResult::with_message(format!(
            "Table '{}' created",
            table_name
        )))
    }

    fn execute_drop_table(&mut self, table_name: &str) -> Result<QueryResult> {
        self.catalog.drop_table(table_name)?;
        self.tables.remove(table_name);

        Ok(QueryResult::with_message(format!(
            "Table '{}' dropped",
            table_name
        )))
    }

    fn execute_create_index(
        &mut self,
        index_name: &str,
        table_name: &str,
        column: &str,
    ) -> Result<QueryResult> {
        let (index_def, created) = self.catalog.create_index(index_name, table_name, column)?;
        if !created {
            return Ok(QueryResult::with_message(format!(
                "Index '{}' already exists on {}({})",
                index_def.name, table_name, column
            )));
        }

        let table = self.table_mut(table_name)?;
        table.create_index(&index_def.name, &index_def.column)?;
        debug!(index = index_name, rows = table.len(), "index built");

        Ok(QueryResult::with_message(format!(
            "Index '{}' created on {}({})",
            index_name, table_name, column
        )))
    }

    fn execute_drop_index(&mut self, index_name: &str) -> Result<QueryResult> {
        let index_def = self.catalog.drop_index(index_name)?;
        if let Some(table) = self.tables.get_mut(&index_def.table_name) {
            table.drop_index(index_name);
        }

        Ok(QueryResult::with_message(format!(
            "Index '{}' dropped",
            index_name
        )))
    }

    fn execute_show_tables(&self) -> QueryResult {
        let tuples = self
            .catalog
            .list_tables()
            .into_iter()
            .map(|name| {
                let count = self.tables.get(&name).map_or(0, Table::len);
                Tuple::new(vec![Value::Text(name), Value::Int(count as i64)])
            })
            .collect();

        QueryResult::from_tuples(vec!["table".to_string(), "rows".to_string()], tuples)
    }

    fn execute_describe(&self, table_name: &str) -> Result<QueryResult> {
        let tuples = self
            .catalog
            .describe_table(table_name)?
            .into_iter()
            .map(|desc| {
                Tuple::new(vec![
                    Value::Text(desc.column),
                    Value::Text(desc.data_type.to_string()),
                    Value::Text(desc.constraints.join(", ")),
                ])
            })
            .collect();

        Ok(QueryResult::from_tuples(
            vec![
                "column".to_string(),
                "type".to_string(),
                "constraints".to_string(),
            ],
            tuples,
        ))
    }

    fn execute_insert(&mut self, table_name: &str, rows: Vec<Tuple>) -> Result<QueryResult> {
        ConstraintEnforcer::new(&self.catalog, &self.tables).check_insert(table_name, &rows)?;

        let table = self.table_mut(table_name)?;
        let inserted = rows.len();
        for tuple in rows {
            table.insert(tuple)?;
        }

        Ok(QueryResult::with_affected_rows(
            inserted,
            format!("{} row(s) inserted", inserted),
        ))
    }

    /// Rows of `table` satisfying `predicate`, through an index when possible
    fn matching_rows(table: &Table, predicate: Option<&Predicate>) -> Vec<RowId> {
        let Some(predicate) = predicate else {
            return table.scan().map(|(id, _)| id).collect();
        };

        if let Some(key) = predicate.index_key() {
            if let Some(ids) = table.lookup_equal(predicate.position, &key) {
                debug!(table = table.name(), matches = ids.len(), "index lookup");
                return ids;
            }
        }

        debug!(table = table.name(), "full scan");
        table
            .scan()
            .filter(|(_, tuple)| predicate.matches(tuple))
            .map(|(id, _)| id)
            .collect()
    }

    fn execute_select(&self, plan: SelectPlan) -> Result<QueryResult> {
        let left = self.table(&plan.table_name)?;

        let rows: Vec<Tuple> = match &plan.join {
            None => Self::matching_rows(left, plan.predicate.as_ref())
                .into_iter()
                .filter_map(|id| left.get(id).cloned())
                .collect(),
            Some(join) => self.execute_join(left, join, plan.predicate.as_ref())?,
        };

        let projected = rows
            .iter()
            .map(|tuple| tuple.project(&plan.projection))
            .collect();
        Ok(QueryResult::from_tuples(plan.columns, projected))
    }

    /// Nested-loop equi-join, probing the right table's index on the join
    /// column when it has one
    ///
    /// An index-usable WHERE equality narrows its own side before the loop;
    /// the full predicate is still applied to every joined row.
    fn execute_join(
        &self,
        left: &Table,
        join: &JoinPlan,
        predicate: Option<&Predicate>,
    ) -> Result<Vec<Tuple>> {
        let right = self.table(&join.table_name)?;

        let mut left_ids: Option<Vec<RowId>> = None;
        let mut right_allowed: Option<HashSet<RowId>> = None;
        if let Some(p) = predicate {
            if p.position < join.left_width {
                if p.index_key().is_some() && left.index_for_column(p.position).is_some() {
                    left_ids = Some(Self::matching_rows(left, Some(p)));
                }
            } else {
                let local = p.at(p.position - join.left_width);
                if local.index_key().is_some() && right.index_for_column(local.position).is_some() {
                    right_allowed = Some(Self::matching_rows(right, Some(&local)).into_iter().collect());
                }
            }
        }
        let left_ids = left_ids.unwrap_or_else(|| left.scan().map(|(id, _)| id).collect());

        let right_indexed = right.index_for_column(join.right_column).is_some();
        debug!(
            left = left.name(),
            right = right.name(),
            right_indexed,
            "join"
        );

        let mut result = Vec::new();
        for left_id in left_ids {
            let Some(left_row) = left.get(left_id) else {
                continue;
            };
            let Some(key) = left_row.get(join.left_column).filter(|v| !v.is_null()) else {
                continue;
            };

            let probe = index_key_for(key, &join.right_type)
                .and_then(|k| right.lookup_equal(join.right_column, &k));
            let right_ids = match probe {
                Some(ids) => ids,
                None => right
                    .scan()
                    .filter(|(_, t)| {
                        t.get(join.right_column)
                            .and_then(|v| v.compare(key))
                            .is_some_and(|o| o.is_eq())
                    })
                    .map(|(id, _)| id)
                    .collect(),
            };

            for right_id in right_ids {
                if right_allowed.as_ref().is_some_and(|s| !s.contains(&right_id)) {
                    continue;
                }
                let Some(right_row) = right.get(right_id) else {
                    continue;
                };
                let joined = left_row.concat(right_row);
                if predicate.map_or(true, |p| p.matches(&joined)) {
                    result.push(joined);
                }
            }
        }

        Ok(result)
    }

    fn execute_update(
        &mut self,
        table_name: &str,
        assignments: &[(usize, Value)],
        predicate: Option<&Predicate>,
    ) -> Result<QueryResult> {
        let table = self.table(table_name)?;

        let mut changes = Vec::new();
        for row_id in Self::matching_rows(table, predicate) {
            if let Some(old) = table.get(row_id) {
                let mut new = old.clone();
                for (position, value) in assignments {
                    new.set(*position, value.clone());
                }
                changes.push((row_id, new));
            }
        }

        ConstraintEnforcer::new(&self.catalog, &self.tables).check_update(table_name, &changes)?;

        let updated = changes.len();
        let table = self.table_mut(table_name)?;
        for (row_id, tuple) in changes {
            table.update(row_id, tuple)?;
        }

        Ok(QueryResult::with_affected_rows(
            updated,
            format!("{} row(s) updated", updated),
        ))
    }

    fn execute_delete(
        &mut self,
        table_name: &str,
        predicate: Option<&Predicate>,
    ) -> Result<QueryResult> {
        let targets = Self::matching_rows(self.table(table_name)?, predicate);
        let doomed = ConstraintEnforcer::new(&self.catalog, &self.tables)
            .cascade_set(table_name, &targets)?;

        for (name, row_id) in &doomed {
            self.table_mut(name)?.delete(*row_id);
        }

        let deleted = targets.len();
        let cascaded = doomed.len() - deleted;
        let message = if cascaded > 0 {
            format!("{} row(s) deleted, {} cascaded", deleted, cascaded)
        } else {
            format!("{} row(s) deleted", deleted)
        };
        Ok(QueryResult::with_affected_rows(deleted, message))
    }
}
