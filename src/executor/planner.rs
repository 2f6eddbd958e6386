//! Query Planner for minirel
//!
//! This module validates parsed statements against the catalog and turns
//! them into executable plans: names are resolved to column positions and
//! literals are converted to typed values. Nothing here touches row data.

use super::filter::{literal_type, Predicate};
use crate::catalog::{Catalog, Column, DataType, Schema, TableDef};
use crate::error::{Error, Result};
use crate::sql::ast::*;
use crate::storage::{Tuple, Value};
use std::collections::HashSet;

/// Logical plan node
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalPlan {
    /// Create table
    CreateTable { table_name: String, schema: Schema },
    /// Drop table
    DropTable { table_name: String },
    /// Create index
    CreateIndex {
        index_name: String,
        table_name: String,
        column: String,
    },
    /// Drop index
    DropIndex { index_name: String },
    /// List tables
    ShowTables,
    /// Describe a table
    Describe { table_name: String },
    /// Insert fully-typed rows
    Insert { table_name: String, rows: Vec<Tuple> },
    /// Select rows
    Select(SelectPlan),
    /// Update table
    Update {
        table_name: String,
        assignments: Vec<(usize, Value)>,
        predicate: Option<Predicate>,
    },
    /// Delete from table
    Delete {
        table_name: String,
        predicate: Option<Predicate>,
    },
}

impl LogicalPlan {
    /// Short name of the plan kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            LogicalPlan::CreateTable { .. } => "create_table",
            LogicalPlan::DropTable { .. } => "drop_table",
            LogicalPlan::CreateIndex { .. } => "create_index",
            LogicalPlan::DropIndex { .. } => "drop_index",
            LogicalPlan::ShowTables => "show_tables",
            LogicalPlan::Describe { .. } => "describe",
            LogicalPlan::Insert { .. } => "insert",
            LogicalPlan::Select(_) => "select",
            LogicalPlan::Update { .. } => "update",
            LogicalPlan::Delete { .. } => "delete",
        }
    }
}

/// A resolved SELECT
///
/// Column positions refer to the row being produced: the table's own row,
/// or for a join the left row followed by the right row.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPlan {
    /// FROM table
    pub table_name: String,
    /// Optional equi-join
    pub join: Option<JoinPlan>,
    /// WHERE predicate
    pub predicate: Option<Predicate>,
    /// Positions of the projected columns
    pub projection: Vec<usize>,
    /// Output column names
    pub columns: Vec<String>,
}

/// Equi-join of the FROM table (left) with another table (right)
#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    /// Right table
    pub table_name: String,
    /// Join column position in the left table
    pub left_column: usize,
    /// Join column position in the right table
    pub right_column: usize,
    /// Declared type of the right join column
    pub right_type: DataType,
    /// Number of columns in the left table
    pub left_width: usize,
}

/// Tables visible to a statement, with each table's offset in the produced row
struct Scope<'a> {
    tables: Vec<(&'a TableDef, usize)>,
}

impl<'a> Scope<'a> {
    fn single(table: &'a TableDef) -> Self {
        Self {
            tables: vec![(table, 0)],
        }
    }

    fn joined(left: &'a TableDef, right: &'a TableDef) -> Self {
        let width = left.schema().column_count();
        Self {
            tables: vec![(left, 0), (right, width)],
        }
    }

    fn is_join(&self) -> bool {
        self.tables.len() > 1
    }

    fn table_names(&self) -> String {
        self.tables
            .iter()
            .map(|(t, _)| t.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Resolve a column reference to (table, column, position in produced row)
    fn resolve(&self, col_ref: &ColumnRef) -> Result<(&'a TableDef, &'a Column, usize)> {
        let mut found = None;
        for &(table, offset) in &self.tables {
            if let Some(t) = &col_ref.table {
                if t != table.name() {
                    continue;
                }
            }
            if let Some(col) = table.get_column(&col_ref.column) {
                if found.is_some() {
                    return Err(Error::AmbiguousColumn(col_ref.to_string()));
                }
                found = Some((table, col, offset + col.position));
            }
        }
        found.ok_or_else(|| Error::ColumnNotFound(col_ref.to_string(), self.table_names()))
    }

    /// Output name of a column: bare for one table, `table.column` for a join
    fn output_name(&self, table: &TableDef, column: &Column) -> String {
        if self.is_join() {
            format!("{}.{}", table.name(), column.name)
        } else {
            column.name.clone()
        }
    }
}

/// Query planner
pub struct Planner<'a> {
    catalog: &'a Catalog,
}

impl<'a> Planner<'a> {
    /// Create a new planner
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Plan a statement
    pub fn plan(&self, stmt: Statement) -> Result<LogicalPlan> {
        match stmt {
            Statement::Select(select) => self.plan_select(select),
            Statement::Insert(insert) => self.plan_insert(insert),
            Statement::Update(update) => self.plan_update(update),
            Statement::Delete(delete) => self.plan_delete(delete),
            Statement::CreateTable(create) => Ok(self.plan_create_table(create)),
            Statement::DropTable(table_name) => Ok(LogicalPlan::DropTable { table_name }),
            Statement::CreateIndex(create) => Ok(LogicalPlan::CreateIndex {
                index_name: create.index_name,
                table_name: create.table_name,
                column: create.column,
            }),
            Statement::DropIndex(index_name) => Ok(LogicalPlan::DropIndex { index_name }),
            Statement::ShowTables => Ok(LogicalPlan::ShowTables),
            Statement::Describe(table_name) => Ok(LogicalPlan::Describe { table_name }),
        }
    }

    fn plan_create_table(&self, create: CreateTableStatement) -> LogicalPlan {
        let columns = create
            .columns
            .into_iter()
            .enumerate()
            .map(|(i, def)| {
                Column::new(def.name, def.data_type, i)
                    .primary_key(def.primary_key)
                    .unique(def.unique)
                    .references(def.references)
            })
            .collect();

        LogicalPlan::CreateTable {
            table_name: create.table_name,
            schema: Schema::from_columns(columns),
        }
    }

    fn plan_select(&self, select: SelectStatement) -> Result<LogicalPlan> {
        let left = self.catalog.get_table(&select.from)?;

        let (scope, join) = match &select.join {
            None => (Scope::single(left), None),
            Some(join) => {
                let right = self.catalog.get_table(&join.table)?;
                if right.name() == left.name() {
                    return Err(Error::ParseError(format!(
                        "cannot join table '{}' with itself",
                        left.name()
                    )));
                }
                let scope = Scope::joined(left, right);
                let plan = self.plan_join(&scope, join)?;
                (scope, Some(plan))
            }
        };

        let predicate = select
            .where_clause
            .as_ref()
            .map(|cond| self.bind_condition(&scope, cond))
            .transpose()?;

        let mut projection = Vec::new();
        let mut columns = Vec::new();
        for item in &select.columns {
            match item {
                SelectItem::Wildcard => {
                    for &(table, offset) in &scope.tables {
                        for col in table.schema().columns() {
                            projection.push(offset + col.position);
                            columns.push(scope.output_name(table, col));
                        }
                    }
                }
                SelectItem::Column(col_ref) => {
                    let (table, col, position) = scope.resolve(col_ref)?;
                    projection.push(position);
                    columns.push(scope.output_name(table, col));
                }
            }
        }

        Ok(LogicalPlan::Select(SelectPlan {
            table_name: left.name().to_string(),
            join,
            predicate,
            projection,
            columns: distinct_output_names(columns),
        }))
    }

    /// The ON equality may name the two tables in either order
    fn plan_join(&self, scope: &Scope<'_>, join: &JoinClause) -> Result<JoinPlan> {
        let (left, _) = scope.tables[0];
        let (right, left_width) = scope.tables[1];

        let (a_table, a_col, _) = scope.resolve(&join.left)?;
        let (b_table, b_col, _) = scope.resolve(&join.right)?;
        let (left_col, right_col) = match (a_table.name() == left.name(), b_table.name() == left.name()) {
            (true, false) => (a_col, b_col),
            (false, true) => (b_col, a_col),
            _ => {
                return Err(Error::ParseError(format!(
                    "join condition must compare a column of '{}' with a column of '{}'",
                    left.name(),
                    right.name()
                )))
            }
        };

        if !left_col.data_type.is_comparable_with(&right_col.data_type) {
            return Err(Error::IncomparableTypes {
                left: left_col.data_type.to_string(),
                right: right_col.data_type.to_string(),
            });
        }

        Ok(JoinPlan {
            table_name: right.name().to_string(),
            left_column: left_col.position,
            right_column: right_col.position,
            right_type: right_col.data_type,
            left_width,
        })
    }

    fn bind_condition(&self, scope: &Scope<'_>, cond: &Condition) -> Result<Predicate> {
        let (_, col, position) = scope.resolve(&cond.column)?;
        Predicate::bind(&col.name, col.data_type, position, cond.op, &cond.value)
    }

    fn plan_insert(&self, insert: InsertStatement) -> Result<LogicalPlan> {
        let table = self.catalog.get_table(&insert.table_name)?;
        let schema = table.schema();

        // Target position for each supplied value
        let targets: Vec<&Column> = match &insert.columns {
            Some(names) => {
                let mut cols: Vec<&Column> = Vec::with_capacity(names.len());
                for name in names {
                    let col = schema.get_column(name).ok_or_else(|| {
                        Error::ColumnNotFound(name.clone(), table.name().to_string())
                    })?;
                    if cols.iter().any(|c| c.position == col.position) {
                        return Err(Error::ParseError(format!(
                            "column '{}' listed twice in INSERT",
                            name
                        )));
                    }
                    cols.push(col);
                }
                cols
            }
            None => schema.columns().iter().collect(),
        };

        let mut rows = Vec::with_capacity(insert.rows.len());
        for literals in &insert.rows {
            if literals.len() != targets.len() {
                return Err(Error::ArityMismatch {
                    table: table.name().to_string(),
                    expected: targets.len(),
                    found: literals.len(),
                });
            }
            let mut values = vec![Value::Null; schema.column_count()];
            for (col, literal) in targets.iter().zip(literals) {
                values[col.position] = coerce_literal(col, literal)?;
            }
            rows.push(Tuple::new(values));
        }

        Ok(LogicalPlan::Insert {
            table_name: table.name().to_string(),
            rows,
        })
    }

    fn plan_update(&self, update: UpdateStatement) -> Result<LogicalPlan> {
        let table = self.catalog.get_table(&update.table_name)?;

        let mut assignments: Vec<(usize, Value)> = Vec::with_capacity(update.assignments.len());
        for assignment in &update.assignments {
            let col = table.get_column(&assignment.column).ok_or_else(|| {
                Error::ColumnNotFound(assignment.column.clone(), table.name().to_string())
            })?;
            if assignments.iter().any(|(pos, _)| *pos == col.position) {
                return Err(Error::ParseError(format!(
                    "column '{}' assigned twice in UPDATE",
                    col.name
                )));
            }
            assignments.push((col.position, coerce_literal(col, &assignment.value)?));
        }

        let scope = Scope::single(table);
        let predicate = update
            .where_clause
            .as_ref()
            .map(|cond| self.bind_condition(&scope, cond))
            .transpose()?;

        Ok(LogicalPlan::Update {
            table_name: table.name().to_string(),
            assignments,
            predicate,
        })
    }

    fn plan_delete(&self, delete: DeleteStatement) -> Result<LogicalPlan> {
        let table = self.catalog.get_table(&delete.table_name)?;
        let scope = Scope::single(table);
        let predicate = delete
            .where_clause
            .as_ref()
            .map(|cond| self.bind_condition(&scope, cond))
            .transpose()?;

        Ok(LogicalPlan::Delete {
            table_name: table.name().to_string(),
            predicate,
        })
    }
}

/// Suffix repeated output names (`id`, `id_2`, ...) so every projected
/// column keeps its own key in a result row
fn distinct_output_names(columns: Vec<String>) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(columns.len());
    let mut out = Vec::with_capacity(columns.len());
    for name in columns {
        let mut candidate = name.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{}_{}", name, n);
            n += 1;
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

/// Convert a literal into the value a column stores
///
/// INT literals widen into FLOAT columns; every other pairing must match
/// exactly. NULL is accepted here and rejected for key columns by the
/// constraint checks.
pub fn coerce_literal(column: &Column, literal: &Literal) -> Result<Value> {
    let value = match (literal, column.data_type) {
        (Literal::Null, _) => Value::Null,
        (Literal::Integer(i), DataType::Int) => Value::Int(*i),
        (Literal::Integer(i), DataType::Float) => Value::Float(*i as f64),
        (Literal::Float(f), DataType::Float) => Value::Float(*f),
        (Literal::Boolean(b), DataType::Bool) => Value::Bool(*b),
        (Literal::String(s), DataType::Varchar(limit)) => {
            if let Some(max) = limit {
                if s.chars().count() > max {
                    return Err(Error::ValueTooLong(column.name.clone(), max));
                }
            }
            Value::Text(s.clone())
        }
        (lit, ty) => {
            return Err(Error::TypeMismatch {
                column: column.name.clone(),
                expected: ty.to_string(),
                found: literal_type(lit).to_string(),
            })
        }
    };
    Ok(value)
}
