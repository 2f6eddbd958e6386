//! SQL Abstract Syntax Tree (AST)
//!
//! Command descriptors produced by the parser. Identifiers are already
//! case-folded to lowercase when they land here.

use crate::catalog::{DataType, ForeignKeyRef};
use std::fmt;

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE statement
    CreateTable(CreateTableStatement),
    /// DROP TABLE statement
    DropTable(String),
    /// CREATE INDEX statement
    CreateIndex(CreateIndexStatement),
    /// DROP INDEX statement
    DropIndex(String),
    /// SHOW TABLES
    ShowTables,
    /// DESCRIBE table
    Describe(String),
    /// INSERT statement
    Insert(InsertStatement),
    /// SELECT statement
    Select(SelectStatement),
    /// UPDATE statement
    Update(UpdateStatement),
    /// DELETE statement
    Delete(DeleteStatement),
}

impl Statement {
    /// Short name of the statement kind, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::DropTable(_) => "DROP TABLE",
            Statement::CreateIndex(_) => "CREATE INDEX",
            Statement::DropIndex(_) => "DROP INDEX",
            Statement::ShowTables => "SHOW TABLES",
            Statement::Describe(_) => "DESCRIBE",
            Statement::Insert(_) => "INSERT",
            Statement::Select(_) => "SELECT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// Table name
    pub table_name: String,
    /// Column definitions
    pub columns: Vec<ColumnDef>,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// UNIQUE constraint
    pub unique: bool,
    /// FOREIGN KEY REFERENCES target
    pub references: Option<ForeignKeyRef>,
}

/// CREATE INDEX statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateIndexStatement {
    /// Index name
    pub index_name: String,
    /// Table name
    pub table_name: String,
    /// Indexed column
    pub column: String,
}

/// INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    /// Target table name
    pub table_name: String,
    /// Column names (optional)
    pub columns: Option<Vec<String>>,
    /// One literal list per inserted row
    pub rows: Vec<Vec<Literal>>,
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Select list
    pub columns: Vec<SelectItem>,
    /// FROM table
    pub from: String,
    /// Optional equi-join
    pub join: Option<JoinClause>,
    /// WHERE clause
    pub where_clause: Option<Condition>,
}

/// A single item in the SELECT list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// All columns (*)
    Wildcard,
    /// A single column
    Column(ColumnRef),
}

/// `JOIN <table> ON <left> = <right>`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Table to join
    pub table: String,
    /// Left side of the ON equality
    pub left: ColumnRef,
    /// Right side of the ON equality
    pub right: ColumnRef,
}

/// UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    /// Target table name
    pub table_name: String,
    /// SET clause (column = value pairs)
    pub assignments: Vec<Assignment>,
    /// WHERE clause
    pub where_clause: Option<Condition>,
}

/// Column assignment (for UPDATE)
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Column name
    pub column: String,
    /// New value
    pub value: Literal,
}

/// DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    /// Target table name
    pub table_name: String,
    /// WHERE clause
    pub where_clause: Option<Condition>,
}

/// Single-predicate condition: `<column> <op> <literal>`
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: ColumnRef,
    pub op: CompareOp,
    pub value: Literal,
}

/// Column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Table name (optional)
    pub table: Option<String>,
    /// Column name
    pub column: String,
}

impl ColumnRef {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// NULL
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// Float
    Float(f64),
    /// String
    String(String),
}

/// Comparison operator of a WHERE predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Like,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Neq => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::Like => "LIKE",
        };
        f.write_str(s)
    }
}
