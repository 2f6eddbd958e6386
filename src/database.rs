//! Engine entry point
//!
//! A [`Database`] owns one catalog and row store. Commands run one at a time
//! to completion; a host that shares a `Database` across threads must wrap it
//! in its own lock.

use crate::catalog::Catalog;
use crate::error::Result;
use crate::executor::{ExecutionEngine, QueryResult};
use crate::sql;
use crate::storage::Table;
use tracing::{debug, debug_span};

/// An in-memory database instance
#[derive(Debug, Default)]
pub struct Database {
    engine: ExecutionEngine,
}

impl Database {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse, validate and execute one command
    ///
    /// Either the command takes full effect or the database is left exactly
    /// as it was and the error is returned.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let stmt = sql::parse(sql)?;
        let _span = debug_span!("statement", kind = stmt.kind()).entered();

        let result = self.engine.execute(stmt);
        if let Err(e) = &result {
            debug!(kind = %e.kind(), error = %e, "statement rejected");
        }
        result
    }

    /// System catalog
    pub fn catalog(&self) -> &Catalog {
        self.engine.catalog()
    }

    /// Row storage of a table
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.engine.table(name)
    }

    /// Names of all tables, in creation order
    pub fn table_names(&self) -> Vec<String> {
        self.catalog().list_tables()
    }
}
