//! minirel - a small in-memory relational engine
//!
//! This library provides:
//! - SQL parsing (lexer, parser, AST)
//! - System catalog with PRIMARY KEY, UNIQUE and FOREIGN KEY constraints
//! - In-memory row storage with per-column hash indexes
//! - Query execution (planner, constraint enforcement, executor)
//!
//! ```
//! use minirel::Database;
//!
//! let mut db = Database::new();
//! db.execute("CREATE TABLE t (id INT PRIMARY KEY, name VARCHAR)").unwrap();
//! db.execute("INSERT INTO t VALUES (1, 'a')").unwrap();
//! let result = db.execute("SELECT * FROM t WHERE id = 1").unwrap();
//! assert_eq!(result.rows().len(), 1);
//! ```

pub mod catalog;
pub mod database;
pub mod error;
pub mod executor;
pub mod sql;
pub mod storage;

pub use database::Database;
pub use error::{Error, ErrorKind, Result};
pub use executor::{QueryResult, Row};
pub use storage::Value;
