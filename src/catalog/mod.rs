//! Catalog module
//!
//! This module contains the system catalog, schema definitions, and data types.

pub mod catalog;
pub mod schema;
pub mod types;

pub use catalog::{Catalog, ColumnDescription, ForeignKeyLink};
pub use schema::{Column, ForeignKeyRef, IndexDef, Schema, TableDef};
pub use types::DataType;
