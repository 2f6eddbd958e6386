//! Storage engine module
//!
//! This module contains the in-memory storage components:
//! - Values and tuples
//! - Row store keyed by row id
//! - Hash indexes for equality lookups

pub mod index;
pub mod table;
pub mod value;

pub use index::HashIndex;
pub use table::{RowId, Table};
pub use value::{Tuple, Value};
