//! Query execution module
//!
//! This module contains the planner, predicate evaluation, constraint
//! enforcement and the executor.

pub mod constraints;
pub mod executor;
pub mod filter;
pub mod planner;

pub use constraints::ConstraintEnforcer;
pub use executor::{ExecutionEngine, QueryResult, Row};
pub use filter::Predicate;
pub use planner::{LogicalPlan, Planner};
