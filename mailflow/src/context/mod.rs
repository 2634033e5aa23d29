//! Execution context for mail pipelines.
//!
//! This module provides:
//! - the tagged [`ContextValue`] variants and their [`ValueKind`] tags
//! - the mutable [`ExecutionContext`] blackboard
//! - the [`keys`] namespace shared by all operations

mod execution;
pub mod keys;
mod value;

pub use execution::ExecutionContext;
pub use value::{ContextType, ContextValue, ValueKind};
