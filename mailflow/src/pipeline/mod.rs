//! Operations and pipelines.
//!
//! This module provides:
//! - the [`Operation`] trait with contract-checked `execute` and `and_then`
//! - [`FnOperation`] for closure-backed operations
//! - [`Pipeline`], an ordered runner with events, timings and wiring checks

mod operation;
mod runner;

pub use operation::{AndThen, FnOperation, Operation};
pub use runner::{Pipeline, PipelineBuilder};
