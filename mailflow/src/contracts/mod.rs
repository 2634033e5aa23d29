//! Operation contracts.
//!
//! This module provides:
//! - [`Contract`]: required, optional and output keys with their kinds
//! - [`ContractRegistry`]: operation contracts rendered as JSON

mod contract;
mod registry;

pub use contract::{Contract, KeySpec};
pub use registry::ContractRegistry;
