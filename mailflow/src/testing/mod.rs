//! Testing utilities for mailflow pipelines.
//!
//! This module provides:
//! - Sample messages and contexts
//! - Recording and failing operations
//! - Assertions for contract violations and events

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{
    assert_event_emitted, assert_format_error, assert_missing, assert_precondition,
    assert_wrong_type,
};
pub use fixtures::{context_with_message, message};
pub use mocks::{FailingOperation, RecordingOperation, SetValue};
