//! Observability utilities.

mod tracing;

pub use tracing::{init_logging, LoggingConfig, OperationSpanAttributes, SpanTimer};
