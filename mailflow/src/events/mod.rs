//! Event sinks for observability.
//!
//! Every [`ExecutionContext`](crate::context::ExecutionContext) carries one
//! sink; pipelines and operations report lifecycle events through it.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by this crate.
pub mod names {
    /// A pipeline run began.
    pub const PIPELINE_STARTED: &str = "pipeline.started";
    /// A pipeline run finished successfully.
    pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
    /// A pipeline run aborted.
    pub const PIPELINE_FAILED: &str = "pipeline.failed";
    /// An operation inside a pipeline finished successfully.
    pub const OPERATION_COMPLETED: &str = "operation.completed";
    /// An operation inside a pipeline failed.
    pub const OPERATION_FAILED: &str = "operation.failed";
    /// An HTML replace was requested and skipped.
    pub const HTML_REPLACE_UNSUPPORTED: &str = "body_text.html_replace_unsupported";
}
