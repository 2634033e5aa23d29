//! Assertions for operation results.

use crate::context::ExecutionContext;
use crate::errors::{MailflowError, ViolationReason};
use crate::events::CollectingEventSink;

fn violation_reason<'e>(err: &'e MailflowError, key: &str) -> &'e ViolationReason {
    let Some(violation) = err.as_contract() else {
        panic!("Expected a contract violation on '{key}', got: {err}");
    };
    assert_eq!(
        violation.key, key,
        "Expected violation on '{key}', got one on '{}'",
        violation.key
    );
    &violation.reason
}

/// Asserts a `missing` violation on `key`.
pub fn assert_missing(err: &MailflowError, key: &str) {
    let reason = violation_reason(err, key);
    assert!(
        matches!(reason, ViolationReason::Missing),
        "Expected '{key}' missing, got {reason:?}"
    );
}

/// Asserts a `wrong_type` violation on `key`.
pub fn assert_wrong_type(err: &MailflowError, key: &str) {
    let reason = violation_reason(err, key);
    assert!(
        matches!(reason, ViolationReason::WrongType { .. }),
        "Expected '{key}' of wrong kind, got {reason:?}"
    );
}

/// Asserts a `precondition` violation on `key`.
pub fn assert_precondition(err: &MailflowError, key: &str) {
    let reason = violation_reason(err, key);
    assert!(
        matches!(reason, ViolationReason::Precondition(_)),
        "Expected precondition on '{key}', got {reason:?}"
    );
}

/// Asserts a format error about `subject`.
pub fn assert_format_error(err: &MailflowError, subject: &str) {
    match err {
        MailflowError::Format(format) => assert_eq!(
            format.subject, subject,
            "Expected format error about '{subject}', got: {format}"
        ),
        other => panic!("Expected format error about '{subject}', got: {other}"),
    }
}

/// Asserts that `sink` saw an event of `event_type` from this context's run.
pub fn assert_event_emitted(sink: &CollectingEventSink, ctx: &ExecutionContext, event_type: &str) {
    let run_id = ctx.run_id().to_string();
    let found = sink.events_of_type(event_type).into_iter().any(|(_, data)| {
        data.as_ref()
            .and_then(|d| d.get("run_id"))
            .and_then(|v| v.as_str())
            == Some(run_id.as_str())
    });
    assert!(
        found,
        "Expected event '{event_type}' for run {run_id}. Seen: {:?}",
        sink.event_types()
    );
}
