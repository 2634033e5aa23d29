//! Error types for mailflow operations.
//!
//! Three families matter to callers: contract violations (bad or missing
//! context keys, raised before any side effect), format errors (input that
//! passed the contract but is malformed at a finer grain) and transport
//! errors (surfaced unchanged from the mail store or sender).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::context::ValueKind;

/// Convenience result alias.
pub type Result<T, E = MailflowError> = std::result::Result<T, E>;

/// The main error type for mailflow operations.
#[derive(Debug, Error)]
pub enum MailflowError {
    /// A context key was missing, had the wrong kind, or a precondition failed.
    #[error("{0}")]
    Contract(#[from] ContractViolation),

    /// Input was accepted by the contract but is malformed.
    #[error("{0}")]
    Format(#[from] FormatError),

    /// The mail store or sender failed.
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// A pipeline could not be wired.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal invariant was broken.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MailflowError {
    /// Returns the contract violation, if this is one.
    #[must_use]
    pub fn as_contract(&self) -> Option<&ContractViolation> {
        match self {
            Self::Contract(v) => Some(v),
            _ => None,
        }
    }

    /// Returns true for contract violations.
    #[must_use]
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract(_))
    }

    /// Returns true for transport failures.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub(crate) fn in_operation(self, operation: &str) -> Self {
        match self {
            Self::Contract(v) => Self::Contract(v.in_operation(operation)),
            other => other,
        }
    }
}

/// Metadata about a contract error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CONTRACT-MISSING").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::Value::String(self.code.clone()));
        map.insert("summary".to_string(), serde_json::Value::String(self.summary.clone()));

        if let Some(ref hint) = self.fix_hint {
            map.insert("fix_hint".to_string(), serde_json::Value::String(hint.clone()));
        }
        if !self.context.is_empty() {
            let context_map: serde_json::Map<String, serde_json::Value> = self
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            map.insert("context".to_string(), serde_json::Value::Object(context_map));
        }

        map
    }
}

/// Why a contract check failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// The key is absent.
    Missing,
    /// The key holds a value of another kind.
    WrongType {
        /// Kind the operation declared.
        expected: ValueKind,
        /// Kind found in the context.
        actual: ValueKind,
    },
    /// A documented precondition does not hold.
    Precondition(String),
}

impl ViolationReason {
    /// Stable, machine-readable sub-reason.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Missing => "CONTRACT-MISSING",
            Self::WrongType { .. } => "CONTRACT-WRONG-TYPE",
            Self::Precondition(_) => "CONTRACT-PRECONDITION",
        }
    }
}

/// Raised when an operation's declared inputs are not satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractViolation {
    /// Operation that rejected the context, once known.
    pub operation: Option<String>,
    /// The offending key.
    pub key: String,
    /// What went wrong.
    pub reason: ViolationReason,
}

impl ContractViolation {
    /// A required key is absent.
    #[must_use]
    pub fn missing(key: impl Into<String>) -> Self {
        Self {
            operation: None,
            key: key.into(),
            reason: ViolationReason::Missing,
        }
    }

    /// A key holds the wrong kind of value.
    #[must_use]
    pub fn wrong_type(key: impl Into<String>, expected: ValueKind, actual: ValueKind) -> Self {
        Self {
            operation: None,
            key: key.into(),
            reason: ViolationReason::WrongType { expected, actual },
        }
    }

    /// A precondition on a key failed.
    #[must_use]
    pub fn precondition(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: None,
            key: key.into(),
            reason: ViolationReason::Precondition(message.into()),
        }
    }

    /// Attaches the operation name unless one is already set.
    #[must_use]
    pub fn in_operation(mut self, operation: &str) -> Self {
        if self.operation.is_none() {
            self.operation = Some(operation.to_string());
        }
        self
    }

    /// Returns true when the key was absent.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self.reason, ViolationReason::Missing)
    }

    /// Returns true when the key had the wrong kind.
    #[must_use]
    pub fn is_wrong_type(&self) -> bool {
        matches!(self.reason, ViolationReason::WrongType { .. })
    }

    /// Structured diagnostics for this violation.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        let code = self.reason.code();
        let mut info = ContractErrorInfo::new(code, self.to_string())
            .with_context_entry("key", self.key.clone());
        if let Some(ref op) = self.operation {
            info = info.with_context_entry("operation", op.clone());
        }
        if let ViolationReason::WrongType { expected, actual } = &self.reason {
            info = info
                .with_context_entry("expected", expected.to_string())
                .with_context_entry("actual", actual.to_string());
        }
        match ContractSuggestions::get(code) {
            Some(hint) => info.with_fix_hint(hint),
            None => info,
        }
    }
}

impl fmt::Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref op) = self.operation {
            write!(f, "[{op}] ")?;
        }
        match &self.reason {
            ViolationReason::Missing => write!(f, "{} not exist or is null", self.key),
            ViolationReason::WrongType { expected, actual } => write!(
                f,
                "{} is not of kind {expected} (found {actual})",
                self.key
            ),
            ViolationReason::Precondition(message) => write!(f, "{}: {message}", self.key),
        }
    }
}

impl std::error::Error for ContractViolation {}

/// Raised when input is well-typed but malformed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid {subject}: {message}")]
pub struct FormatError {
    /// What was being parsed (e.g. "address", "header pattern").
    pub subject: String,
    /// Parser message.
    pub message: String,
}

impl FormatError {
    /// Creates a new format error.
    #[must_use]
    pub fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

/// Failures reported by the mail store or sender.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The server could not be reached.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Credentials were rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Recipients or the message were rejected.
    #[error("Send failed: {0}")]
    Rejected(String),

    /// Any other protocol-level failure.
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransportError {
    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }
}

/// Error raised when a pipeline is wired so that an operation can never
/// see one of its required keys.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The operations involved in the error.
    pub operations: Vec<String>,
    /// Optional contract error info.
    pub error_info: Option<ContractErrorInfo>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            operations: Vec::new(),
            error_info: None,
        }
    }

    /// Sets the operations involved.
    #[must_use]
    pub fn with_operations(mut self, operations: Vec<String>) -> Self {
        self.operations = operations;
        self
    }

    /// Sets the contract error info.
    #[must_use]
    pub fn with_error_info(mut self, info: ContractErrorInfo) -> Self {
        self.error_info = Some(info);
        self
    }
}

/// Provides default suggestions for contract error codes.
pub struct ContractSuggestions;

impl ContractSuggestions {
    /// Gets a suggestion for a given error code.
    #[must_use]
    pub fn get(code: &str) -> Option<&'static str> {
        match code {
            "CONTRACT-MISSING" => Some(
                "Populate the key before the pipeline runs or place an operation \
                 that produces it earlier in the chain.",
            ),
            "CONTRACT-WRONG-TYPE" => Some(
                "Store the value with the kind the operation declares; check the \
                 operation's contract for the expected shape.",
            ),
            "CONTRACT-PRECONDITION" => Some(
                "The key is present but its value is not usable; see the message \
                 for the failed condition.",
            ),
            "CONTRACT-UNWIRED" => Some(
                "No earlier operation guarantees this key. Provide it up front or \
                 reorder the pipeline.",
            ),
            _ => None,
        }
    }
}
