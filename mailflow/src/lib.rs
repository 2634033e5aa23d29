//! # Mailflow
//!
//! Mail message operations chained into contract-checked pipelines.
//!
//! Mailflow provides:
//!
//! - **Typed context**: operations share one [`ExecutionContext`] blackboard
//!   keyed by the names in [`context::keys`]
//! - **Contracts**: every operation declares the keys it reads and writes;
//!   violations are raised before any side effect
//! - **MIME tree algorithms**: flattening with size and disposition filters,
//!   part removal, header matching, body text edits and recipient rewriting
//! - **Transport seams**: message stores and senders as traits, with an
//!   in-memory store and an SMTP sender
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mailflow::prelude::*;
//!
//! let pipeline = Pipeline::builder("strip-attachments")
//!     .then(GetMimeMessage)
//!     .then(GetMimeBodyParts)
//!     .then(RemoveMimeBodyParts)
//!     .build()?;
//!
//! let mut ctx = ExecutionContext::new()
//!     .with(keys::FILE, PathBuf::from("in.eml"))
//!     .with(keys::GETMIMEBODYPARTS_FILTER_DISPO, "attachment");
//! pipeline.execute(&mut ctx)?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod context;
pub mod contracts;
pub mod errors;
pub mod events;
pub mod mime;
pub mod observability;
pub mod ops;
pub mod pipeline;
pub mod testing;
pub mod transport;

pub use context::ExecutionContext;
pub use errors::{MailflowError, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{keys, ContextValue, ExecutionContext, ValueKind};
    pub use crate::contracts::{Contract, ContractRegistry};
    pub use crate::errors::{
        ContractErrorInfo, ContractViolation, FormatError, MailflowError,
        PipelineValidationError, TransportError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::mime::{Address, BodyPart, MimeMessage, PartSource, RecipientType, TextMode};
    pub use crate::observability::{init_logging, LoggingConfig};
    pub use crate::ops::*;
    pub use crate::pipeline::{FnOperation, Operation, Pipeline, PipelineBuilder};
    pub use crate::transport::{
        FolderMode, InMemoryStore, MailSender, MailSession, MailStore, MessageFlag,
    };
}
