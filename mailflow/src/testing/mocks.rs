//! Operations for exercising pipelines.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::{ContextValue, ExecutionContext};
use crate::contracts::Contract;
use crate::errors::{MailflowError, Result};
use crate::pipeline::Operation;

/// Appends its name to a shared journal on every run.
#[derive(Debug, Clone)]
pub struct RecordingOperation {
    name: String,
    contract: Contract,
    journal: Arc<Mutex<Vec<String>>>,
}

impl RecordingOperation {
    /// Creates an operation with an empty contract.
    #[must_use]
    pub fn new(name: impl Into<String>, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            name: name.into(),
            contract: Contract::new(),
            journal,
        }
    }

    /// Replaces the contract.
    #[must_use]
    pub fn with_contract(mut self, contract: Contract) -> Self {
        self.contract = contract;
        self
    }
}

impl Operation for RecordingOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> &Contract {
        &self.contract
    }

    fn run(&self, _ctx: &mut ExecutionContext) -> Result<()> {
        self.journal.lock().push(self.name.clone());
        Ok(())
    }
}

/// Fails every run with an internal error.
#[derive(Debug, Clone)]
pub struct FailingOperation {
    name: String,
    contract: Contract,
    message: String,
}

impl FailingOperation {
    /// Creates a failing operation.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contract: Contract::new(),
            message: message.into(),
        }
    }
}

impl Operation for FailingOperation {
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> &Contract {
        &self.contract
    }

    fn run(&self, _ctx: &mut ExecutionContext) -> Result<()> {
        Err(MailflowError::Internal(self.message.clone()))
    }
}

/// Writes a fixed value under a key, declared as a guaranteed output.
#[derive(Debug, Clone)]
pub struct SetValue {
    name: String,
    contract: Contract,
    key: String,
    value: ContextValue,
}

impl SetValue {
    /// Creates the operation.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        let key = key.into();
        let value = value.into();
        Self {
            name: format!("set {key}"),
            contract: Contract::new().output(key.clone(), value.kind()),
            key,
            value,
        }
    }
}

impl Operation for SetValue {
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> &Contract {
        &self.contract
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        ctx.insert(self.key.clone(), self.value.clone());
        Ok(())
    }
}
