//! Ordered pipelines of operations.

use std::collections::HashSet;
use std::fmt;
use tracing::{debug, info, info_span, warn};

use super::operation::{merge_contracts, Operation};
use crate::context::ExecutionContext;
use crate::contracts::{Contract, ContractRegistry};
use crate::errors::{ContractErrorInfo, ContractSuggestions, PipelineValidationError, Result};
use crate::events::names;
use crate::observability::{OperationSpanAttributes, SpanTimer};

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    name: String,
    operations: Vec<Box<dyn Operation>>,
}

impl PipelineBuilder {
    /// Appends an operation.
    #[must_use]
    pub fn then(mut self, operation: impl Operation + 'static) -> Self {
        self.operations.push(Box::new(operation));
        self
    }

    /// Appends an already boxed operation.
    #[must_use]
    pub fn then_boxed(mut self, operation: Box<dyn Operation>) -> Self {
        self.operations.push(operation);
        self
    }

    /// Returns the number of operations added so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns true if no operation was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if the builder has no operations.
    pub fn build(self) -> std::result::Result<Pipeline, PipelineValidationError> {
        if self.operations.is_empty() {
            return Err(PipelineValidationError::new("Pipeline has no operations")
                .with_error_info(
                    ContractErrorInfo::new("PIPELINE-EMPTY", "Cannot build an empty pipeline")
                        .with_fix_hint("Add at least one operation before building."),
                ));
        }

        let contract = self
            .operations
            .iter()
            .skip(1)
            .fold(self.operations[0].contract().clone(), |acc, op| {
                merge_contracts(&acc, op.contract())
            });

        Ok(Pipeline {
            name: self.name,
            operations: self.operations,
            contract,
        })
    }
}

/// Operations run strictly in order over one context.
///
/// Operation *i+1* sees the context operation *i* returned. The first error
/// aborts the run; later operations never execute and nothing is rolled
/// back.
pub struct Pipeline {
    name: String,
    operations: Vec<Box<dyn Operation>>,
    contract: Contract,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("operations", &self.operation_names())
            .finish()
    }
}

impl Pipeline {
    /// Starts a new pipeline.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            operations: Vec::new(),
        }
    }

    /// Operation names in run order.
    #[must_use]
    pub fn operation_names(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.name()).collect()
    }

    /// Number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Always false for a built pipeline.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Records the contract of every operation in `registry`.
    pub fn register_contracts(&self, registry: &ContractRegistry) {
        for op in &self.operations {
            registry.register(op.as_ref());
        }
    }

    /// Checks that every required key is provided up front or guaranteed by
    /// an earlier operation.
    ///
    /// # Errors
    ///
    /// A [`PipelineValidationError`] with code `CONTRACT-UNWIRED` naming the
    /// first operation whose input nothing supplies.
    pub fn check_wiring(&self, provided: &[&str]) -> std::result::Result<(), PipelineValidationError> {
        let mut available: HashSet<&str> = provided.iter().copied().collect();
        for op in &self.operations {
            for spec in &op.contract().required {
                if !available.contains(spec.key.as_str()) {
                    let mut info = ContractErrorInfo::new(
                        "CONTRACT-UNWIRED",
                        format!("{} requires {} but nothing provides it", op.name(), spec.key),
                    )
                    .with_context_entry("operation", op.name())
                    .with_context_entry("key", spec.key.clone());
                    if let Some(hint) = ContractSuggestions::get("CONTRACT-UNWIRED") {
                        info = info.with_fix_hint(hint);
                    }
                    return Err(PipelineValidationError::new(format!(
                        "Pipeline '{}': operation '{}' requires '{}' which is neither provided nor produced earlier",
                        self.name,
                        op.name(),
                        spec.key
                    ))
                    .with_operations(vec![op.name().to_string()])
                    .with_error_info(info));
                }
            }
            available.extend(op.contract().guaranteed_outputs().map(|s| s.key.as_str()));
        }
        Ok(())
    }
}

impl Operation for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> &Contract {
        &self.contract
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        self.execute(ctx).map(|_| ())
    }

    fn execute<'c>(&self, ctx: &'c mut ExecutionContext) -> Result<&'c mut ExecutionContext> {
        let span = info_span!("pipeline", name = %self.name, run_id = %ctx.run_id());
        let _enter = span.enter();
        let timer = SpanTimer::start(&self.name);

        ctx.emit(
            names::PIPELINE_STARTED,
            Some(serde_json::json!({
                "pipeline": &self.name,
                "operations": self.operation_names(),
            })),
        );
        info!(operations = self.operations.len(), "Pipeline started");

        for op in &self.operations {
            let op_timer = SpanTimer::start(op.name());
            let outcome = op.execute(ctx).map(|_| ());
            match outcome {
                Ok(()) => {
                    let duration_ms = op_timer.finish();
                    let attrs = OperationSpanAttributes::new(op.name())
                        .with_status("completed")
                        .with_duration_ms(duration_ms);
                    debug!(operation = op.name(), duration_ms, "Operation completed");
                    ctx.emit(names::OPERATION_COMPLETED, Some(attrs.to_json()));
                }
                Err(err) => {
                    let attrs = OperationSpanAttributes::new(op.name())
                        .with_status("failed")
                        .with_duration_ms(op_timer.finish())
                        .with_error(err.to_string());
                    warn!(operation = op.name(), error = %err, "Operation failed");
                    ctx.emit(names::OPERATION_FAILED, Some(attrs.to_json()));
                    ctx.emit(
                        names::PIPELINE_FAILED,
                        Some(serde_json::json!({
                            "pipeline": &self.name,
                            "operation": op.name(),
                            "error": err.to_string(),
                            "duration_ms": timer.elapsed_ms(),
                        })),
                    );
                    return Err(err);
                }
            }
        }

        let duration_ms = timer.finish();
        info!(duration_ms, "Pipeline completed");
        ctx.emit(
            names::PIPELINE_COMPLETED,
            Some(serde_json::json!({
                "pipeline": &self.name,
                "duration_ms": duration_ms,
            })),
        );
        Ok(ctx)
    }
}
