//! The operation trait and its composition.

use std::fmt::{self, Debug};

use crate::context::ExecutionContext;
use crate::contracts::Contract;
use crate::errors::{ContractViolation, Result};

/// A contract-checked unit of work over an [`ExecutionContext`].
///
/// Implementors provide [`run`](Operation::run); callers use
/// [`execute`](Operation::execute), which validates the contract and any
/// extra preconditions before `run` touches the context, and afterwards
/// verifies that every guaranteed output was written.
pub trait Operation: Send + Sync {
    /// Returns the name of the operation.
    fn name(&self) -> &str;

    /// Returns the declared keys.
    fn contract(&self) -> &Contract;

    /// Preconditions beyond key presence and kind.
    ///
    /// Runs after the contract check and before any side effect.
    ///
    /// # Errors
    ///
    /// A [`ContractViolation::precondition`] naming the offending key.
    fn check(&self, _ctx: &ExecutionContext) -> std::result::Result<(), ContractViolation> {
        Ok(())
    }

    /// Performs the transform. Assumes the contract holds.
    ///
    /// # Errors
    ///
    /// Format, transport and IO failures.
    fn run(&self, ctx: &mut ExecutionContext) -> Result<()>;

    /// Validates, runs and returns the same context.
    ///
    /// # Errors
    ///
    /// [`MailflowError::Contract`](crate::MailflowError::Contract) before any
    /// side effect when the contract or a precondition fails; otherwise
    /// whatever `run` reports.
    fn execute<'c>(&self, ctx: &'c mut ExecutionContext) -> Result<&'c mut ExecutionContext> {
        let name = self.name();
        self.contract()
            .validate(ctx)
            .map_err(|v| v.in_operation(name))?;
        self.check(ctx).map_err(|v| v.in_operation(name))?;
        self.run(ctx).map_err(|e| e.in_operation(name))?;
        self.contract().verify_outputs(name, ctx)?;
        Ok(ctx)
    }

    /// Chains `next` after this operation.
    fn and_then<N>(self, next: N) -> AndThen<Self, N>
    where
        Self: Sized,
        N: Operation,
    {
        AndThen::new(self, next)
    }
}

impl<T: Operation + ?Sized> Operation for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn contract(&self) -> &Contract {
        (**self).contract()
    }

    fn check(&self, ctx: &ExecutionContext) -> std::result::Result<(), ContractViolation> {
        (**self).check(ctx)
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        (**self).run(ctx)
    }

    fn execute<'c>(&self, ctx: &'c mut ExecutionContext) -> Result<&'c mut ExecutionContext> {
        (**self).execute(ctx)
    }
}

/// Two operations run back to back; built by [`Operation::and_then`].
pub struct AndThen<A, B> {
    first: A,
    second: B,
    name: String,
    contract: Contract,
}

impl<A: Operation, B: Operation> AndThen<A, B> {
    fn new(first: A, second: B) -> Self {
        let name = format!("{} -> {}", first.name(), second.name());
        let contract = merge_contracts(first.contract(), second.contract());
        Self {
            first,
            second,
            name,
            contract,
        }
    }
}

impl<A, B> Debug for AndThen<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AndThen").field("name", &self.name).finish()
    }
}

impl<A: Operation, B: Operation> Operation for AndThen<A, B> {
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
        self.second.execute(self.first.execute(ctx)?)
    }
}

/// Contract of `first` followed by `second`.
///
/// Keys `second` requires that `first` guarantees are dropped from the
/// combined requirements.
pub(crate) fn merge_contracts(first: &Contract, second: &Contract) -> Contract {
    let mut merged = first.clone();
    for spec in &second.required {
        let produced = first.guaranteed_outputs().any(|o| o.key == spec.key);
        let known = merged.required.iter().any(|r| r.key == spec.key);
        if !produced && !known {
            merged.required.push(spec.clone());
        }
    }
    for spec in &second.optional {
        if !merged.optional.iter().any(|o| o.key == spec.key) {
            merged.optional.push(spec.clone());
        }
    }
    for spec in &second.outputs {
        match merged.outputs.iter_mut().find(|o| o.key == spec.key) {
            Some(existing) => existing.guaranteed |= spec.guaranteed,
            None => merged.outputs.push(spec.clone()),
        }
    }
    merged
}

/// An operation backed by a closure.
pub struct FnOperation<F>
where
    F: Fn(&mut ExecutionContext) -> Result<()> + Send + Sync,
{
    name: String,
    contract: Contract,
    func: F,
}

impl<F> FnOperation<F>
where
    F: Fn(&mut ExecutionContext) -> Result<()> + Send + Sync,
{
    /// Creates a new closure-backed operation.
    pub fn new(name: impl Into<String>, contract: Contract, func: F) -> Self {
        Self {
            name: name.into(),
            contract,
            func,
        }
    }
}

impl<F> Debug for FnOperation<F>
where
    F: Fn(&mut ExecutionContext) -> Result<()> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnOperation").field("name", &self.name).finish()
    }
}

impl<F> Operation for FnOperation<F>
where
    F: Fn(&mut ExecutionContext) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn contract(&self) -> &Contract {
        &self.contract
    }

    fn run(&self, ctx: &mut ExecutionContext) -> Result<()> {
        (self.func)(ctx)
    }
}
