//! Compensating transaction.
//!
//! A [`Transaction`] collects ordered (operation, compensation) pairs and
//! runs nothing until [`commit`](Transaction::commit). On the first
//! operation failure the compensations registered so far run in reverse
//! order, the failing step's own compensation included, since the pair
//! was registered together.
//!
//! This is saga-style best effort, not ACID: there is no isolation from
//! concurrent readers, and a compensation that itself fails is reported
//! in the aggregate error rather than retried.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tracing::error;

/// Boxed step body. Steps run sequentially on the committing task.
type StepFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type Step = Box<dyn FnOnce() -> StepFuture + Send>;

/// One compensation that failed while unwinding.
#[derive(Debug)]
pub struct CompensationFailure {
    /// Zero-based registration index of the step whose compensation failed.
    pub index: usize,
    /// The compensation's own error.
    pub error: anyhow::Error,
}

/// Aggregate transaction failure.
#[derive(Debug)]
pub enum TxError {
    /// The operation at `index` failed. Compensations for steps
    /// `0..=index` were run in reverse order; any that failed themselves
    /// are listed in `compensation_failures`.
    OperationFailed {
        index: usize,
        source: anyhow::Error,
        compensation_failures: Vec<CompensationFailure>,
    },

    /// An explicit rollback ran and one or more compensations failed.
    CompensationFailed { failures: Vec<CompensationFailure> },
}

impl fmt::Display for TxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperationFailed {
                index,
                source,
                compensation_failures,
            } => {
                write!(f, "Operation {} failed: {}", index, source)?;
                if !compensation_failures.is_empty() {
                    write!(
                        f,
                        " ({} compensation(s) also failed while unwinding)",
                        compensation_failures.len()
                    )?;
                }
                Ok(())
            }
            Self::CompensationFailed { failures } => {
                write!(f, "Rollback finished with {} failed compensation(s)", failures.len())
            }
        }
    }
}

impl std::error::Error for TxError {}

/// Ordered steps with registered inverses.
///
/// `commit` and `rollback` consume the transaction, so a committed or
/// rolled-back transaction cannot be touched again. One transaction per
/// saga run, one owner.
#[derive(Default)]
pub struct Transaction {
    operations: Vec<Step>,
    compensations: Vec<Step>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("steps", &self.operations.len())
            .finish()
    }
}

impl Transaction {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one step. Nothing runs until commit.
    ///
    /// `operation` does the work; `compensation` must undo it well enough
    /// that earlier steps can be unwound after it.
    pub fn execute<Op, OpFut, Comp, CompFut>(&mut self, operation: Op, compensation: Comp)
    where
        Op: FnOnce() -> OpFut + Send + 'static,
        OpFut: Future<Output = anyhow::Result<()>> + Send + 'static,
        Comp: FnOnce() -> CompFut + Send + 'static,
        CompFut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.operations.push(Box::new(move || Box::pin(operation())));
        self.compensations.push(Box::new(move || Box::pin(compensation())));
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Runs every operation in registration order.
    ///
    /// On the first failure, unwinds compensations for the steps up to
    /// and including the failing one, then reports the aggregate.
    pub async fn commit(mut self) -> Result<(), TxError> {
        let operations = std::mem::take(&mut self.operations);
        for (index, operation) in operations.into_iter().enumerate() {
            if let Err(source) = operation().await {
                error!(step = index, error = %source, "Transaction operation failed, unwinding");
                self.compensations.truncate(index + 1);
                let compensation_failures =
                    unwind(std::mem::take(&mut self.compensations)).await;
                return Err(TxError::OperationFailed {
                    index,
                    source,
                    compensation_failures,
                });
            }
        }
        Ok(())
    }

    /// Runs every registered compensation, most recently registered first,
    /// without running any operation.
    pub async fn rollback(mut self) -> Result<(), TxError> {
        let failures = unwind(std::mem::take(&mut self.compensations)).await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TxError::CompensationFailed { failures })
        }
    }
}

/// Runs compensations in reverse registration order, collecting failures.
/// Every compensation runs even when an earlier one fails.
async fn unwind(compensations: Vec<Step>) -> Vec<CompensationFailure> {
    let mut failures = Vec::new();
    for (index, compensation) in compensations.into_iter().enumerate().rev() {
        if let Err(error) = compensation().await {
            error!(step = index, error = %error, "Compensation failed");
            failures.push(CompensationFailure { index, error });
        }
    }
    failures
}
