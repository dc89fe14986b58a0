//! Registry of device operations waiting for the loop's poll step.
//!
//! Each entry pairs an attempt closure with the future it resolves. A poll
//! pass retries every entry once; entries that succeed, fail, or whose future
//! nobody references anymore are dropped from the registry.

use crate::error::Result;
use crate::future::WeakFuture;

use log::trace;
use std::cell::RefCell;
use std::task::Poll;

/// A registered operation, retried once per poll pass.
pub(crate) trait PendingOperation {
    /// Retries the operation. Returns `true` once it can be deregistered.
    fn poll_once(&mut self) -> bool;
}

/// An attempt closure bound to the future it resolves.
pub(crate) struct Operation<T, F> {
    target: WeakFuture<T>,
    attempt: F,
}

impl<T, F> Operation<T, F> {
    pub(crate) fn new(target: WeakFuture<T>, attempt: F) -> Self {
        Self { target, attempt }
    }
}

impl<T, F> PendingOperation for Operation<T, F>
where
    T: 'static,
    F: FnMut() -> Poll<Result<T>>,
{
    fn poll_once(&mut self) -> bool {
        // Nobody can observe the outcome anymore: reap without attempting.
        let Some(target) = self.target.upgrade() else {
            trace!("reaping abandoned wait");
            return true;
        };

        if target.done() {
            return true;
        }

        match (self.attempt)() {
            Poll::Pending => false,
            Poll::Ready(outcome) => {
                // Checked above; the future cannot be resolved twice here.
                let _ = target.set_outcome(outcome);
                true
            }
        }
    }
}

/// Pending operations owned by one loop.
pub(crate) struct Registry {
    operations: RefCell<Vec<Box<dyn PendingOperation>>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            operations: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn register(&self, operation: Box<dyn PendingOperation>) {
        self.operations.borrow_mut().push(operation);
        trace!("wait registered ({} pending)", self.len());
    }

    pub(crate) fn len(&self) -> usize {
        self.operations.borrow().len()
    }

    /// Retries every registered operation once, in registration order.
    ///
    /// Returns how many operations finished during this pass.
    pub(crate) fn poll(&self) -> usize {
        let mut operations = std::mem::take(&mut *self.operations.borrow_mut());
        if operations.is_empty() {
            return 0;
        }

        let before = operations.len();
        operations.retain_mut(|operation| !operation.poll_once());
        let finished = before - operations.len();

        // Operations registered while the pass ran go behind the survivors.
        let mut slot = self.operations.borrow_mut();
        operations.append(&mut *slot);
        *slot = operations;

        finished
    }
}
