//! Error taxonomy shared by futures, tasks and device operations.
//!
//! Failures are stored inside resolved futures and may be re-raised every time
//! [`Future::result`](crate::Future::result) is called, so [`Error`] is cheap to
//! clone: foreign errors are kept behind an [`Arc`].

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every way a future, task or device operation can fail.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The caller broke the state machine of a future or of the loop, for
    /// example by resolving a future twice.
    #[error("invalid state: {0}")]
    InvalidState(&'static str),

    /// The task was cancelled before it produced a result.
    #[error("operation was cancelled")]
    Cancelled,

    /// A deadline future expired.
    #[error("operation timed out")]
    TimedOut,

    /// A device call failed with something other than a would-block condition.
    #[error("device error: {0}")]
    Device(Arc<io::Error>),

    /// A computation driven by a task failed.
    #[error("{0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an arbitrary error raised inside a computation.
    pub fn failed<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Failed(Arc::new(error))
    }

    /// Builds a computation failure from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        let boxed: Box<dyn std::error::Error + Send + Sync> = message.into().into();
        Error::Failed(Arc::from(boxed))
    }

    /// Returns true if this is the synthetic failure of a cancelled task.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns the I/O error kind when the failure came from a device.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            Error::Device(error) => Some(error.kind()),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Device(Arc::new(error))
    }
}

impl From<io::ErrorKind> for Error {
    fn from(kind: io::ErrorKind) -> Self {
        Error::Device(Arc::new(io::Error::from(kind)))
    }
}
