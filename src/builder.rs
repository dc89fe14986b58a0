//! Fluent builder for [`EventLoop`] construction.
//!
//! Collects the few knobs the loop has: how it idles when there is nothing to
//! do, how large its ready queue starts, and an optional hook polled once per
//! idle pass.

use crate::runtime::EventLoop;

use std::time::Duration;

/// What the loop does between two polls when its ready queue is empty.
///
/// The loop never blocks on an OS primitive; every strategy polls again
/// after pausing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdleStrategy {
    /// Poll again immediately.
    #[default]
    Spin,
    /// Give up the rest of the thread's time slice between polls.
    Yield,
    /// Sleep for the given duration between polls.
    Sleep(Duration),
}

impl IdleStrategy {
    pub(crate) fn pause(&self) {
        match self {
            IdleStrategy::Spin => std::hint::spin_loop(),
            IdleStrategy::Yield => std::thread::yield_now(),
            IdleStrategy::Sleep(duration) => std::thread::sleep(*duration),
        }
    }
}

/// Builder for constructing [`EventLoop`] instances with fluent API.
///
/// # Example
/// ```ignore
/// let event_loop = LoopBuilder::new()
///     .idle(IdleStrategy::Sleep(Duration::from_millis(1)))
///     .poll_hook(|| service_hardware())
///     .build();
/// ```
pub struct LoopBuilder {
    pub(crate) idle: IdleStrategy,
    pub(crate) queue_capacity: usize,
    pub(crate) poll_hook: Option<Box<dyn FnMut()>>,
}

impl Default for LoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopBuilder {
    /// Creates a builder with the default configuration: spin while idle, a
    /// ready queue sized for a handful of tasks, no poll hook.
    pub fn new() -> Self {
        Self {
            idle: IdleStrategy::Spin,
            queue_capacity: 16,
            poll_hook: None,
        }
    }

    /// Sets the idle strategy.
    pub fn idle(mut self, idle: IdleStrategy) -> Self {
        self.idle = idle;
        self
    }

    /// Preallocates room for `capacity` ready callbacks.
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Installs a hook invoked once per poll, after interrupt entries and
    /// pending device operations have been serviced.
    pub fn poll_hook(mut self, hook: impl FnMut() + 'static) -> Self {
        self.poll_hook = Some(Box::new(hook));
        self
    }

    /// Consumes the builder and constructs the loop.
    pub fn build(self) -> EventLoop {
        EventLoop::with_config(self)
    }
}
