//! Cooperative breakpoints and cancellation for long-running bakes.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Consulted between meshes and images so a host loop can interleave work.
pub trait DeferAgent: Send {
    /// Called at every breakpoint. Implementations may block, yield or
    /// call back into the host before returning.
    fn checkpoint(&mut self);
}

/// Never yields.
#[derive(Debug, Clone, Copy, Default)]
pub struct UninterruptedDeferAgent;

impl DeferAgent for UninterruptedDeferAgent {
    fn checkpoint(&mut self) {}
}

/// Yields once the time spent since the last yield exceeds a budget.
pub struct TimeBudgetDeferAgent {
    budget: Duration,
    started: Instant,
    on_yield: Box<dyn FnMut() + Send>,
    yields: usize,
}

impl TimeBudgetDeferAgent {
    /// Yield the current thread whenever `budget` is used up.
    #[must_use]
    pub fn new(budget: Duration) -> Self {
        Self::with_callback(budget, std::thread::yield_now)
    }

    /// Run `on_yield` (for example, pump a frame) whenever `budget` is used up.
    #[must_use]
    pub fn with_callback(budget: Duration, on_yield: impl FnMut() + Send + 'static) -> Self {
        Self {
            budget,
            started: Instant::now(),
            on_yield: Box::new(on_yield),
            yields: 0,
        }
    }

    /// How many times the agent has yielded.
    #[must_use]
    pub fn yields(&self) -> usize {
        self.yields
    }
}

impl DeferAgent for TimeBudgetDeferAgent {
    fn checkpoint(&mut self) {
        if self.started.elapsed() >= self.budget {
            (self.on_yield)();
            self.yields += 1;
            self.started = Instant::now();
        }
    }
}

/// Shared flag that aborts a bake or save at its next breakpoint.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Error::Cancelled)` once cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
