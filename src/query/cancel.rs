//! Cooperative cancellation and deadlines for path enumeration
//!
//! The caller holds a token and may cancel at any time; enumeration checks
//! it (and the optional deadline) at every expansion step. Work already done
//! is discarded on interrupt.

use super::types::PathError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A cooperative cancellation token, shared between caller and query.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Cancellation token plus optional wall-clock deadline.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl Interrupt {
    /// Never interrupts
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Deadline `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    /// Err if cancelled or past the deadline. Cancellation wins.
    pub fn check(&self) -> Result<(), PathError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(PathError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(PathError::TimedOut),
            _ => Ok(()),
        }
    }
}
