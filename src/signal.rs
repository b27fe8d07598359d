//! Cooperative cancellation.
//!
//! Long index builds and clustering runs poll a [`StopSignal`] between units of
//! work. Triggering the signal from any thread makes the in-flight operation
//! return [`Error::Cancelled`] at its next check; there is no partial result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// Shared, thread-safe stop flag.
///
/// Clones share the same flag, so a clone can be handed to another thread
/// (a UI handler, a timeout watchdog) while the original is attached to the
/// computation.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    triggered: Arc<AtomicBool>,
}

impl StopSignal {
    /// Create an untriggered signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn trigger(&self) {
        self.triggered.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    /// Return [`Error::Cancelled`] if the signal has been triggered.
    pub fn check(&self) -> Result<()> {
        if self.is_triggered() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Poll an optional signal.
#[inline]
pub(crate) fn poll(signal: Option<&StopSignal>) -> Result<()> {
    match signal {
        Some(s) => s.check(),
        None => Ok(()),
    }
}
