// src/cancel.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ValidationError;

/// Cooperative cancellation shared between a caller and running validations.
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<(), ValidationError> {
        if self.is_cancelled() {
            Err(ValidationError::Cancelled)
        } else {
            Ok(())
        }
    }
}
