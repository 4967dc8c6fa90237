// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Cooperative cancellation token.
//!
//! Long-running derivations poll the token at safe checkpoints instead of
//! being terminated forcibly, so no algorithm scratch state is ever left
//! partially mutated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{KdfError, Result};

/// Shared cancellation flag for an in-flight test or calibration run.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Safe to call from any thread, any number
    /// of times.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Checkpoint for workers: returns `Err(KdfError::Cancelled)` once
    /// cancellation has been requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(KdfError::Cancelled)
        } else {
            Ok(())
        }
    }
}
