// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Configuration constants and calibration settings.
//!
//! This module defines the tunable knobs for calibration runs and the
//! host-aware caps applied during parameter validation.

use std::time::Duration;

/// Default calibration target: one second of wall-clock time per derivation.
pub const DEFAULT_TARGET_MS: u64 = 1000;

/// Host-aware parallelism cap factor. A parallelism degree above
/// `host cores * 2` configured on one machine is likely nonsensical or
/// unsafe on another machine opening the same protected data.
pub const HOST_PARALLELISM_FACTOR: u64 = 2;

/// Number of hash rounds an iterated-hash engine computes between
/// cancellation checkpoints.
pub const CANCEL_CHECK_ROUNDS: u64 = 65_536;

/// Settings for a calibration run.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationConfig {
    /// Target wall-clock duration a single derivation should take.
    pub target: Duration,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            target: Duration::from_millis(DEFAULT_TARGET_MS),
        }
    }
}

impl CalibrationConfig {
    /// Creates a configuration with a custom target duration.
    pub fn with_target(target: Duration) -> Self {
        Self { target }
    }
}

/// Returns the number of logical processors on this host, falling back
/// to 1 if the count cannot be determined.
pub fn host_parallelism() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}
