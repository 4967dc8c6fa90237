// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Error types for KDF parameter validation and calibration.
//!
//! This module defines all error types used throughout the crate,
//! providing clear, actionable error messages for users and developers.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for all KDF tuning operations.
///
/// This enum encapsulates all possible errors that can occur during
/// parameter validation, test runs, and calibration.
#[derive(Error, Debug)]
pub enum KdfError {
    /// The selected algorithm is not present in the catalog (e.g., a
    /// plugin-provided algorithm that is no longer installed). Callers
    /// must leave any previously persisted parameters untouched.
    #[error("Unknown KDF algorithm: {0}")]
    UnknownAlgorithm(Uuid),

    /// The underlying KDF primitive could not run (resource exhaustion,
    /// unsupported configuration on this host).
    #[error("KDF computation failed: {0}")]
    ComputationFailed(String),

    /// The operation was cancelled by the user. Not a failure; callers
    /// should not surface an error message for this variant.
    #[error("Operation cancelled")]
    Cancelled,

    /// A calibration or test job is already running on this controller.
    #[error("A calibration job is already running")]
    JobAlreadyRunning,

    /// A parameter set is malformed for the algorithm it targets
    /// (missing field, wrong owning algorithm).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Manual implementation to handle the non-standard error type from argon2.
impl From<argon2::Error> for KdfError {
    fn from(err: argon2::Error) -> Self {
        KdfError::ComputationFailed(err.to_string())
    }
}

/// Type alias for Results using KdfError.
pub type Result<T> = std::result::Result<T, KdfError>;
