// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! KdfTune - KDF parameter negotiation and calibration
//!
//! This library implements the key-derivation-function parameter
//! subsystem of a password manager's database-settings flow:
//!
//! - **Catalog**: pluggable KDF engines (Argon2id, iterated SHA-256)
//!   with stable identities, legal parameter ranges, and defaults
//! - **Validation**: clamping raw dialog values into legal ranges,
//!   with a human-readable adjustment trace for user disclosure
//! - **Calibration**: searching for parameters that hit a target
//!   wall-clock cost, off the owning thread, with cooperative
//!   cancellation and exactly-once result delivery
//!
//! # Example
//!
//! ```
//! use kdftune::{
//!     host_parallelism, validate_parameters, KdfCatalog, MemoryUnit, RawParameters,
//! };
//!
//! let catalog = KdfCatalog::with_defaults();
//! let argon2 = catalog.by_name("Argon2").unwrap().uuid();
//!
//! let raw = RawParameters {
//!     iterations: 1,
//!     memory: 1,
//!     memory_unit: MemoryUnit::Byte,
//!     parallelism: 0,
//! };
//! let (params, report) = validate_parameters(&catalog, argon2, &raw).unwrap();
//! assert!(params.satisfies(&catalog.by_uuid(argon2).unwrap().limits()));
//! assert!(!report.is_empty()); // every clamp produced one line
//! # let _ = host_parallelism();
//! ```

pub mod cancel;
pub mod catalog;
pub mod config;
pub mod controller;
pub mod error;
pub mod params;
pub mod validate;

// Re-export commonly used types
pub use cancel::CancelToken;
pub use catalog::{Argon2Engine, KdfCatalog, KdfEngine, Sha256RoundsEngine};
pub use config::{host_parallelism, CalibrationConfig, DEFAULT_TARGET_MS};
pub use controller::{CalibrationController, JobOutcome};
pub use error::{KdfError, Result};
pub use params::{
    MemoryUnit, ParamKind, ParamRange, ParameterLimits, ParameterSet, RawParameters,
};
pub use validate::{
    validate, validate_for, AdjustmentReport, MinimumStrengthPolicy, StrengthPolicy,
};

use std::sync::Arc;
use std::time::Duration;

/// Validates raw dialog values for the given algorithm with the host's
/// own processor count and the default strength policy.
///
/// This is the high-level API a settings dialog calls on commit.
///
/// # Errors
///
/// Returns `KdfError::UnknownAlgorithm` without side effects when the
/// identity is not registered; the caller must keep its persisted
/// parameters untouched in that case.
pub fn validate_parameters(
    catalog: &KdfCatalog,
    algorithm: uuid::Uuid,
    raw: &RawParameters,
) -> Result<(ParameterSet, AdjustmentReport)> {
    validate::validate_for(
        catalog,
        algorithm,
        raw,
        host_parallelism(),
        &MinimumStrengthPolicy,
    )
}

/// Runs a calibration synchronously on the calling thread.
///
/// Intended for headless callers that have no UI thread to protect;
/// interactive callers should use [`CalibrationController`] instead.
///
/// # Errors
///
/// Propagates `KdfError::ComputationFailed` from the engine.
pub fn calibrate_blocking(
    engine: &Arc<dyn KdfEngine>,
    config: CalibrationConfig,
) -> Result<ParameterSet> {
    engine.calibrate(config.target, &CancelToken::new())
}

/// Convenience wrapper: one timed derivation on the calling thread.
///
/// # Errors
///
/// Propagates `KdfError::ComputationFailed` or
/// `KdfError::InvalidParameter` from the engine.
pub fn test_blocking(engine: &Arc<dyn KdfEngine>, params: &ParameterSet) -> Result<Duration> {
    engine.run_once(params, &CancelToken::new())
}
