// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Argon2id engine: memory-hard key derivation with tunable iteration,
//! memory, and parallelism cost.
//!
//! Calibration probes a single cheap pass first, shrinks memory while
//! even the cheapest pass overshoots the target, then scales the
//! iteration count linearly (derivation time grows linearly with the
//! iteration count at fixed memory).

use std::time::{Duration, Instant};

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand_core::TryRngCore;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::KdfEngine;
use crate::cancel::CancelToken;
use crate::error::{KdfError, Result};
use crate::params::{ParamKind, ParamRange, ParameterLimits, ParameterSet};

/// Stable identity of the Argon2 engine.
pub const ARGON2_UUID: Uuid = Uuid::from_u128(0x9e29_8b19_56db_4773_b23d_fc3e_c6f0_a1e6);

/// Smallest legal memory per unit of parallelism: 8 KiB per lane, the
/// real minimum working set of the Argon2 block layout.
pub const ARGON2_MIN_MEMORY_PER_LANE: u64 = 8 * 1024;

/// Largest legal memory: the algorithm's m_cost ceiling in KiB,
/// expressed in bytes.
pub const ARGON2_MAX_MEMORY: u64 = 0x0FFF_FFFF * 1024;

/// Smallest iteration count the catalog admits. One pass is legal for
/// the primitive but never acceptable for protecting persisted data.
pub const ARGON2_MIN_ITERATIONS: u64 = 2;

/// Largest legal parallelism degree (2^24 - 1 lanes).
pub const ARGON2_MAX_PARALLELISM: u64 = 0xFF_FFFF;

/// Default memory cost: 64 MiB.
const DEFAULT_MEMORY: u64 = 64 * 1024 * 1024;

/// Default iteration count.
const DEFAULT_ITERATIONS: u64 = 3;

/// Default parallelism degree.
const DEFAULT_PARALLELISM: u64 = 4;

/// Fixed probe password for timing runs; the derived key is discarded.
const PROBE_PASSWORD: &[u8] = b"kdftune-timing-probe";

/// Fixed-length probe salt buffer, filled from OS entropy per run.
const PROBE_SALT_LEN: usize = 16;

/// Derived key length for timing runs.
const OUTPUT_LEN: usize = 32;

/// Argon2id key derivation engine.
///
/// Uses Argon2id (hybrid mode), which provides resistance to both
/// side-channel and GPU/ASIC attacks.
#[derive(Debug, Clone, Default)]
pub struct Argon2Engine;

impl Argon2Engine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }

    /// Extracts and narrows the three cost values for the argon2 crate
    /// boundary, saturating u64 parameter values into the u32 ranges
    /// the primitive accepts.
    fn cost_values(params: &ParameterSet) -> Result<(u32, u32, u32)> {
        let iterations = params
            .iterations()
            .ok_or_else(|| KdfError::InvalidParameter("missing iteration count".into()))?;
        let memory = params
            .memory()
            .ok_or_else(|| KdfError::InvalidParameter("missing memory size".into()))?;
        let parallelism = params
            .parallelism()
            .ok_or_else(|| KdfError::InvalidParameter("missing parallelism".into()))?;

        let p_cost = parallelism.min(ARGON2_MAX_PARALLELISM) as u32;
        // m_cost is in KiB and must cover at least 8 KiB per lane.
        let m_cost = (memory / 1024)
            .max(8 * u64::from(p_cost))
            .min(ARGON2_MAX_MEMORY / 1024) as u32;
        let t_cost = iterations.min(u64::from(u32::MAX)) as u32;
        Ok((m_cost, t_cost, p_cost))
    }

    /// One timed derivation with a fresh random salt.
    fn derive_timed(&self, params: &ParameterSet) -> Result<Duration> {
        let (m_cost, t_cost, p_cost) = Self::cost_values(params)?;
        let argon2_params = Params::new(m_cost, t_cost, p_cost, Some(OUTPUT_LEN))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut salt = [0u8; PROBE_SALT_LEN];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| KdfError::ComputationFailed(format!("RNG error: {}", e)))?;

        let mut key = Zeroizing::new([0u8; OUTPUT_LEN]);
        let start = Instant::now();
        argon2.hash_password_into(PROBE_PASSWORD, &salt, &mut *key)?;
        Ok(start.elapsed())
    }
}

impl KdfEngine for Argon2Engine {
    fn name(&self) -> &str {
        "Argon2"
    }

    fn uuid(&self) -> Uuid {
        ARGON2_UUID
    }

    fn limits(&self) -> ParameterLimits {
        ParameterLimits {
            iterations: ParamRange::new(ARGON2_MIN_ITERATIONS, u64::from(u32::MAX)),
            memory: Some(ParamRange::new(ARGON2_MIN_MEMORY_PER_LANE, ARGON2_MAX_MEMORY)),
            parallelism: Some(ParamRange::new(1, ARGON2_MAX_PARALLELISM)),
        }
    }

    fn default_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new(self.uuid());
        params
            .set(ParamKind::Iterations, DEFAULT_ITERATIONS)
            .set(ParamKind::Memory, DEFAULT_MEMORY)
            .set(ParamKind::Parallelism, DEFAULT_PARALLELISM);
        params
    }

    fn run_once(&self, params: &ParameterSet, cancel: &CancelToken) -> Result<Duration> {
        // A single Argon2 pass cannot be interrupted mid-derivation;
        // the checkpoint is before the pass starts.
        cancel.checkpoint()?;
        self.derive_timed(params)
    }

    fn calibrate(&self, target: Duration, cancel: &CancelToken) -> Result<ParameterSet> {
        let limits = self.limits();
        let mut params = self.default_params();
        params.set(ParamKind::Iterations, ARGON2_MIN_ITERATIONS);

        let parallelism = params.parallelism().unwrap_or(1);
        let memory_floor = ARGON2_MIN_MEMORY_PER_LANE.saturating_mul(parallelism);

        let mut elapsed = self.run_once(&params, cancel)?;
        debug!(
            elapsed_ms = elapsed.as_millis() as u64,
            "argon2 calibration probe"
        );

        // Shrink memory while even the cheapest pass overshoots.
        while elapsed > target {
            let memory = params.memory().unwrap_or(DEFAULT_MEMORY);
            if memory / 2 < memory_floor {
                break;
            }
            params.set(ParamKind::Memory, memory / 2);
            elapsed = self.run_once(&params, cancel)?;
            debug!(
                memory = memory / 2,
                elapsed_ms = elapsed.as_millis() as u64,
                "argon2 calibration memory step"
            );
        }

        // Scale the iteration count linearly toward the target.
        let per_probe = elapsed.as_secs_f64().max(1e-6);
        let scale = target.as_secs_f64() / per_probe;
        let iterations = ((ARGON2_MIN_ITERATIONS as f64) * scale).round() as u64;
        params.set(
            ParamKind::Iterations,
            limits.iterations.clamp(iterations.max(1)),
        );

        cancel.checkpoint()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Cheap parameters so tests stay fast: 8 MiB, 2 passes, 1 lane.
    fn fast_params() -> ParameterSet {
        let mut params = ParameterSet::new(ARGON2_UUID);
        params
            .set(ParamKind::Iterations, 2)
            .set(ParamKind::Memory, 8 * 1024 * 1024)
            .set(ParamKind::Parallelism, 1);
        params
    }

    #[test]
    fn test_identity() {
        let engine = Argon2Engine::new();
        assert_eq!(engine.name(), "Argon2");
        assert_eq!(engine.uuid(), ARGON2_UUID);
    }

    #[test]
    fn test_limits_shape() {
        let limits = Argon2Engine::new().limits();
        assert!(limits.supports_memory());
        assert!(limits.supports_parallelism());
        assert_eq!(limits.iterations.min, ARGON2_MIN_ITERATIONS);
        assert_eq!(limits.memory.unwrap().min, ARGON2_MIN_MEMORY_PER_LANE);
        assert_eq!(limits.parallelism.unwrap().min, 1);
    }

    #[test]
    fn test_defaults_within_limits() {
        let engine = Argon2Engine::new();
        assert!(engine.default_params().satisfies(&engine.limits()));
    }

    #[test]
    fn test_run_once_measures_time() {
        let engine = Argon2Engine::new();
        let elapsed = engine
            .run_once(&fast_params(), &CancelToken::new())
            .unwrap();
        assert!(elapsed > Duration::ZERO);
    }

    #[test]
    fn test_run_once_rejects_cancelled_token() {
        let engine = Argon2Engine::new();
        let token = CancelToken::new();
        token.cancel();
        let result = engine.run_once(&fast_params(), &token);
        assert!(matches!(result, Err(KdfError::Cancelled)));
    }

    #[test]
    fn test_run_once_missing_field() {
        let engine = Argon2Engine::new();
        let mut params = ParameterSet::new(ARGON2_UUID);
        params.set(ParamKind::Iterations, 2);
        let result = engine.run_once(&params, &CancelToken::new());
        assert!(matches!(result, Err(KdfError::InvalidParameter(_))));
    }

    #[test]
    fn test_cost_values_narrowing() {
        let mut params = ParameterSet::new(ARGON2_UUID);
        params
            .set(ParamKind::Iterations, u64::MAX)
            .set(ParamKind::Memory, u64::MAX)
            .set(ParamKind::Parallelism, u64::MAX);
        let (m, t, p) = Argon2Engine::cost_values(&params).unwrap();
        assert_eq!(t, u32::MAX);
        assert_eq!(u64::from(p), ARGON2_MAX_PARALLELISM);
        assert_eq!(u64::from(m), ARGON2_MAX_MEMORY / 1024);
    }

    #[test]
    fn test_cost_values_memory_floor_per_lane() {
        let mut params = ParameterSet::new(ARGON2_UUID);
        params
            .set(ParamKind::Iterations, 2)
            .set(ParamKind::Memory, 1024) // 1 KiB, below the per-lane floor
            .set(ParamKind::Parallelism, 4);
        let (m, _, p) = Argon2Engine::cost_values(&params).unwrap();
        assert_eq!(p, 4);
        assert_eq!(m, 32); // 8 KiB per lane
    }
}
