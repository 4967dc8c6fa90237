// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Iterated SHA-256 engine: a simple CPU-bound KDF with a single
//! iteration-count cost parameter.
//!
//! Serves hosts and formats that cannot carry a memory-hard function.
//! Calibration times a fixed probe block and extrapolates linearly,
//! since each round costs the same.

use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand_core::TryRngCore;
use sha2::{Digest, Sha256};
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::KdfEngine;
use crate::cancel::CancelToken;
use crate::config::CANCEL_CHECK_ROUNDS;
use crate::error::{KdfError, Result};
use crate::params::{ParamKind, ParamRange, ParameterLimits, ParameterSet};

/// Stable identity of the iterated SHA-256 engine.
pub const SHA256_ROUNDS_UUID: Uuid = Uuid::from_u128(0x7c02_bb82_79a7_4af2_b05a_10a2_c2ca_7d4c);

/// Default round count, roughly in line with current guidance for
/// iterated-hash password stretching.
const DEFAULT_ROUNDS: u64 = 600_000;

/// Rounds used for the calibration probe block.
const PROBE_ROUNDS: u64 = 200_000;

/// Iterated SHA-256 key derivation engine.
///
/// Repeatedly hashes a 32-byte state; the only cost parameter is the
/// round count.
#[derive(Debug, Clone, Default)]
pub struct Sha256RoundsEngine;

impl Sha256RoundsEngine {
    /// Creates the engine.
    pub fn new() -> Self {
        Self
    }

    /// Runs `rounds` chained hash rounds over a fresh random state,
    /// polling the token between blocks of [`CANCEL_CHECK_ROUNDS`].
    fn hash_rounds(rounds: u64, cancel: &CancelToken) -> Result<Duration> {
        let mut state = Zeroizing::new([0u8; 32]);
        OsRng
            .try_fill_bytes(&mut *state)
            .map_err(|e| KdfError::ComputationFailed(format!("RNG error: {}", e)))?;

        let start = Instant::now();
        let mut done = 0u64;
        while done < rounds {
            cancel.checkpoint()?;
            let block = (rounds - done).min(CANCEL_CHECK_ROUNDS);
            for _ in 0..block {
                let digest = Sha256::digest(&*state);
                state.copy_from_slice(&digest);
            }
            done += block;
        }
        Ok(start.elapsed())
    }
}

impl KdfEngine for Sha256RoundsEngine {
    fn name(&self) -> &str {
        "SHA-256 Rounds"
    }

    fn uuid(&self) -> Uuid {
        SHA256_ROUNDS_UUID
    }

    fn limits(&self) -> ParameterLimits {
        ParameterLimits {
            iterations: ParamRange::new(1, u64::MAX),
            memory: None,
            parallelism: None,
        }
    }

    fn default_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new(self.uuid());
        params.set(ParamKind::Iterations, DEFAULT_ROUNDS);
        params
    }

    fn run_once(&self, params: &ParameterSet, cancel: &CancelToken) -> Result<Duration> {
        let rounds = params
            .iterations()
            .ok_or_else(|| KdfError::InvalidParameter("missing iteration count".into()))?;
        Self::hash_rounds(rounds, cancel)
    }

    fn calibrate(&self, target: Duration, cancel: &CancelToken) -> Result<ParameterSet> {
        let elapsed = Self::hash_rounds(PROBE_ROUNDS, cancel)?;
        let per_round = elapsed.as_secs_f64().max(1e-9) / PROBE_ROUNDS as f64;
        let rounds = (target.as_secs_f64() / per_round).round() as u64;
        debug!(
            probe_ms = elapsed.as_millis() as u64,
            rounds, "sha256 calibration extrapolated"
        );

        let mut params = ParameterSet::new(self.uuid());
        params.set(
            ParamKind::Iterations,
            self.limits().iterations.clamp(rounds.max(1)),
        );
        Ok(params)
    }
}
