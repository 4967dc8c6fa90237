// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Parameter validation: clamping raw dialog values into an
//! algorithm's legal ranges.
//!
//! The clamp order matters: parallelism is resolved before memory,
//! because the legal memory minimum of a memory-hard function scales
//! with the resolved parallelism. Every clamp is recorded in an
//! [`AdjustmentReport`] for one-time user disclosure; a final
//! strength-policy pass runs unconditionally and silently.

use tracing::debug;
use uuid::Uuid;

use crate::catalog::{KdfCatalog, KdfEngine};
use crate::config::HOST_PARALLELISM_FACTOR;
use crate::error::{KdfError, Result};
use crate::params::{ParamKind, ParameterLimits, ParameterSet, RawParameters};

/// Ordered, human-readable trace of every correction the validator
/// performed. Empty means no raw value needed correction. Shown once,
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjustmentReport {
    lines: Vec<String>,
}

impl AdjustmentReport {
    /// Creates an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether no corrections were recorded.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The correction lines, in the order the clamps were applied.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Records one clamp as `"<Name>: <old> -> <new>."`.
    fn record(&mut self, kind: ParamKind, old: u64, new: u64) {
        debug!(parameter = %kind, old, new, "parameter clamped");
        self.lines.push(format!(
            "{}: {} -> {}.",
            kind,
            group_digits(old),
            group_digits(new)
        ));
    }
}

/// Formats a number with thousands separators ("10,000,000").
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let offset = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Final safety pass over fully-clamped parameters.
///
/// Runs unconditionally after range clamping and independently of
/// whether adjustment messages are shown; implementations strengthen
/// parameters that are legal but still cryptographically weak.
pub trait StrengthPolicy {
    /// Strengthens `params` in place. Must keep every value within
    /// `limits`.
    fn strengthen(&self, limits: &ParameterLimits, params: &mut ParameterSet);
}

/// Default policy: re-asserts the catalog minimums (including the
/// per-lane memory floor). A no-op on anything the validator already
/// clamped, but a guard for callers that construct sets by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumStrengthPolicy;

impl StrengthPolicy for MinimumStrengthPolicy {
    fn strengthen(&self, limits: &ParameterLimits, params: &mut ParameterSet) {
        if let Some(iterations) = params.iterations() {
            params.set(ParamKind::Iterations, limits.iterations.clamp(iterations));
        }
        let parallelism = params.parallelism().unwrap_or(1);
        if let (Some(range), Some(memory)) = (limits.memory, params.memory()) {
            let floor = range.min.saturating_mul(parallelism).min(range.max);
            params.set(ParamKind::Memory, memory.clamp(floor, range.max));
        }
    }
}

/// Clamps raw dialog values into a legal [`ParameterSet`] for `engine`.
///
/// Clamp order (later clamps depend on earlier ones):
///
/// 1. iterations into the algorithm's range;
/// 2. parallelism into `[min, min(max, host_cpus * 2)]` — the
///    host-aware cap, because parallelism configured on one machine
///    must stay sensible on another opening the same data;
/// 3. memory, converted from its UI unit with saturation, into
///    `[min_memory * resolved_parallelism, max_memory]`;
/// 4. the unconditional, report-silent strength-policy pass.
///
/// The returned set always satisfies the engine's limits, and the
/// report is empty iff no raw value needed correction. Parameters the
/// algorithm does not support are ignored entirely.
pub fn validate(
    engine: &dyn KdfEngine,
    raw: &RawParameters,
    host_cpus: u32,
    policy: &dyn StrengthPolicy,
) -> (ParameterSet, AdjustmentReport) {
    let limits = engine.limits();
    let mut params = engine.default_params();
    let mut report = AdjustmentReport::new();

    let iterations = limits.iterations.clamp(raw.iterations);
    if iterations != raw.iterations {
        report.record(ParamKind::Iterations, raw.iterations, iterations);
    }
    params.set(ParamKind::Iterations, iterations);

    // Parallelism before memory: the memory floor scales with it.
    let mut resolved_parallelism = 1u64;
    if let Some(range) = limits.parallelism {
        let host_cap = u64::from(host_cpus.max(1)).saturating_mul(HOST_PARALLELISM_FACTOR);
        let effective_max = range.max.min(host_cap).max(range.min);
        let parallelism = raw.parallelism.clamp(range.min, effective_max);
        if parallelism != raw.parallelism {
            report.record(ParamKind::Parallelism, raw.parallelism, parallelism);
        }
        params.set(ParamKind::Parallelism, parallelism);
        resolved_parallelism = parallelism;
    }

    if let Some(range) = limits.memory {
        let requested = raw.memory_unit.to_bytes(raw.memory);
        let floor = range.min.saturating_mul(resolved_parallelism).min(range.max);
        let memory = requested.clamp(floor, range.max);
        if memory != requested {
            report.record(ParamKind::Memory, requested, memory);
        }
        params.set(ParamKind::Memory, memory);
    }

    policy.strengthen(&limits, &mut params);

    (params, report)
}

/// Catalog-level entry point: resolves the algorithm by identity, then
/// validates.
///
/// # Errors
///
/// Returns `KdfError::UnknownAlgorithm` without side effects when the
/// identity is not registered (e.g., a removed plugin); the caller must
/// preserve its existing persisted parameters untouched.
pub fn validate_for(
    catalog: &KdfCatalog,
    algorithm: Uuid,
    raw: &RawParameters,
    host_cpus: u32,
    policy: &dyn StrengthPolicy,
) -> Result<(ParameterSet, AdjustmentReport)> {
    let engine = catalog
        .by_uuid(algorithm)
        .ok_or(KdfError::UnknownAlgorithm(algorithm))?;
    Ok(validate(engine.as_ref(), raw, host_cpus, policy))
}
