// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Parameter model for KDF cost negotiation.
//!
//! This module defines the data types shared by the catalog, the
//! validator, and the calibration controller:
//!
//! - [`ParamKind`] — the cost parameters a KDF may expose
//! - [`ParamRange`] / [`ParameterLimits`] — per-algorithm legal ranges
//! - [`MemoryUnit`] — UI memory units with saturating byte conversion
//! - [`ParameterSet`] — validated values, tagged with the owning algorithm
//! - [`RawParameters`] — unvalidated values as entered in a dialog

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The cost parameters a KDF algorithm may expose.
///
/// Not every algorithm supports every kind; a simple iterated hash only
/// has [`ParamKind::Iterations`]. Which kinds apply is declared by the
/// algorithm's [`ParameterLimits`], not by switching on concrete types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ParamKind {
    /// Iteration count (time cost).
    Iterations,
    /// Working memory in bytes.
    Memory,
    /// Degree of parallelism (lanes/threads).
    Parallelism,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Iterations => "Iterations",
            ParamKind::Memory => "Memory",
            ParamKind::Parallelism => "Parallelism",
        };
        f.write_str(name)
    }
}

/// Inclusive numeric range for one cost parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamRange {
    /// Smallest legal value.
    pub min: u64,
    /// Largest legal value.
    pub max: u64,
}

impl ParamRange {
    /// Creates a new inclusive range.
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Returns whether `value` lies within the range.
    pub fn contains(&self, value: u64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Forces `value` into the range.
    pub fn clamp(&self, value: u64) -> u64 {
        value.clamp(self.min, self.max)
    }
}

/// Legal parameter ranges for one KDF algorithm.
///
/// The optional fields double as capability predicates: an algorithm
/// supports memory or parallelism cost exactly when the corresponding
/// range is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLimits {
    /// Legal iteration counts.
    pub iterations: ParamRange,
    /// Legal memory sizes in bytes, per unit of parallelism for the
    /// minimum. `None` if the algorithm has no memory cost parameter.
    pub memory: Option<ParamRange>,
    /// Legal parallelism degrees. `None` if the algorithm has no
    /// parallelism parameter.
    pub parallelism: Option<ParamRange>,
}

impl ParameterLimits {
    /// Returns whether the algorithm has a memory cost parameter.
    pub fn supports_memory(&self) -> bool {
        self.memory.is_some()
    }

    /// Returns whether the algorithm has a parallelism parameter.
    pub fn supports_parallelism(&self) -> bool {
        self.parallelism.is_some()
    }

    /// Looks up the range for a parameter kind, if the algorithm
    /// supports it.
    pub fn range(&self, kind: ParamKind) -> Option<ParamRange> {
        match kind {
            ParamKind::Iterations => Some(self.iterations),
            ParamKind::Memory => self.memory,
            ParamKind::Parallelism => self.parallelism,
        }
    }
}

/// Memory units selectable in a settings dialog, each a x1024 step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum MemoryUnit {
    /// Bytes.
    Byte,
    /// Kibibytes (1024 bytes).
    Kibibyte,
    /// Mebibytes (1024 KiB).
    Mebibyte,
    /// Gibibytes (1024 MiB).
    Gibibyte,
}

impl MemoryUnit {
    /// Resolves a dialog unit-selector index (0 = B, 1 = KiB, 2 = MiB,
    /// 3 = GiB).
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(MemoryUnit::Byte),
            1 => Some(MemoryUnit::Kibibyte),
            2 => Some(MemoryUnit::Mebibyte),
            3 => Some(MemoryUnit::Gibibyte),
            _ => None,
        }
    }

    /// Multiplier relative to bytes.
    pub const fn factor(self) -> u64 {
        match self {
            MemoryUnit::Byte => 1,
            MemoryUnit::Kibibyte => 1024,
            MemoryUnit::Mebibyte => 1024 * 1024,
            MemoryUnit::Gibibyte => 1024 * 1024 * 1024,
        }
    }

    /// Converts `value` in this unit to bytes, saturating to
    /// `u64::MAX` on overflow rather than wrapping.
    pub fn to_bytes(self, value: u64) -> u64 {
        value.saturating_mul(self.factor())
    }
}

impl fmt::Display for MemoryUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MemoryUnit::Byte => "B",
            MemoryUnit::Kibibyte => "KiB",
            MemoryUnit::Mebibyte => "MiB",
            MemoryUnit::Gibibyte => "GiB",
        };
        f.write_str(name)
    }
}

/// A set of KDF cost parameter values, tagged with the owning algorithm.
///
/// A validated set satisfies every range in the algorithm's
/// [`ParameterLimits`]. Sets are created from an algorithm's defaults,
/// adjusted by the validator, or replaced wholesale by calibration, and
/// finally serialized into the database security header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSet {
    algorithm: Uuid,
    values: BTreeMap<ParamKind, u64>,
}

impl ParameterSet {
    /// Creates an empty set owned by the given algorithm.
    pub fn new(algorithm: Uuid) -> Self {
        Self {
            algorithm,
            values: BTreeMap::new(),
        }
    }

    /// Identity of the owning algorithm.
    pub fn algorithm(&self) -> Uuid {
        self.algorithm
    }

    /// Reads one parameter value.
    pub fn get(&self, kind: ParamKind) -> Option<u64> {
        self.values.get(&kind).copied()
    }

    /// Writes one parameter value, returning `self` for chaining.
    pub fn set(&mut self, kind: ParamKind, value: u64) -> &mut Self {
        self.values.insert(kind, value);
        self
    }

    /// Iteration count, if set.
    pub fn iterations(&self) -> Option<u64> {
        self.get(ParamKind::Iterations)
    }

    /// Memory in bytes, if set.
    pub fn memory(&self) -> Option<u64> {
        self.get(ParamKind::Memory)
    }

    /// Parallelism degree, if set.
    pub fn parallelism(&self) -> Option<u64> {
        self.get(ParamKind::Parallelism)
    }

    /// Iterates over the stored values in stable kind order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamKind, u64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    /// Returns whether every stored value lies inside the given limits
    /// and every limit-mandated parameter is present.
    pub fn satisfies(&self, limits: &ParameterLimits) -> bool {
        let iterations_ok = self
            .iterations()
            .is_some_and(|v| limits.iterations.contains(v));
        let memory_ok = match limits.memory {
            Some(range) => self.memory().is_some_and(|v| range.contains(v)),
            None => true,
        };
        let parallelism_ok = match limits.parallelism {
            Some(range) => self.parallelism().is_some_and(|v| range.contains(v)),
            None => true,
        };
        iterations_ok && memory_ok && parallelism_ok
    }
}

/// Raw, unvalidated numeric values as entered in a settings dialog.
///
/// Memory is carried as a magnitude plus the UI-selected unit; the
/// validator resolves it to bytes with saturation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawParameters {
    /// Requested iteration count.
    pub iterations: u64,
    /// Requested memory magnitude, in `memory_unit` units.
    pub memory: u64,
    /// Unit the memory magnitude was entered in.
    pub memory_unit: MemoryUnit,
    /// Requested parallelism degree.
    pub parallelism: u64,
}
