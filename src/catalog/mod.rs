// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! KDF algorithm catalog.
//!
//! This module provides trait-based abstractions for key derivation
//! engines, allowing pluggable implementations of different KDF
//! algorithms, plus a registry for enumerating and resolving them.
//!
//! Algorithms declare which optional cost parameters they support via
//! their [`ParameterLimits`]; callers never switch on concrete engine
//! types, which also accommodates third-party engines without source
//! changes.

pub mod argon2;
pub mod sha256;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::params::{ParameterLimits, ParameterSet};

pub use argon2::Argon2Engine;
pub use sha256::Sha256RoundsEngine;

/// Trait for KDF engines with tunable cost parameters.
///
/// Implementors expose identity, legal parameter ranges, defaults, a
/// timed single-derivation test, and a search for parameters hitting a
/// target wall-clock duration.
pub trait KdfEngine: Send + Sync {
    /// Display name of the algorithm.
    fn name(&self) -> &str;

    /// Stable identity, preserved across releases and persisted with
    /// the parameters.
    fn uuid(&self) -> Uuid;

    /// Legal ranges for each supported cost parameter.
    fn limits(&self) -> ParameterLimits;

    /// Parameter set used when the algorithm is first selected.
    fn default_params(&self) -> ParameterSet;

    /// Runs exactly one derivation with the given parameters and
    /// returns the measured wall-clock time.
    ///
    /// Deterministic modulo system load. The token is polled at safe
    /// checkpoints; a cancelled run returns `KdfError::Cancelled`.
    ///
    /// # Errors
    ///
    /// Returns `KdfError::ComputationFailed` if the underlying
    /// primitive cannot run with these parameters on this host, and
    /// `KdfError::InvalidParameter` if the set is malformed.
    fn run_once(&self, params: &ParameterSet, cancel: &CancelToken) -> Result<Duration>;

    /// Searches for a parameter set whose [`run_once`](Self::run_once)
    /// time is close to `target`.
    ///
    /// Not guaranteed exact; coarse-grained algorithms may overshoot.
    /// The returned set always satisfies [`limits`](Self::limits).
    ///
    /// # Errors
    ///
    /// Returns `KdfError::Cancelled` if the token fires mid-search, or
    /// `KdfError::ComputationFailed` if probing fails.
    fn calibrate(&self, target: Duration, cancel: &CancelToken) -> Result<ParameterSet>;
}

/// Registry of available KDF engines.
///
/// Enumeration order is registration order, so selector population is
/// reproducible across runs.
pub struct KdfCatalog {
    engines: Vec<Arc<dyn KdfEngine>>,
}

impl KdfCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    /// Creates a catalog with the built-in engines registered:
    /// Argon2 first, then SHA-256 Rounds.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register(Arc::new(Argon2Engine::new()));
        catalog.register(Arc::new(Sha256RoundsEngine::new()));
        catalog
    }

    /// Registers an engine. Later registrations with a duplicate
    /// identity shadow nothing; the first registration wins on lookup.
    pub fn register(&mut self, engine: Arc<dyn KdfEngine>) {
        debug!(name = engine.name(), uuid = %engine.uuid(), "registered KDF engine");
        self.engines.push(engine);
    }

    /// All registered engines in registration order.
    pub fn engines(&self) -> &[Arc<dyn KdfEngine>] {
        &self.engines
    }

    /// Case-insensitive lookup by display name.
    pub fn by_name(&self, name: &str) -> Option<&Arc<dyn KdfEngine>> {
        self.engines
            .iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }

    /// Lookup by stable identity, used when parameters were loaded
    /// from persisted storage.
    pub fn by_uuid(&self, id: Uuid) -> Option<&Arc<dyn KdfEngine>> {
        self.engines.iter().find(|e| e.uuid() == id)
    }
}

impl Default for KdfCatalog {
    fn default() -> Self {
        Self::with_defaults()
    }
}
