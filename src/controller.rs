// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Background calibration controller.
//!
//! Runs `run_once`/`calibrate` on a dedicated worker thread so the
//! owning context (typically a UI event loop) never blocks on a
//! multi-second derivation. At most one job is active per controller;
//! cancellation is cooperative; the single outcome is delivered
//! exactly once, after the worker has fully stopped.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::catalog::KdfEngine;
use crate::error::{KdfError, Result};
use crate::params::ParameterSet;

/// Terminal result of one background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// A test run finished; one derivation took `elapsed`.
    TestCompleted {
        /// Measured wall-clock time of the derivation.
        elapsed: Duration,
    },
    /// Calibration finished with a parameter set to offer the user.
    Calibrated {
        /// The calibrated parameters; replaces the working set only if
        /// the user accepts them.
        params: ParameterSet,
    },
    /// The user cancelled; no parameter change applies and no message
    /// is shown.
    Cancelled,
    /// The computation failed; carries the user-facing message.
    Failed(String),
}

impl JobOutcome {
    /// Renders the user-facing message for this outcome, if any.
    /// Cancellation and calibration results produce none (the latter
    /// is delivered as data, not text).
    pub fn message(&self) -> Option<String> {
        match self {
            JobOutcome::TestCompleted { elapsed } => Some(format!(
                "Test succeeded. Transform time: {:.2} s.",
                elapsed.as_secs_f64()
            )),
            JobOutcome::Failed(message) => Some(message.clone()),
            JobOutcome::Calibrated { .. } | JobOutcome::Cancelled => None,
        }
    }
}

struct ActiveJob {
    token: CancelToken,
    outcome_rx: mpsc::Receiver<JobOutcome>,
    handle: thread::JoinHandle<()>,
}

/// Runs test and calibration jobs off the owning thread.
///
/// One controller instance belongs to one dialog session. The state
/// machine is explicit: `Idle` (no job) or `Running` (one job);
/// starting a second job while running is rejected with
/// [`KdfError::JobAlreadyRunning`] without disturbing the in-flight
/// job. Delivery of the outcome through [`try_outcome`] or
/// [`wait_outcome`] transitions back to `Idle`.
///
/// [`try_outcome`]: CalibrationController::try_outcome
/// [`wait_outcome`]: CalibrationController::wait_outcome
pub struct CalibrationController {
    job: Option<ActiveJob>,
}

impl CalibrationController {
    /// Creates an idle controller.
    pub fn new() -> Self {
        Self { job: None }
    }

    /// Returns whether a job is running (its outcome has not yet been
    /// delivered).
    pub fn is_running(&self) -> bool {
        self.job.is_some()
    }

    /// Starts a background test run: one timed derivation with the
    /// given parameters.
    ///
    /// # Errors
    ///
    /// `KdfError::JobAlreadyRunning` if a job is active;
    /// `KdfError::InvalidParameter` if `params` belongs to a different
    /// algorithm than `engine`.
    pub fn start_test(
        &mut self,
        engine: std::sync::Arc<dyn KdfEngine>,
        params: ParameterSet,
    ) -> Result<()> {
        if params.algorithm() != engine.uuid() {
            return Err(KdfError::InvalidParameter(format!(
                "parameter set belongs to {}, not {}",
                params.algorithm(),
                engine.uuid()
            )));
        }
        debug!(engine = engine.name(), "starting test run");
        self.spawn(move |token| {
            engine
                .run_once(&params, &token)
                .map(|elapsed| JobOutcome::TestCompleted { elapsed })
        })
    }

    /// Starts a background calibration toward `target`.
    ///
    /// # Errors
    ///
    /// `KdfError::JobAlreadyRunning` if a job is active.
    pub fn start_calibrate(
        &mut self,
        engine: std::sync::Arc<dyn KdfEngine>,
        target: Duration,
    ) -> Result<()> {
        debug!(
            engine = engine.name(),
            target_ms = target.as_millis() as u64,
            "starting calibration"
        );
        self.spawn(move |token| {
            engine
                .calibrate(target, &token)
                .map(|params| JobOutcome::Calibrated { params })
        })
    }

    fn spawn<F>(&mut self, work: F) -> Result<()>
    where
        F: FnOnce(CancelToken) -> Result<JobOutcome> + Send + 'static,
    {
        if self.job.is_some() {
            return Err(KdfError::JobAlreadyRunning);
        }

        let token = CancelToken::new();
        let worker_token = token.clone();
        let (outcome_tx, outcome_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let outcome = match catch_unwind(AssertUnwindSafe(|| work(worker_token))) {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(KdfError::Cancelled)) => JobOutcome::Cancelled,
                Ok(Err(err)) => JobOutcome::Failed(err.to_string()),
                Err(_) => JobOutcome::Failed("KDF computation failed unexpectedly.".to_string()),
            };
            // The receiver may be gone if the controller was dropped;
            // nothing left to deliver to in that case.
            let _ = outcome_tx.send(outcome);
        });

        self.job = Some(ActiveJob {
            token,
            outcome_rx,
            handle,
        });
        Ok(())
    }

    /// Requests cooperative cancellation of the in-flight job, if any.
    /// The worker abandons its computation at the next safe checkpoint;
    /// the outcome is then delivered as [`JobOutcome::Cancelled`].
    pub fn cancel(&self) {
        if let Some(job) = &self.job {
            debug!("cancellation requested");
            job.token.cancel();
        }
    }

    /// Non-blocking outcome delivery. Returns `None` while the job is
    /// still computing (or when idle); returns the outcome exactly once
    /// and transitions back to idle, joining the worker first so the
    /// computation has fully stopped before the caller acts on it.
    pub fn try_outcome(&mut self) -> Option<JobOutcome> {
        let job = self.job.take()?;
        match job.outcome_rx.try_recv() {
            Ok(outcome) => {
                let _ = job.handle.join();
                Some(outcome)
            }
            Err(mpsc::TryRecvError::Empty) => {
                self.job = Some(job);
                None
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                // The worker always sends before exiting; reaching this
                // arm means it was torn down externally.
                warn!("calibration worker vanished without an outcome");
                let _ = job.handle.join();
                Some(JobOutcome::Failed(
                    "KDF computation failed unexpectedly.".to_string(),
                ))
            }
        }
    }

    /// Blocking outcome delivery: waits for the job to finish (or
    /// acknowledge cancellation), joins the worker, and returns the
    /// outcome. Returns `None` when idle.
    pub fn wait_outcome(&mut self) -> Option<JobOutcome> {
        let job = self.job.take()?;
        let outcome = job.outcome_rx.recv().unwrap_or_else(|_| {
            warn!("calibration worker vanished without an outcome");
            JobOutcome::Failed("KDF computation failed unexpectedly.".to_string())
        });
        let _ = job.handle.join();
        Some(outcome)
    }
}

impl Default for CalibrationController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CalibrationController {
    fn drop(&mut self) {
        // Ask a still-running worker to stop; do not block on it.
        if let Some(job) = &self.job {
            job.token.cancel();
        }
    }
}
