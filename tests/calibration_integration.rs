// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 KdfTune Contributors
//! Integration tests for KDF calibration and the background controller.
//!
//! These tests verify that calibration produces valid, achievable
//! parameters on the current hardware, that calibrated parameters beat
//! the defaults at approaching the target, and that the full
//! validate -> test -> calibrate dialog flow holds together.

use std::sync::Arc;
use std::time::Duration;

use kdftune::{
    validate_parameters, CalibrationController, CancelToken, JobOutcome, KdfCatalog, KdfEngine,
    MemoryUnit, ParamKind, ParameterSet, RawParameters,
};

/// Default one-second target, used by the convergence test.
const TARGET: Duration = Duration::from_millis(1000);

#[test]
fn sha256_calibration_converges_toward_target() {
    let catalog = KdfCatalog::with_defaults();
    let engine = catalog.by_name("SHA-256 Rounds").unwrap();
    let token = CancelToken::new();

    let calibrated = engine.calibrate(TARGET, &token).unwrap();
    assert!(calibrated.satisfies(&engine.limits()));

    let calibrated_elapsed = engine.run_once(&calibrated, &token).unwrap();
    let default_elapsed = engine.run_once(&engine.default_params(), &token).unwrap();

    // Not exact, but closer to the target than the defaults are.
    let calibrated_distance = calibrated_elapsed.abs_diff(TARGET);
    let default_distance = default_elapsed.abs_diff(TARGET);
    assert!(
        calibrated_distance < default_distance,
        "calibrated {:?} should be closer to {:?} than default {:?}",
        calibrated_elapsed,
        TARGET,
        default_elapsed
    );
}

#[test]
fn argon2_calibration_is_achievable() {
    let catalog = KdfCatalog::with_defaults();
    let engine = catalog.by_name("Argon2").unwrap();
    let token = CancelToken::new();

    let calibrated = engine.calibrate(Duration::from_millis(200), &token).unwrap();
    assert!(calibrated.satisfies(&engine.limits()));

    // The calibrated set must actually be derivable on this host.
    let elapsed = engine.run_once(&calibrated, &token).unwrap();
    assert!(elapsed > Duration::ZERO);
}

#[test]
fn calibration_respects_cancellation() {
    let catalog = KdfCatalog::with_defaults();
    let engine = catalog.by_name("SHA-256 Rounds").unwrap();
    let token = CancelToken::new();
    token.cancel();

    let result = engine.calibrate(TARGET, &token);
    assert!(result.is_err());
}

#[test]
fn dialog_flow_validate_then_test_then_calibrate() {
    let catalog = KdfCatalog::with_defaults();
    let engine: Arc<dyn KdfEngine> =
        Arc::clone(catalog.by_name("SHA-256 Rounds").unwrap());

    // 1. The dialog commits raw values; validation clamps them.
    let raw = RawParameters {
        iterations: 50_000,
        memory: 0,
        memory_unit: MemoryUnit::Byte,
        parallelism: 0,
    };
    let (committed, report) = validate_parameters(&catalog, engine.uuid(), &raw).unwrap();
    assert!(report.is_empty());

    // 2. The user presses "Test": one timed run in the background.
    let mut controller = CalibrationController::new();
    controller
        .start_test(Arc::clone(&engine), committed.clone())
        .unwrap();
    let outcome = controller.wait_outcome().unwrap();
    match &outcome {
        JobOutcome::TestCompleted { elapsed } => assert!(*elapsed > Duration::ZERO),
        other => panic!("expected TestCompleted, got {:?}", other),
    }
    assert!(outcome
        .message()
        .unwrap()
        .starts_with("Test succeeded. Transform time:"));

    // 3. The user presses "1 second delay": calibration replaces the
    //    working set only when it completes.
    controller
        .start_calibrate(Arc::clone(&engine), Duration::from_millis(50))
        .unwrap();
    let outcome = controller.wait_outcome().unwrap();
    let calibrated = match outcome {
        JobOutcome::Calibrated { params } => params,
        other => panic!("expected Calibrated, got {:?}", other),
    };
    assert_eq!(calibrated.algorithm(), engine.uuid());
    assert!(calibrated.satisfies(&engine.limits()));
}

#[test]
fn cancelled_job_leaves_committed_parameters_unchanged() {
    let catalog = KdfCatalog::with_defaults();
    let engine: Arc<dyn KdfEngine> =
        Arc::clone(catalog.by_name("SHA-256 Rounds").unwrap());

    let mut committed = ParameterSet::new(engine.uuid());
    committed.set(ParamKind::Iterations, 123_456);
    let before = committed.clone();

    let mut long_running = ParameterSet::new(engine.uuid());
    long_running.set(ParamKind::Iterations, u64::MAX / 2);

    let mut controller = CalibrationController::new();
    controller
        .start_test(Arc::clone(&engine), long_running)
        .unwrap();
    controller.cancel();
    let outcome = controller.wait_outcome().unwrap();

    assert_eq!(outcome, JobOutcome::Cancelled);
    assert!(outcome.message().is_none());
    assert_eq!(committed, before);
}

#[test]
fn second_job_rejected_without_disturbing_first() {
    let catalog = KdfCatalog::with_defaults();
    let engine: Arc<dyn KdfEngine> =
        Arc::clone(catalog.by_name("SHA-256 Rounds").unwrap());

    let mut params = ParameterSet::new(engine.uuid());
    params.set(ParamKind::Iterations, 2_000_000);

    let mut controller = CalibrationController::new();
    controller
        .start_test(Arc::clone(&engine), params.clone())
        .unwrap();

    // A second start is rejected while the first is running.
    assert!(controller
        .start_calibrate(Arc::clone(&engine), TARGET)
        .is_err());

    // The first job still completes normally.
    let outcome = controller.wait_outcome().unwrap();
    assert!(matches!(outcome, JobOutcome::TestCompleted { .. }));
}
