use std::sync::Arc;
use std::time::{Duration, Instant};

use osbench_core::runner::{RunConfig, run_operator};
use osbench_core::{Config, Error, Interrupt, MockStorage, StorageApi, create_operator};

fn list_operator(config: &str) -> Arc<dyn osbench_core::Operator> {
    let config: Config = match config.parse() {
        Ok(v) => v,
        Err(err) => panic!("config: {err}"),
    };
    match create_operator("list", "op-list", 100, "container", config) {
        Ok(v) => v,
        Err(err) => panic!("create_operator: {err}"),
    }
}

#[test]
fn op_budget_is_shared_across_workers() {
    let api: Arc<dyn StorageApi> = Arc::new(MockStorage::new(2048, Duration::ZERO));
    let cfg = RunConfig {
        workers: 4,
        ops: Some(100),
        duration: None,
        seed: Some(1),
    };

    let report = match run_operator(
        list_operator("containers=u(1,8)"),
        api,
        &cfg,
        Interrupt::default(),
    ) {
        Ok(v) => v,
        Err(err) => panic!("run: {err}"),
    };

    assert_eq!(report.summary.ops_total, 100);
    assert_eq!(report.summary.ops_failed, 0);
    assert_eq!(report.summary.results_total, 100);
    assert_eq!(report.summary.bytes_total, 100 * 2048);
    assert_eq!(report.aborted_total, 0);
    assert!(report.errors.is_empty());
}

#[test]
fn without_limits_a_single_operation_runs() {
    let api: Arc<dyn StorageApi> = Arc::new(MockStorage::default());
    let cfg = RunConfig {
        workers: 3,
        ..RunConfig::default()
    };

    let report = match run_operator(list_operator(""), api, &cfg, Interrupt::default()) {
        Ok(v) => v,
        Err(err) => panic!("run: {err}"),
    };
    assert_eq!(report.summary.ops_total, 1);
}

#[test]
fn interrupt_stops_a_duration_run_early() {
    let interrupt = Interrupt::default();
    let api: Arc<dyn StorageApi> = Arc::new(
        MockStorage::new(16, Duration::from_millis(20)).with_interrupt(interrupt.clone()),
    );
    let cfg = RunConfig {
        workers: 2,
        ops: None,
        duration: Some(Duration::from_secs(30)),
        seed: None,
    };

    let trigger = interrupt.clone();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(150));
        trigger.interrupt();
    });

    let started = Instant::now();
    let report = match run_operator(list_operator(""), api, &cfg, interrupt) {
        Ok(v) => v,
        Err(err) => panic!("run: {err}"),
    };
    if stopper.join().is_err() {
        panic!("stopper panicked");
    }

    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(report.summary.ops_total > 0);
    assert_eq!(report.summary.ops_failed, 0);
    assert!(report.aborted_total <= 2);
}

#[test]
fn rejects_invalid_run_config() {
    let api: Arc<dyn StorageApi> = Arc::new(MockStorage::default());

    let zero_workers = RunConfig {
        workers: 0,
        ..RunConfig::default()
    };
    assert!(matches!(
        run_operator(list_operator(""), api.clone(), &zero_workers, Interrupt::default()),
        Err(Error::InvalidWorkers)
    ));

    let zero_ops = RunConfig {
        ops: Some(0),
        ..RunConfig::default()
    };
    assert!(matches!(
        run_operator(list_operator(""), api, &zero_ops, Interrupt::default()),
        Err(Error::InvalidOps)
    ));
}
