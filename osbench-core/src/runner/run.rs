use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use super::config::RunConfig;
use super::gate::OpGate;
use super::stats::{RunSummary, SampleCollector};
use crate::error_stats::{ErrorEntry, ErrorStatistics};
use crate::operator::Operator;
use crate::session::{Interrupt, Session};
use crate::storage::StorageApi;
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct RunReport {
    pub summary: RunSummary,
    /// Operations that ended in an abort instead of a sample.
    pub aborted_total: u64,
    /// Error statistics, one entry per failure signature.
    pub errors: Vec<ErrorEntry>,
}

/// Runs `operator` on `cfg.workers` OS threads until the op budget or deadline is exhausted,
/// or `interrupt` is raised.
pub fn run_operator(
    operator: Arc<dyn Operator>,
    api: Arc<dyn StorageApi>,
    cfg: &RunConfig,
    interrupt: Interrupt,
) -> Result<RunReport> {
    cfg.validate()?;

    let error_statistics = Arc::new(ErrorStatistics::new());
    let collector = Arc::new(SampleCollector::new());
    let gate = Arc::new(OpGate::new(cfg.ops, cfg.duration));
    let aborted = Arc::new(AtomicU64::new(0));

    tracing::info!(
        operator = operator.name(),
        op_type = %operator.op_type(),
        workers = cfg.workers,
        ops = ?cfg.ops,
        duration = ?cfg.duration,
        "starting run"
    );

    let started = Instant::now();
    gate.start_at(started);

    let mut handles = Vec::with_capacity(cfg.workers);
    for index in 0..cfg.workers {
        let mut session = Session::new(
            index,
            cfg.workers,
            api.clone(),
            collector.clone(),
            error_statistics.clone(),
        )
        .with_span(tracing::info_span!("worker", index))
        .with_interrupt(interrupt.clone());
        if let Some(seed) = cfg.seed {
            session = session.with_seed(seed.wrapping_add(index as u64));
        }

        let operator = operator.clone();
        let gate = gate.clone();
        let aborted = aborted.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("worker-{index}"))
            .spawn(move || worker_loop(operator.as_ref(), &mut session, &gate, &aborted));

        match spawned {
            Ok(handle) => handles.push((index, handle)),
            Err(err) => {
                // Stop the workers already running before surfacing the error.
                interrupt.interrupt();
                for (_, handle) in handles {
                    let _ = handle.join();
                }
                return Err(Error::WorkerSpawn(err));
            }
        }
    }

    let mut panicked = None;
    for (index, handle) in handles {
        if handle.join().is_err() && panicked.is_none() {
            panicked = Some(index);
        }
    }
    if let Some(index) = panicked {
        return Err(Error::WorkerPanicked(index));
    }

    let summary = collector.summary(started.elapsed());
    let aborted_total = aborted.load(Ordering::Relaxed);

    tracing::info!(
        ops_total = summary.ops_total,
        ops_failed = summary.ops_failed,
        aborted_total,
        error_signatures = error_statistics.len(),
        "run finished"
    );

    Ok(RunReport {
        summary,
        aborted_total,
        errors: error_statistics.snapshot(),
    })
}

fn worker_loop(operator: &dyn Operator, session: &mut Session, gate: &OpGate, aborted: &AtomicU64) {
    while !session.is_interrupted() && gate.admit() {
        if !session.api().auth_flag() {
            relogin(session);
        }

        if operator.operate(session).is_err() {
            aborted.fetch_add(1, Ordering::Relaxed);
            break;
        }
    }
}

fn relogin(session: &Session) {
    let _enter = session.span().enter();
    match session.api().login() {
        Ok(()) => {
            session.api().set_auth_flag(true);
            tracing::info!("re-authenticated with storage backend");
        }
        Err(err) => {
            tracing::warn!(error = %err, "re-authentication failed");
        }
    }
}
