use anyhow::Context as _;
use std::sync::Arc;

use osbench_core::runner::{RunConfig, RunReport, run_operator};
use osbench_core::{Config, Interrupt, MockStorage, StorageApi, StorageKind, create_operator};
use osbench_http::HttpStorage;

use crate::cli::RunArgs;
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn run(args: RunArgs) -> Result<ExitCode, RunError> {
    let out = output::formatter(args.output);

    let storage_config = parse_config("--storage-config", &args.storage_config)
        .map_err(RunError::InvalidInput)?;
    let op_config =
        parse_config("--op-config", &args.op_config).map_err(RunError::InvalidInput)?;

    let interrupt = Interrupt::default();
    let api = build_storage(args.storage, &storage_config, &interrupt)
        .map_err(RunError::InvalidInput)?;

    let operator = create_operator(
        &args.op,
        &args.op_id,
        args.ratio,
        &args.division.to_string(),
        op_config,
    )
    .context("invalid operation")
    .map_err(RunError::InvalidInput)?;

    let cfg = run_config(&args);
    cfg.validate()
        .context("invalid run options")
        .map_err(RunError::InvalidInput)?;

    out.print_header(args.storage, operator.as_ref(), &cfg);

    let watcher = {
        let interrupt = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, stopping workers");
                interrupt.interrupt();
            }
        })
    };

    let report = run_workers(operator, api, cfg, interrupt).await;
    watcher.abort();
    let report = report.map_err(RunError::RuntimeError)?;

    out.print_report(&report).map_err(RunError::RuntimeError)?;

    Ok(ExitCode::from_failed_ops(report.summary.ops_failed))
}

fn parse_config(flag: &str, raw: &str) -> anyhow::Result<Config> {
    raw.parse::<Config>()
        .with_context(|| format!("invalid {flag} `{raw}`"))
}

fn build_storage(
    kind: StorageKind,
    config: &Config,
    interrupt: &Interrupt,
) -> anyhow::Result<Arc<dyn StorageApi>> {
    let api: Arc<dyn StorageApi> = match kind {
        StorageKind::Mock => Arc::new(
            MockStorage::from_config(config)
                .context("invalid mock storage config")?
                .with_interrupt(interrupt.clone()),
        ),
        StorageKind::Http => Arc::new(
            HttpStorage::from_config(config, tokio::runtime::Handle::current())
                .context("invalid http storage config")?
                .with_interrupt(interrupt.clone()),
        ),
    };
    Ok(api)
}

fn run_config(args: &RunArgs) -> RunConfig {
    RunConfig {
        workers: args.workers,
        ops: args.ops,
        duration: args.duration,
        seed: args.seed,
    }
}

/// Workers block on storage calls, so the pool runs off the async executor.
async fn run_workers(
    operator: Arc<dyn osbench_core::Operator>,
    api: Arc<dyn StorageApi>,
    cfg: RunConfig,
    interrupt: Interrupt,
) -> anyhow::Result<RunReport> {
    tokio::task::spawn_blocking(move || run_operator(operator, api, &cfg, interrupt))
        .await
        .context("worker pool join failed")?
        .context("run failed")
}
