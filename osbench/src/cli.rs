use clap::{Args, Parser, Subcommand};
use osbench_core::{Division, StorageKind};
use std::time::Duration;

fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))?;

    match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            let secs = value
                .checked_mul(60 * 60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        )),
    }
}

fn parse_storage_kind(input: &str) -> Result<StorageKind, String> {
    input
        .trim()
        .parse()
        .map_err(|_| format!("unknown storage `{input}` (expected mock or http)"))
}

fn parse_division(input: &str) -> Result<Division, String> {
    Division::parse(input).map_err(|err| err.to_string())
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary and error report.
    HumanReadable,
    /// One JSON summary line on stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "osbench",
    author,
    version,
    about = "Object storage benchmark client",
    after_help = "Examples:\n  osbench run --storage mock --workers 4 --ops 1000\n  osbench run --storage http --storage-config 'auth_url=http://127.0.0.1:8080/auth/v1.0;username=test:tester;password=testing' --op-config 'containers=u(1,32);objects=c(1)' --duration 30s"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one operation against a storage backend with a pool of workers
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Storage backend (mock, http)
    #[arg(long, value_parser = parse_storage_kind)]
    pub storage: StorageKind,

    /// Storage configuration (K=V;K2=V2)
    #[arg(long, default_value = "")]
    pub storage_config: String,

    /// Operation to run
    #[arg(long, default_value = "list")]
    pub op: String,

    /// Operation identifier reported in samples
    #[arg(long, default_value = "op1")]
    pub op_id: String,

    /// Operation configuration (K=V;K2=V2), e.g. containers=u(1,10);objects=c(1)
    #[arg(long, default_value = "")]
    pub op_config: String,

    /// How the target space is split between workers
    #[arg(long, default_value = "none", value_parser = parse_division)]
    pub division: Division,

    /// Share of the workload assigned to the operation (percent)
    #[arg(long, default_value_t = 100)]
    pub ratio: u32,

    /// Number of worker threads
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Total operations across all workers
    #[arg(long)]
    pub ops: Option<u64>,

    /// Run duration (e.g. 10s, 250ms, 1m)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Seed for the workers' random sources
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Log filter (e.g. info, osbench_core=debug); defaults to RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}
