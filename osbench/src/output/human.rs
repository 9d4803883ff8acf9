use std::fmt::Write as _;

use osbench_core::runner::{LatencySnapshotMs, RunConfig, RunReport};
use osbench_core::{Operator, StorageKind};

mod format;

use format::{format_bytes, format_ms, format_rate};

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput;

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, storage: StorageKind, operator: &dyn Operator, cfg: &RunConfig) {
        println!("storage: {storage}");
        println!(
            "operation: {} type={} ratio={} workers={} ops={:?} duration={:?}",
            operator.name(),
            operator.op_type(),
            operator.ratio(),
            cfg.workers,
            cfg.ops,
            cfg.duration
        );
        println!();
    }

    fn print_report(&self, report: &RunReport) -> anyhow::Result<()> {
        print!("{}", render(report));
        Ok(())
    }
}

pub(crate) fn render(report: &RunReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    out.push_str("summary\n");
    writeln!(
        &mut out,
        "  operations: {} (failed {}, aborted {})",
        s.ops_total, s.ops_failed, report.aborted_total
    )
    .ok();
    writeln!(
        &mut out,
        "  bytes: {} ({}/s)",
        format_bytes(s.bytes_total),
        format_bytes(s.bytes_per_sec as u64)
    )
    .ok();
    writeln!(
        &mut out,
        "  throughput: {} ops/s over {}",
        format_rate(s.ops_per_sec),
        format_ms(s.run_duration_ms as f64)
    )
    .ok();
    let succeeded = s.ops_total.saturating_sub(s.ops_failed);
    render_latency("latency", &s.latency, succeeded, &mut out);
    render_latency("transfer", &s.xfer, succeeded, &mut out);

    if !report.errors.is_empty() {
        out.push('\n');
        writeln!(&mut out, "errors: {} distinct", report.errors.len()).ok();
        for entry in &report.errors {
            writeln!(
                &mut out,
                "  {} (x{})",
                entry.representative().message(),
                entry.occurrences()
            )
            .ok();
            writeln!(
                &mut out,
                "    at: {}",
                entry.signature().unwrap_or("<unknown origin>")
            )
            .ok();
            writeln!(&mut out, "    targets: {}", entry.targets_joined()).ok();
        }
    }

    out
}

fn render_latency(label: &str, h: &LatencySnapshotMs, succeeded: u64, out: &mut String) {
    if succeeded == 0 {
        writeln!(out, "  {label}: n/a").ok();
        return;
    }
    writeln!(
        out,
        "  {label} = p50={} p90={} p99={} mean={} max={} (n={succeeded})",
        format_ms(h.p50_ms),
        format_ms(h.p90_ms),
        format_ms(h.p99_ms),
        format_ms(h.mean_ms),
        format_ms(h.max_ms),
    )
    .ok();
}
