use serde::Serialize;
use std::io::Write as _;

use osbench_core::runner::{RunConfig, RunReport, RunSummary};
use osbench_core::{ErrorSummary, Operator, StorageKind};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, _storage: StorageKind, _operator: &dyn Operator, _cfg: &RunConfig) {}

    fn print_report(&self, report: &RunReport) -> anyhow::Result<()> {
        let line = build_summary_line(report);
        emit_json_line(&line)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct JsonSummaryLine<'a> {
    pub kind: &'static str,
    #[serde(flatten)]
    pub summary: &'a RunSummary,
    pub aborted_total: u64,
    pub errors: Vec<ErrorSummary>,
}

fn build_summary_line(report: &RunReport) -> JsonSummaryLine<'_> {
    JsonSummaryLine {
        kind: "summary",
        summary: &report.summary,
        aborted_total: report.aborted_total,
        errors: report.errors.iter().map(|e| e.summary()).collect(),
    }
}

fn emit_json_line<T: Serialize>(line: &T) -> anyhow::Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer(&mut out, line)?;
    writeln!(out)?;
    Ok(())
}
