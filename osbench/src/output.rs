use crate::cli::OutputFormat;
use osbench_core::runner::{RunConfig, RunReport};
use osbench_core::{Operator, StorageKind};

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, storage: StorageKind, operator: &dyn Operator, cfg: &RunConfig);
    fn print_report(&self, report: &RunReport) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
