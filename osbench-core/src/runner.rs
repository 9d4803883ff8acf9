mod config;
mod gate;
mod run;
mod stats;

pub use config::RunConfig;
pub use gate::OpGate;
pub use run::{RunReport, run_operator};
pub use stats::{LatencySnapshotMs, RunSummary, SampleCollector};
