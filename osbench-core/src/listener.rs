use crate::sample::{OperationResult, Sample};

/// Sink for the samples and results produced by operators.
pub trait OperationListener: Send + Sync {
    fn on_sample_created(&self, sample: Sample);

    fn on_operation_completed(&self, result: OperationResult);
}
