use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::operator::OperatorBase;

/// Timing and volume of a successful operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timing {
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    elapsed: Duration,
    #[serde(rename = "xfer_ms", serialize_with = "serialize_millis")]
    xfer: Duration,
    bytes: u64,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(duration_millis(*d))
}

fn duration_millis(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}

impl Timing {
    /// `xfer` is measured inside the `elapsed` window and must not exceed it.
    #[must_use]
    pub fn new(elapsed: Duration, xfer: Duration, bytes: u64) -> Self {
        debug_assert!(
            xfer <= elapsed,
            "transfer time {xfer:?} exceeds elapsed time {elapsed:?}"
        );
        Self {
            elapsed,
            xfer,
            bytes,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn xfer(&self) -> Duration {
        self.xfer
    }

    pub fn elapsed_ms(&self) -> u64 {
        duration_millis(self.elapsed)
    }

    pub fn xfer_ms(&self) -> u64 {
        duration_millis(self.xfer)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

/// Outcome of one operation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    timestamp: DateTime<Utc>,
    op_id: String,
    op_type: String,
    sample_type: String,
    op_name: String,
    succ: bool,
    #[serde(flatten)]
    timing: Option<Timing>,
}

impl Sample {
    pub fn succeeded(op: &OperatorBase, timing: Timing) -> Self {
        Self::build(op, Some(timing))
    }

    pub fn failed(op: &OperatorBase) -> Self {
        Self::build(op, None)
    }

    fn build(op: &OperatorBase, timing: Option<Timing>) -> Self {
        Self {
            timestamp: Utc::now(),
            op_id: op.id().to_string(),
            op_type: op.op_type().to_string(),
            sample_type: op.sample_type().to_string(),
            op_name: op.name().to_string(),
            succ: timing.is_some(),
            timing,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn op_id(&self) -> &str {
        &self.op_id
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn sample_type(&self) -> &str {
        &self.sample_type
    }

    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    pub fn is_succ(&self) -> bool {
        self.succ
    }

    /// Present iff the sample is successful.
    pub fn timing(&self) -> Option<&Timing> {
        self.timing.as_ref()
    }
}

/// Result-stream projection of a [`Sample`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationResult {
    timestamp: DateTime<Utc>,
    op_id: String,
    op_type: String,
    sample_type: String,
    op_name: String,
    succ: bool,
}

impl OperationResult {
    pub fn from_sample(sample: &Sample) -> Self {
        Self {
            timestamp: sample.timestamp,
            op_id: sample.op_id.clone(),
            op_type: sample.op_type.clone(),
            sample_type: sample.sample_type.clone(),
            op_name: sample.op_name.clone(),
            succ: sample.succ,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn op_id(&self) -> &str {
        &self.op_id
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn sample_type(&self) -> &str {
        &self.sample_type
    }

    pub fn op_name(&self) -> &str {
        &self.op_name
    }

    pub fn is_succ(&self) -> bool {
        self.succ
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::operator::OpType;

    fn base() -> OperatorBase {
        OperatorBase::init("op-1", 100, "none", Config::new(), OpType::List)
    }

    #[test]
    fn failed_sample_has_no_timing() {
        let s = Sample::failed(&base());
        assert!(!s.is_succ());
        assert!(s.timing().is_none());
        assert_eq!(s.op_type(), "list");
        assert_eq!(s.op_name(), "list");
        assert_eq!(s.op_id(), "op-1");
    }

    #[test]
    fn successful_sample_reports_milliseconds() {
        let s = Sample::succeeded(
            &base(),
            Timing::new(Duration::from_micros(12_900), Duration::from_millis(4), 512),
        );
        assert!(s.is_succ());
        let t = match s.timing() {
            Some(t) => t,
            None => panic!("expected timing"),
        };
        assert_eq!(t.elapsed_ms(), 12);
        assert_eq!(t.xfer_ms(), 4);
        assert_eq!(t.bytes(), 512);
    }

    #[test]
    fn transfer_within_elapsed_is_kept_as_measured() {
        let t = Timing::new(Duration::from_millis(9), Duration::from_millis(3), 0);
        assert_eq!(t.xfer(), Duration::from_millis(3));
        assert_eq!(t.elapsed(), Duration::from_millis(9));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "exceeds elapsed time")]
    fn transfer_longer_than_elapsed_is_rejected() {
        let _ = Timing::new(Duration::from_millis(3), Duration::from_millis(9), 0);
    }

    #[test]
    fn result_mirrors_sample() {
        let s = Sample::failed(&base());
        let r = OperationResult::from_sample(&s);
        assert_eq!(r.timestamp(), s.timestamp());
        assert_eq!(r.is_succ(), s.is_succ());
        assert_eq!(r.op_name(), s.op_name());
        assert_eq!(r.sample_type(), s.sample_type());
    }

    #[test]
    fn sample_serializes_flat() {
        let s = Sample::succeeded(
            &base(),
            Timing::new(Duration::from_millis(7), Duration::from_millis(2), 64),
        );
        let json = match serde_json::to_value(&s) {
            Ok(v) => v,
            Err(err) => panic!("serialize: {err}"),
        };
        assert_eq!(json["succ"], serde_json::json!(true));
        assert_eq!(json["elapsed_ms"], serde_json::json!(7));
        assert_eq!(json["xfer_ms"], serde_json::json!(2));
        assert_eq!(json["bytes"], serde_json::json!(64));
    }
}
