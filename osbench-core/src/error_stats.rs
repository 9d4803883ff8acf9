use std::collections::HashMap;
use std::sync::Mutex;

use serde::Serialize;

use crate::failure::Failure;

/// Run-scoped aggregation of unclassified failures.
///
/// Failures are grouped by [`Failure::signature`]; each group keeps the first failure seen
/// for it and every target that hit it, in arrival order. A missing signature is a valid
/// group of its own.
#[derive(Debug, Default)]
pub struct ErrorStatistics {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<Option<String>, ErrorEntry>,
    next_seq: u64,
}

#[derive(Debug, Clone)]
pub struct ErrorEntry {
    signature: Option<String>,
    representative: Failure,
    targets: Vec<String>,
    seq: u64,
}

/// What [`ErrorStatistics::record`] did with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// The signature was seen for the first time.
    First,
    /// The target was appended to an existing signature.
    Repeat { occurrences: usize },
}

impl ErrorStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `target` under `signature`.
    ///
    /// The lookup, insert and append happen under one lock, so concurrent workers hitting
    /// the same signature never lose a target and exactly one of them observes
    /// [`Recorded::First`].
    pub fn record(&self, signature: Option<String>, failure: &Failure, target: &str) -> Recorded {
        self.record_with(signature, failure, target, || {})
    }

    /// Like [`ErrorStatistics::record`], but runs `on_first` while the lock is still held
    /// when the signature is new.
    ///
    /// Anything `on_first` emits is ordered before any repeat of the same signature.
    /// `on_first` must not touch these statistics.
    pub fn record_with(
        &self,
        signature: Option<String>,
        failure: &Failure,
        target: &str,
        on_first: impl FnOnce(),
    ) -> Recorded {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(entry) = inner.entries.get_mut(&signature) {
            entry.targets.push(target.to_string());
            return Recorded::Repeat {
                occurrences: entry.targets.len(),
            };
        }

        let seq = inner.next_seq;
        inner.next_seq = inner.next_seq.wrapping_add(1);
        inner.entries.insert(
            signature.clone(),
            ErrorEntry {
                signature,
                representative: failure.clone(),
                targets: vec![target.to_string()],
                seq,
            },
        );
        on_first();
        Recorded::First
    }

    pub fn get(&self, signature: Option<&str>) -> Option<ErrorEntry> {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        inner
            .entries
            .get(&signature.map(str::to_string))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All groups, in the order their signatures were first seen.
    pub fn snapshot(&self) -> Vec<ErrorEntry> {
        let inner = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut entries: Vec<ErrorEntry> = inner.entries.values().cloned().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }
}

impl ErrorEntry {
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// The failure recorded when the signature was first seen.
    pub fn representative(&self) -> &Failure {
        &self.representative
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// Targets joined with `", "`. Repeated targets are kept.
    pub fn targets_joined(&self) -> String {
        self.targets.join(", ")
    }

    pub fn occurrences(&self) -> usize {
        self.targets.len()
    }

    pub fn summary(&self) -> ErrorSummary {
        ErrorSummary {
            signature: self.signature.clone(),
            message: self.representative.message().to_string(),
            occurrences: self.targets.len(),
            targets: self.targets_joined(),
        }
    }
}

/// Reporting form of an [`ErrorEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSummary {
    pub signature: Option<String>,
    pub message: String,
    pub occurrences: usize,
    pub targets: String,
}
