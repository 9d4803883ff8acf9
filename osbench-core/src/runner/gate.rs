use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Admission control for operations, shared by every worker of a run.
///
/// Stops admitting once `ops` operations were handed out or the `duration` deadline has
/// passed. With neither limit set it admits exactly one operation.
#[derive(Debug)]
pub struct OpGate {
    issued: AtomicU64,
    ops: Option<u64>,
    duration: Option<Duration>,
    deadline: OnceLock<Instant>,
}

impl OpGate {
    pub fn new(ops: Option<u64>, duration: Option<Duration>) -> Self {
        Self {
            issued: AtomicU64::new(0),
            ops,
            duration,
            deadline: OnceLock::new(),
        }
    }

    pub fn start_at(&self, started: Instant) {
        if let Some(duration) = self.duration {
            let _ = self.deadline.set(started + duration);
        }
    }

    pub fn admit(&self) -> bool {
        if self.duration.is_some() {
            let now = Instant::now();
            if self.deadline.get().is_none() {
                self.start_at(now);
            }
            if let Some(deadline) = self.deadline.get()
                && now >= *deadline
            {
                return false;
            }
        }

        let limit = match (self.ops, self.duration) {
            (Some(ops), _) => ops,
            (None, Some(_)) => return true,
            (None, None) => 1,
        };

        // Check before incrementing so the counter stays at `limit` once exhausted.
        let mut cur = self.issued.load(Ordering::Relaxed);
        loop {
            if cur >= limit {
                return false;
            }
            match self.issued.compare_exchange_weak(
                cur,
                cur + 1,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(observed) => cur = observed,
            }
        }
    }

    /// Operations admitted so far (only tracked when an op budget applies).
    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn op_budget_is_shared_across_threads() {
        let gate = Arc::new(OpGate::new(Some(1000), None));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || {
                    let mut n = 0u64;
                    while gate.admit() {
                        n += 1;
                    }
                    n
                })
            })
            .collect();

        let mut total = 0;
        for h in handles {
            match h.join() {
                Ok(n) => total += n,
                Err(_) => panic!("gate thread panicked"),
            }
        }
        assert_eq!(total, 1000);
        assert_eq!(gate.issued(), 1000);
    }

    #[test]
    fn no_limits_admits_once() {
        let gate = OpGate::new(None, None);
        assert!(gate.admit());
        assert!(!gate.admit());
    }

    #[test]
    fn deadline_stops_admission() {
        let gate = OpGate::new(None, Some(Duration::from_millis(20)));
        gate.start_at(Instant::now());
        assert!(gate.admit());
        std::thread::sleep(Duration::from_millis(40));
        assert!(!gate.admit());
    }

    #[test]
    fn budget_and_deadline_both_apply() {
        let gate = OpGate::new(Some(2), Some(Duration::from_secs(60)));
        assert!(gate.admit());
        assert!(gate.admit());
        assert!(!gate.admit());
    }
}
