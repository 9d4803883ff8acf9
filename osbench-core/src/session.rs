use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::Span;

use crate::error_stats::ErrorStatistics;
use crate::listener::OperationListener;
use crate::storage::StorageApi;

/// Cooperative cancellation flag shared between a run and its workers.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Per-worker execution context handed to [`Operator::operate`](crate::Operator::operate).
pub struct Session {
    index: usize,
    total_workers: usize,
    rng: StdRng,
    span: Span,
    api: Arc<dyn StorageApi>,
    listener: Arc<dyn OperationListener>,
    error_statistics: Arc<ErrorStatistics>,
    interrupt: Interrupt,
}

impl Session {
    /// `index` must be below `total_workers`.
    pub fn new(
        index: usize,
        total_workers: usize,
        api: Arc<dyn StorageApi>,
        listener: Arc<dyn OperationListener>,
        error_statistics: Arc<ErrorStatistics>,
    ) -> Self {
        Self {
            index,
            total_workers: total_workers.max(1),
            rng: StdRng::from_os_rng(),
            span: Span::none(),
            api,
            listener,
            error_statistics,
            interrupt: Interrupt::default(),
        }
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Span the operator logs into. Without one, events go straight to the default
    /// subscriber.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total_workers(&self) -> usize {
        self.total_workers
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn api(&self) -> &dyn StorageApi {
        self.api.as_ref()
    }

    pub fn listener(&self) -> &dyn OperationListener {
        self.listener.as_ref()
    }

    pub fn error_statistics(&self) -> &ErrorStatistics {
        &self.error_statistics
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_interrupted()
    }
}
