use std::time::Duration;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub workers: usize,
    /// Total operations across all workers.
    pub ops: Option<u64>,
    pub duration: Option<Duration>,
    /// Base seed for the workers' random sources (worker `i` uses `seed + i`).
    pub seed: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            ops: None,
            duration: None,
            seed: None,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::InvalidWorkers);
        }
        if self.ops == Some(0) {
            return Err(Error::InvalidOps);
        }
        Ok(())
    }
}
