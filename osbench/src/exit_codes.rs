#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// The run completed but one or more operations failed.
    OperationsFailed = 10,

    /// Invalid CLI/config/options (bad flags, malformed config strings, unknown operation, etc.).
    InvalidInput = 30,

    /// Internal/runtime error (worker spawn failures, panicked workers, output errors).
    RuntimeError = 40,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_failed_ops(ops_failed: u64) -> Self {
        if ops_failed > 0 {
            Self::OperationsFailed
        } else {
            Self::Success
        }
    }
}
