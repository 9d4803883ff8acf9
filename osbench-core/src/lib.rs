#![forbid(unsafe_code)]

mod config;
mod error;
mod error_stats;
mod failure;
mod listener;
mod operator;
mod picker;
mod sample;
mod session;
mod storage;

pub mod runner;

pub use config::Config;
pub use error::{Error, Result};
pub use error_stats::{ErrorEntry, ErrorStatistics, ErrorSummary, Recorded};
pub use failure::Failure;
pub use listener::OperationListener;
pub use operator::{
    Aborted, CountingSink, Lister, OpType, Operator, OperatorBase, create_operator,
    error_statistics_handle, is_unauthorized_failure, log_debug, log_error, log_error_with,
    log_info, log_warn, log_warn_with,
};
pub use picker::{Division, IntSelector, ObjectPicker};
pub use sample::{OperationResult, Sample, Timing};
pub use session::{Interrupt, Session};
pub use storage::{
    AuthFlag, ByteStream, MockStorage, StorageApi, StorageError, StorageErrorKind, StorageKind,
};
