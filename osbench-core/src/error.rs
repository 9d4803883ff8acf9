pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid config entry `{0}` (expected `key=value`)")]
    InvalidConfigEntry(String),

    #[error("invalid value for config key `{key}`: `{value}`")]
    InvalidConfigValue { key: String, value: String },

    #[error("invalid selector `{0}` (expected `c(n)`, `u(lo,hi)` or `s(lo,hi)`)")]
    InvalidSelector(String),

    #[error("invalid division `{0}` (expected `none`, `container` or `object`)")]
    InvalidDivision(String),

    #[error("unknown operation type `{0}`")]
    UnknownOperation(String),

    #[error("`workers` must be a positive integer")]
    InvalidWorkers,

    #[error("`ops` must be a positive integer")]
    InvalidOps,

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    #[error("worker {0} panicked")]
    WorkerPanicked(usize),
}
