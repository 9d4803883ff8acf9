use tracing_subscriber::EnvFilter;

/// Installs the stderr log subscriber. `--log-level` wins over `RUST_LOG`; with neither,
/// only warnings and errors are shown.
pub fn init(log_level: Option<&str>) -> anyhow::Result<()> {
    let filter = match log_level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|err| anyhow::anyhow!("invalid --log-level `{level}`: {err}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install log subscriber: {err}"))
}
