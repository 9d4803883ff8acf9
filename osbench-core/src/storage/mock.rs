use std::io::Read;
use std::time::{Duration, Instant};

use super::{AuthFlag, ByteStream, StorageApi, StorageError};
use crate::Config;
use crate::session::Interrupt;

const DEFAULT_LISTING_SIZE: u64 = 1024;
const DELAY_POLL: Duration = Duration::from_millis(10);

/// Storage backend that performs no I/O.
///
/// Every listing is `size` bytes long and takes at least `delay` milliseconds.
#[derive(Debug, Default)]
pub struct MockStorage {
    size: u64,
    delay: Duration,
    interrupt: Option<Interrupt>,
    auth: AuthFlag,
}

impl MockStorage {
    #[must_use]
    pub fn new(size: u64, delay: Duration) -> Self {
        Self {
            size,
            delay,
            interrupt: None,
            auth: AuthFlag::default(),
        }
    }

    pub fn from_config(config: &Config) -> crate::Result<Self> {
        Ok(Self::new(
            config.get_u64_or("size", DEFAULT_LISTING_SIZE)?,
            config.get_millis_or("delay", Duration::ZERO)?,
        ))
    }

    /// Makes the simulated delay observe the run's interrupt.
    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    fn wait(&self) -> Result<(), StorageError> {
        if self.delay.is_zero() {
            return Ok(());
        }

        let deadline = Instant::now() + self.delay;
        loop {
            if self.interrupt.as_ref().is_some_and(Interrupt::is_interrupted) {
                return Err(StorageError::interrupted("mock storage call interrupted"));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            std::thread::sleep(DELAY_POLL.min(deadline - now));
        }
    }
}

impl StorageApi for MockStorage {
    fn list(
        &self,
        _container: &str,
        _object: &str,
        _config: &Config,
    ) -> Result<ByteStream, StorageError> {
        self.wait()?;
        Ok(Box::new(std::io::repeat(b'x').take(self.size)))
    }

    fn auth_flag(&self) -> bool {
        self.auth.get()
    }

    fn set_auth_flag(&self, authorized: bool) {
        self.auth.set(authorized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_has_configured_size() {
        let cfg: Config = match "size=4096".parse() {
            Ok(v) => v,
            Err(err) => panic!("config: {err}"),
        };
        let storage = match MockStorage::from_config(&cfg) {
            Ok(v) => v,
            Err(err) => panic!("mock storage: {err}"),
        };

        let mut stream = match storage.list("c", "o", &Config::new()) {
            Ok(s) => s,
            Err(err) => panic!("list failed: {err}"),
        };
        let copied = match std::io::copy(&mut stream, &mut std::io::sink()) {
            Ok(n) => n,
            Err(err) => panic!("copy failed: {err}"),
        };
        assert_eq!(copied, 4096);
    }

    #[test]
    fn interrupted_delay_reports_interruption() {
        let interrupt = Interrupt::default();
        interrupt.interrupt();
        let storage =
            MockStorage::new(1, Duration::from_secs(5)).with_interrupt(interrupt.clone());

        let started = Instant::now();
        match storage.list("c", "o", &Config::new()) {
            Ok(_) => panic!("expected interruption"),
            Err(err) => assert!(matches!(err, StorageError::Interrupted(_))),
        }
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
