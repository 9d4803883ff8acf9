use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::Config;
use crate::failure::Failure;

mod mock;

pub use mock::MockStorage;

/// Readable body returned by a backend call.
pub type ByteStream = Box<dyn Read + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StorageKind {
    Mock,
    Http,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum StorageErrorKind {
    Interrupted,
    Backend,
    Other,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// The calling worker was interrupted while the call was in flight.
    #[error("storage operation interrupted: {0}")]
    Interrupted(Failure),

    /// The backend recognized and categorized the failure (not found, server error, ...).
    #[error("storage backend error: {0}")]
    Backend(Failure),

    #[error("{0}")]
    Other(Failure),
}

impl StorageError {
    #[track_caller]
    pub fn interrupted(message: impl Into<String>) -> Self {
        Self::Interrupted(Failure::new(message))
    }

    #[track_caller]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(Failure::new(message))
    }

    #[track_caller]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(Failure::new(message))
    }

    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            Self::Interrupted(_) => StorageErrorKind::Interrupted,
            Self::Backend(_) => StorageErrorKind::Backend,
            Self::Other(_) => StorageErrorKind::Other,
        }
    }

    pub fn failure(&self) -> &Failure {
        match self {
            Self::Interrupted(f) | Self::Backend(f) | Self::Other(f) => f,
        }
    }

    /// Recovers a storage error carried inside an I/O error raised by a [`ByteStream`].
    ///
    /// Backends that detect a classified failure mid-stream wrap it with
    /// `std::io::Error::other(StorageError)`; anything else becomes [`StorageError::Other`]
    /// originating at the caller.
    #[track_caller]
    pub fn from_stream_error(err: std::io::Error) -> Self {
        if !err
            .get_ref()
            .is_some_and(|inner| inner.is::<StorageError>())
        {
            return Self::Other(Failure::from(err));
        }

        match err.into_inner().map(|inner| inner.downcast::<StorageError>()) {
            Some(Ok(storage)) => *storage,
            Some(Err(other)) => Self::Other(Failure::new(other.to_string())),
            None => Self::Other(Failure::new("stream read failed")),
        }
    }
}

/// Client of the object store under test.
///
/// One instance is shared by every worker of a run.
pub trait StorageApi: Send + Sync {
    /// Lists `container`, restricted to names starting with `object`.
    fn list(&self, container: &str, object: &str, config: &Config)
    -> Result<ByteStream, StorageError>;

    /// Re-authenticates against the backend.
    fn login(&self) -> Result<(), StorageError> {
        Ok(())
    }

    /// `false` once an unauthorized response has been observed and before the next login.
    fn auth_flag(&self) -> bool;

    fn set_auth_flag(&self, authorized: bool);
}

#[derive(Debug)]
pub struct AuthFlag(AtomicBool);

impl AuthFlag {
    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, authorized: bool) {
        self.0.store(authorized, Ordering::Release);
    }
}

impl Default for AuthFlag {
    fn default() -> Self {
        Self(AtomicBool::new(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_match_variants() {
        assert_eq!(
            StorageError::interrupted("x").kind(),
            StorageErrorKind::Interrupted
        );
        assert_eq!(StorageError::backend("x").kind(), StorageErrorKind::Backend);
        assert_eq!(StorageError::other("x").kind(), StorageErrorKind::Other);
        assert_eq!(StorageErrorKind::Backend.to_string(), "backend");
    }

    #[test]
    fn storage_kind_parses_from_config_strings() {
        assert_eq!("mock".parse::<StorageKind>().ok(), Some(StorageKind::Mock));
        assert_eq!("http".parse::<StorageKind>().ok(), Some(StorageKind::Http));
        assert!("s3".parse::<StorageKind>().is_err());
    }

    #[test]
    fn stream_errors_keep_embedded_classification() {
        let embedded = std::io::Error::other(StorageError::interrupted("cancelled"));
        let err = StorageError::from_stream_error(embedded);
        assert_eq!(err.kind(), StorageErrorKind::Interrupted);
        assert_eq!(err.failure().message(), "cancelled");

        let plain = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset");
        let err = StorageError::from_stream_error(plain);
        assert_eq!(err.kind(), StorageErrorKind::Other);
        assert_eq!(err.failure().message(), "connection reset");
        assert!(err.failure().signature().is_some());
    }

    #[test]
    fn auth_flag_starts_authorized() {
        let flag = AuthFlag::default();
        assert!(flag.get());
        flag.set(false);
        assert!(!flag.get());
    }
}
