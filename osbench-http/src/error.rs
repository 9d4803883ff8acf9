use std::time::Duration;

use osbench_core::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum HttpStorageErrorKind {
    InvalidUrl,
    UnsupportedScheme,
    InvalidConfig,
    MissingConfig,
    RequestBuild,
    HeaderValue,
    Request,
    Timeout,
    BodyRead,
    Status,
    MissingAuthHeader,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("only http:// and https:// URLs are supported: {0}")]
    UnsupportedScheme(String),

    #[error(transparent)]
    InvalidConfig(#[from] osbench_core::Error),

    #[error("http storage requires `{0}`")]
    MissingConfig(&'static str),

    #[error("http request build failed: {0}")]
    RequestBuild(#[from] http::Error),

    #[error("invalid http header value: {0}")]
    HeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("http request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("http request timed out after {0:?}")]
    Timeout(Duration),

    #[error("failed to read response body: {0}")]
    BodyRead(#[from] hyper::Error),

    /// Non-2xx response. Displays as `"<code> <reason>"`.
    #[error("{} {}", .0.as_u16(), .0.canonical_reason().unwrap_or("Unknown"))]
    Status(http::StatusCode),

    #[error("auth response is missing the `{0}` header")]
    MissingAuthHeader(&'static str),
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> HttpStorageErrorKind {
        match self {
            Self::InvalidUrl(_) => HttpStorageErrorKind::InvalidUrl,
            Self::UnsupportedScheme(_) => HttpStorageErrorKind::UnsupportedScheme,
            Self::InvalidConfig(_) => HttpStorageErrorKind::InvalidConfig,
            Self::MissingConfig(_) => HttpStorageErrorKind::MissingConfig,
            Self::RequestBuild(_) => HttpStorageErrorKind::RequestBuild,
            Self::HeaderValue(_) => HttpStorageErrorKind::HeaderValue,
            Self::Request(_) => HttpStorageErrorKind::Request,
            Self::Timeout(_) => HttpStorageErrorKind::Timeout,
            Self::BodyRead(_) => HttpStorageErrorKind::BodyRead,
            Self::Status(_) => HttpStorageErrorKind::Status,
            Self::MissingAuthHeader(_) => HttpStorageErrorKind::MissingAuthHeader,
        }
    }

    /// Classifies the error for the operators.
    ///
    /// Rejected credentials stay unclassified so the auth check sees the status code;
    /// every other status and request timeouts are backend failures. Each arm creates its
    /// failure at a distinct location, so the error statistics keep the causes apart.
    pub fn into_storage_error(self) -> StorageError {
        match self {
            Self::Status(status)
                if status == http::StatusCode::UNAUTHORIZED
                    || status == http::StatusCode::FORBIDDEN =>
            {
                StorageError::other(self.to_string())
            }
            Self::Status(_) => StorageError::backend(self.to_string()),
            Self::Timeout(_) => StorageError::backend(self.to_string()),
            Self::Request(_) => StorageError::other(self.to_string()),
            Self::BodyRead(_) => StorageError::other(self.to_string()),
            Self::MissingAuthHeader(_) => StorageError::other(self.to_string()),
            Self::InvalidUrl(_)
            | Self::UnsupportedScheme(_)
            | Self::InvalidConfig(_)
            | Self::MissingConfig(_)
            | Self::RequestBuild(_)
            | Self::HeaderValue(_) => StorageError::other(self.to_string()),
        }
    }
}
