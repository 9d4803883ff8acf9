use std::fmt;
use std::panic::Location;

/// A failure raised while performing a storage operation.
///
/// Besides the message, a failure remembers the source location that created it and,
/// optionally, the failure that caused it. Those locations form the failure's
/// [`signature`](Failure::signature), which is what the error statistics aggregate on.
#[derive(Debug, Clone)]
pub struct Failure {
    message: String,
    origin: Option<&'static Location<'static>>,
    cause: Option<Box<Failure>>,
}

impl Failure {
    /// Creates a failure originating at the caller's location.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: Some(Location::caller()),
            cause: None,
        }
    }

    /// Creates a failure with no known origin. Its signature is absent.
    pub fn untraced(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            origin: None,
            cause: None,
        }
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Failure) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn origin(&self) -> Option<&'static Location<'static>> {
        self.origin
    }

    pub fn cause(&self) -> Option<&Failure> {
        self.cause.as_deref()
    }

    /// Deduplication key: the origin location, followed by the cause's origin if the
    /// cause has one.
    ///
    /// Returns `None` when this failure has no origin.
    pub fn signature(&self) -> Option<String> {
        let origin = self.origin?;
        let mut signature = origin.to_string();
        if let Some(cause_origin) = self.cause.as_ref().and_then(|c| c.origin) {
            signature.push_str(&cause_origin.to_string());
        }
        Some(signature)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Failure {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}
