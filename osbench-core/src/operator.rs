use std::fmt::Display;
use std::sync::Arc;

use crate::failure::Failure;
use crate::session::Session;
use crate::{Config, Error, Result};

mod counting;
mod lister;

pub use counting::CountingSink;
pub use lister::Lister;

/// Operation type tag identifying an operator variant.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum OpType {
    List,
}

impl OpType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// The operation was cancelled before it could produce a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("operation aborted")]
pub struct Aborted;

/// Identity, weight and configuration shared by every operator variant.
#[derive(Debug, Clone)]
pub struct OperatorBase {
    id: String,
    name: String,
    ratio: u32,
    division: String,
    op_type: OpType,
    config: Config,
}

impl OperatorBase {
    /// The display name comes from the `name` config key and defaults to the type tag.
    pub fn init(
        id: impl Into<String>,
        ratio: u32,
        division: impl Into<String>,
        config: Config,
        op_type: OpType,
    ) -> Self {
        let name = config
            .get("name")
            .map_or_else(|| op_type.to_string(), str::to_string);

        Self {
            id: id.into(),
            name,
            ratio,
            division: division.into(),
            op_type,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ratio(&self) -> u32 {
        self.ratio
    }

    pub fn division(&self) -> &str {
        &self.division
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    pub fn sample_type(&self) -> &'static str {
        self.op_type.as_str()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// A configured benchmark operation.
///
/// One instance is shared read-only by every worker thread of its slot.
pub trait Operator: Send + Sync {
    fn base(&self) -> &OperatorBase;

    fn id(&self) -> &str {
        self.base().id()
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    fn ratio(&self) -> u32 {
        self.base().ratio()
    }

    fn op_type(&self) -> OpType {
        self.base().op_type()
    }

    fn sample_type(&self) -> &'static str {
        self.base().sample_type()
    }

    /// Runs one operation for the session's worker.
    fn operate(&self, session: &mut Session) -> std::result::Result<(), Aborted> {
        let index = session.index();
        let total = session.total_workers();
        self.operate_as(index, total, session)
    }

    /// Timed operation body.
    ///
    /// Every failure must end up as a failed sample; [`Aborted`] is the only error that may
    /// escape.
    fn operate_as(
        &self,
        index: usize,
        total: usize,
        session: &mut Session,
    ) -> std::result::Result<(), Aborted>;
}

/// Builds the operator variant registered for `op_type`.
pub fn create_operator(
    op_type: &str,
    id: &str,
    ratio: u32,
    division: &str,
    config: Config,
) -> Result<Arc<dyn Operator>> {
    let ty: OpType = op_type
        .trim()
        .parse()
        .map_err(|_| Error::UnknownOperation(op_type.to_string()))?;

    match ty {
        OpType::List => Ok(Arc::new(Lister::new(id, ratio, division, config)?)),
    }
}

pub fn log_debug(session: &Session, message: impl Display) {
    session.span().in_scope(|| tracing::debug!("{message}"));
}

pub fn log_info(session: &Session, message: impl Display) {
    session.span().in_scope(|| tracing::info!("{message}"));
}

pub fn log_warn(session: &Session, message: impl Display) {
    session.span().in_scope(|| tracing::warn!("{message}"));
}

pub fn log_warn_with(session: &Session, message: impl Display, failure: &Failure) {
    session.span().in_scope(|| {
        tracing::warn!(error = %failure, origin = ?failure.origin(), "{message}");
    });
}

pub fn log_error(session: &Session, message: impl Display) {
    session.span().in_scope(|| tracing::error!("{message}"));
}

pub fn log_error_with(session: &Session, message: impl Display, failure: &Failure) {
    session.span().in_scope(|| {
        tracing::error!(error = %failure, origin = ?failure.origin(), "{message}");
    });
}

/// Adds `failure` to the run's error statistics under `target`.
///
/// The first occurrence of a signature is logged at error level while the statistics
/// lock is held, so the log line precedes any repeat; repeats are only appended to the
/// signature's target list.
pub fn error_statistics_handle(failure: &Failure, session: &Session, target: &str) {
    let signature = failure.signature();
    if signature.is_none() {
        tracing::debug!(error = %failure, "failure has no origin location; grouping it without a signature");
    }

    session
        .error_statistics()
        .record_with(signature, failure, target, || {
            log_error_with(
                session,
                format_args!(
                    "worker {} fail to perform operation {target}",
                    session.index()
                ),
                failure,
            );
        });
}

/// Flags the backend as unauthorized when the failure message mentions `401`.
///
/// The match is a plain substring test on the message.
pub fn is_unauthorized_failure(failure: &Failure, session: &Session) -> bool {
    if !failure.message().contains("401") {
        return false;
    }

    session.api().set_auth_flag(false);
    log_debug(
        session,
        "caught 401 error from storage backend, set auth flag to false",
    );
    true
}
