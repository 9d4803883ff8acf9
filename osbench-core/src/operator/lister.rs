use std::io;
use std::time::{Duration, Instant};

use super::{
    Aborted, CountingSink, OpType, Operator, OperatorBase, error_statistics_handle,
    is_unauthorized_failure, log_debug, log_error_with, log_warn_with,
};
use crate::picker::ObjectPicker;
use crate::sample::{OperationResult, Sample, Timing};
use crate::session::Session;
use crate::storage::StorageError;
use crate::{Config, Result};

/// Lists a container (restricted to an object-name prefix) and drains the listing.
#[derive(Debug)]
pub struct Lister {
    base: OperatorBase,
    picker: ObjectPicker,
}

impl Lister {
    pub const OP_TYPE: OpType = OpType::List;

    pub fn new(id: &str, ratio: u32, division: &str, config: Config) -> Result<Self> {
        let picker = ObjectPicker::for_lister(division, &config)?;
        Ok(Self {
            base: OperatorBase::init(id, ratio, division, config, Self::OP_TYPE),
            picker,
        })
    }

    fn do_list(
        &self,
        container: &str,
        object: &str,
        session: &Session,
    ) -> std::result::Result<Sample, Aborted> {
        if session.is_interrupted() {
            return Err(Aborted);
        }

        let mut sink = CountingSink::new(io::sink());
        let start = Instant::now();
        log_debug(
            session,
            format_args!(
                "worker {} List target {container}/{object}",
                session.index()
            ),
        );

        match self.transfer(container, object, session, &mut sink) {
            Ok(xfer) => Ok(Sample::succeeded(
                &self.base,
                Timing::new(start.elapsed(), xfer, sink.byte_count()),
            )),
            Err(StorageError::Interrupted(failure)) => {
                log_error_with(session, failure.message(), &failure);
                Err(Aborted)
            }
            Err(StorageError::Backend(failure)) => {
                log_warn_with(
                    session,
                    format_args!("List failed: {container}/{object}"),
                    &failure,
                );
                Ok(Sample::failed(&self.base))
            }
            Err(StorageError::Other(failure)) => {
                is_unauthorized_failure(&failure, session);
                error_statistics_handle(&failure, session, &format!("{container}/{object}"));
                Ok(Sample::failed(&self.base))
            }
        }
    }

    /// Fetches the listing and copies it into `sink`, returning the transfer time.
    ///
    /// The transfer clock starts once the stream is open. The stream is dropped before this
    /// returns, whatever the outcome.
    fn transfer(
        &self,
        container: &str,
        object: &str,
        session: &Session,
        sink: &mut CountingSink<io::Sink>,
    ) -> std::result::Result<Duration, StorageError> {
        let mut stream = session.api().list(container, object, self.base.config())?;

        let xfer_start = Instant::now();
        match io::copy(&mut stream, sink) {
            Ok(_) => Ok(xfer_start.elapsed()),
            Err(_) if session.is_interrupted() => Err(StorageError::interrupted(format!(
                "transfer of {container}/{object} interrupted"
            ))),
            Err(err) => Err(StorageError::from_stream_error(err)),
        }
    }
}

impl Operator for Lister {
    fn base(&self) -> &OperatorBase {
        &self.base
    }

    fn operate_as(
        &self,
        index: usize,
        total: usize,
        session: &mut Session,
    ) -> std::result::Result<(), Aborted> {
        let (container, object) = self.picker.pick_target_path(session.rng(), index, total);

        let sample = self.do_list(&container, &object, session)?;
        let result = OperationResult::from_sample(&sample);

        session.listener().on_sample_created(sample);
        session.listener().on_operation_completed(result);
        Ok(())
    }
}
