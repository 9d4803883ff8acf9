use std::io::{self, Read};
use std::time::Duration;

use bytes::{Buf as _, Bytes};
use http_body_util::BodyExt as _;
use hyper::body::Incoming;
use osbench_core::{Interrupt, StorageError};
use tokio::runtime::Handle;

use super::Error;

const INTERRUPT_POLL: Duration = Duration::from_millis(10);

/// Resolves once `interrupt` is raised. Never resolves without one.
pub(crate) async fn interrupted(interrupt: Option<&Interrupt>) {
    let Some(interrupt) = interrupt else {
        return std::future::pending().await;
    };
    while !interrupt.is_interrupted() {
        tokio::time::sleep(INTERRUPT_POLL).await;
    }
}

/// Blocking [`Read`] over a streaming response body.
///
/// Each `read` that finds the buffer empty blocks on the runtime for the next data frame,
/// so it must not be called from an async context. Body failures surface as
/// `io::Error::other(StorageError)`; a raised interrupt ends the wait for the next frame
/// with an `Interrupted` storage error.
pub struct BodyReader {
    handle: Handle,
    body: Incoming,
    interrupt: Option<Interrupt>,
    buf: Bytes,
    done: bool,
}

impl BodyReader {
    pub fn new(handle: Handle, body: Incoming) -> Self {
        Self {
            handle,
            body,
            interrupt: None,
            buf: Bytes::new(),
            done: false,
        }
    }

    #[must_use]
    pub fn with_interrupt(mut self, interrupt: Option<Interrupt>) -> Self {
        self.interrupt = interrupt;
        self
    }

    fn fill(&mut self) -> io::Result<()> {
        while self.buf.is_empty() && !self.done {
            let body = &mut self.body;
            let interrupt = self.interrupt.as_ref();
            let next = self.handle.block_on(async move {
                tokio::select! {
                    frame = body.frame() => Some(frame),
                    () = interrupted(interrupt) => None,
                }
            });
            let Some(next) = next else {
                self.done = true;
                return Err(io::Error::other(StorageError::interrupted(
                    "http listing body read interrupted",
                )));
            };

            match next {
                Some(Ok(frame)) => {
                    // Trailers carry no listing data.
                    if let Ok(data) = frame.into_data() {
                        self.buf = data;
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Err(io::Error::other(
                        Error::BodyRead(err).into_storage_error(),
                    ));
                }
                None => self.done = true,
            }
        }
        Ok(())
    }
}

impl Read for BodyReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        self.fill()?;

        let n = out.len().min(self.buf.len());
        out[..n].copy_from_slice(&self.buf[..n]);
        self.buf.advance(n);
        Ok(n)
    }
}
