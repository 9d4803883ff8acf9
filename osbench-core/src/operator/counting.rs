use std::io::{self, Write};

/// Writer adapter that counts the bytes written through it.
#[derive(Debug)]
pub struct CountingSink<W> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    pub fn byte_count(&self) -> u64 {
        self.count
    }
}

impl<W: Write> Write for CountingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count = self.count.saturating_add(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
