//! Copy codec (ZIP method 0, stored).

use std::io::{self, Read, Write};

use super::{Decoder, Encoder, method};

/// A decoder that passes data through unchanged.
pub struct CopyDecoder<R> {
    inner: R,
    remaining: u64,
}

impl<R: Read> CopyDecoder<R> {
    /// Creates a new copy decoder yielding at most `size` bytes of `inner`.
    pub fn new(inner: R, size: u64) -> Self {
        Self {
            inner,
            remaining: size,
        }
    }
}

impl<R: Read> Read for CopyDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            return Ok(0);
        }

        let max_read = usize::try_from(self.remaining)
            .unwrap_or(usize::MAX)
            .min(buf.len());
        let n = self.inner.read(&mut buf[..max_read])?;
        self.remaining = self.remaining.saturating_sub(n as u64);
        Ok(n)
    }
}

impl<R: Read> Decoder for CopyDecoder<R> {
    fn method_id(&self) -> u16 {
        method::STORED
    }
}

/// An encoder that writes data through unchanged.
pub struct CopyEncoder<W> {
    inner: W,
}

impl<W: Write> CopyEncoder<W> {
    /// Creates a new copy encoder.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Write for CopyEncoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Encoder for CopyEncoder<W> {
    fn method_id(&self) -> u16 {
        method::STORED
    }

    fn finish(mut self: Box<Self>) -> io::Result<()> {
        self.inner.flush()
    }
}
