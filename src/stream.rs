//! Outgoing checksum framing.
//!
//! [`ChecksumStream`] wraps a byte sink and splices a `|<checksum>` suffix in
//! front of every line terminator it sees, so that plain line-oriented writes
//! come out checksummed:
//!
//! ```text
//! write "set led 1\n"  ->  sink receives "set led 1|<checksum>\n"
//! ```
//!
//! The checksum covers exactly the bytes of the line body and is emitted once
//! per line even when the terminator is a CRLF pair.
//!
//! # Example
//!
//! ```
//! use command_proto::{checksum, ByteStream, ChecksumMode, ChecksumStream};
//!
//! let sink = heapless::Vec::<u8, 32>::new();
//! let mut stream = ChecksumStream::new(sink, ChecksumMode::Crc16);
//! stream.write_slice(b"reset\n");
//!
//! let crc = checksum(ChecksumMode::Crc16, b"reset");
//! let expected = format!("reset|{crc}\n");
//! assert_eq!(stream.into_inner().as_slice(), expected.as_bytes());
//! ```

use core::mem;

use crate::checksum::{ChecksumDigest, ChecksumMode};
use crate::fmt;

/// Synchronous, non-blocking byte transport.
///
/// This is the narrow interface the protocol layer expects from the
/// underlying serial-like transport. Writes report the number of bytes
/// accepted; reads return `None` when no byte is available. Implementations
/// must not block.
pub trait ByteStream {
    /// Write one byte, returning how many bytes were accepted (0 or 1).
    fn write_byte(&mut self, byte: u8) -> usize;

    /// Flush buffered output.
    fn flush(&mut self);

    /// Take the next available input byte, if any.
    fn read(&mut self) -> Option<u8>;

    /// Number of input bytes available to read.
    fn available(&self) -> usize;

    /// Look at the next input byte without consuming it.
    fn peek(&mut self) -> Option<u8>;

    /// Write a byte slice, returning how many bytes were accepted.
    fn write_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().map(|&b| self.write_byte(b)).sum()
    }
}

/// Write-only sink: bytes past the capacity are dropped.
impl<const N: usize> ByteStream for heapless::Vec<u8, N> {
    fn write_byte(&mut self, byte: u8) -> usize {
        match self.push(byte) {
            Ok(()) => 1,
            Err(_) => 0,
        }
    }

    fn flush(&mut self) {}

    fn read(&mut self) -> Option<u8> {
        None
    }

    fn available(&self) -> usize {
        0
    }

    fn peek(&mut self) -> Option<u8> {
        None
    }
}

/// Write-only sink for host-side use.
#[cfg(feature = "std")]
impl ByteStream for std::vec::Vec<u8> {
    fn write_byte(&mut self, byte: u8) -> usize {
        self.push(byte);
        1
    }

    fn flush(&mut self) {}

    fn read(&mut self) -> Option<u8> {
        None
    }

    fn available(&self) -> usize {
        0
    }

    fn peek(&mut self) -> Option<u8> {
        None
    }
}

/// Byte sink wrapper that appends a checksum suffix to every outgoing line.
///
/// Only writes are intercepted; `flush`, `read`, `available` and `peek`
/// forward to the wrapped sink unchanged. The mode must match the one the
/// receiving [`CommandParser`](crate::CommandParser) was built with, or every
/// line will be rejected on the other end.
pub struct ChecksumStream<S> {
    inner: S,
    mode: ChecksumMode,
    digest: ChecksumDigest,
    /// A suffix is emitted on the first terminator byte of a run, so the
    /// `\n` of a CRLF pair does not re-emit.
    armed: bool,
}

impl<S: ByteStream> ChecksumStream<S> {
    /// Wrap `inner`, computing checksums in the given mode.
    #[must_use]
    pub fn new(inner: S, mode: ChecksumMode) -> Self {
        Self {
            inner,
            mode,
            digest: ChecksumDigest::new(mode),
            armed: true,
        }
    }

    /// The checksum mode this stream writes with.
    #[inline]
    #[must_use]
    pub fn mode(&self) -> ChecksumMode {
        self.mode
    }

    /// Borrow the wrapped sink.
    #[inline]
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the wrapped sink.
    #[inline]
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Unwrap, returning the sink.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: ByteStream> ByteStream for ChecksumStream<S> {
    fn write_byte(&mut self, byte: u8) -> usize {
        if matches!(byte, b'\n' | b'\r') {
            if self.armed {
                let digest = mem::replace(&mut self.digest, ChecksumDigest::new(self.mode));
                let mut suffix = [0u8; 6];
                let len = fmt::write_checksum_suffix(&mut suffix, digest.finalize());
                self.inner.write_slice(&suffix[..len]);
                self.armed = false;
            }
            self.inner.write_byte(byte)
        } else {
            self.digest.update(byte);
            self.armed = true;
            self.inner.write_byte(byte)
        }
    }

    fn flush(&mut self) {
        self.inner.flush();
    }

    fn read(&mut self) -> Option<u8> {
        self.inner.read()
    }

    fn available(&self) -> usize {
        self.inner.available()
    }

    fn peek(&mut self) -> Option<u8> {
        self.inner.peek()
    }
}

/// [`embedded_io::Write`] flavor of [`ChecksumStream`].
///
/// Wraps any `embedded_io::Write` (UART driver, pipe, ...) and splices the
/// same `|<checksum>` suffix in front of each line terminator. Errors from
/// the wrapped writer propagate unchanged.
#[cfg(feature = "embedded-io")]
pub struct ChecksumWriter<W> {
    inner: W,
    mode: ChecksumMode,
    digest: ChecksumDigest,
    armed: bool,
}

#[cfg(feature = "embedded-io")]
impl<W: embedded_io::Write> ChecksumWriter<W> {
    /// Wrap `inner`, computing checksums in the given mode.
    #[must_use]
    pub fn new(inner: W, mode: ChecksumMode) -> Self {
        Self {
            inner,
            mode,
            digest: ChecksumDigest::new(mode),
            armed: true,
        }
    }

    /// Unwrap, returning the writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn put(&mut self, byte: u8) -> Result<(), W::Error> {
        if matches!(byte, b'\n' | b'\r') {
            if self.armed {
                let digest = mem::replace(&mut self.digest, ChecksumDigest::new(self.mode));
                let mut suffix = [0u8; 6];
                let len = fmt::write_checksum_suffix(&mut suffix, digest.finalize());
                self.inner.write_all(&suffix[..len])?;
                self.armed = false;
            }
        } else {
            self.digest.update(byte);
            self.armed = true;
        }
        self.inner.write_all(&[byte])
    }
}

#[cfg(feature = "embedded-io")]
impl<W: embedded_io::Write> embedded_io::ErrorType for ChecksumWriter<W> {
    type Error = W::Error;
}

#[cfg(feature = "embedded-io")]
impl<W: embedded_io::Write> embedded_io::Write for ChecksumWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        for &byte in buf {
            self.put(byte)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;
    use std::vec::Vec;

    use super::*;
    use crate::checksum::checksum;

    /// Loopback transport with canned input, for pass-through tests.
    struct MemStream {
        written: Vec<u8>,
        input: Vec<u8>,
        pos: usize,
        flushed: bool,
    }

    impl MemStream {
        fn with_input(input: &[u8]) -> Self {
            Self {
                written: Vec::new(),
                input: input.to_vec(),
                pos: 0,
                flushed: false,
            }
        }
    }

    impl ByteStream for MemStream {
        fn write_byte(&mut self, byte: u8) -> usize {
            self.written.push(byte);
            1
        }

        fn flush(&mut self) {
            self.flushed = true;
        }

        fn read(&mut self) -> Option<u8> {
            let byte = self.input.get(self.pos).copied()?;
            self.pos += 1;
            Some(byte)
        }

        fn available(&self) -> usize {
            self.input.len() - self.pos
        }

        fn peek(&mut self) -> Option<u8> {
            self.input.get(self.pos).copied()
        }
    }

    type Sink = heapless::Vec<u8, 64>;

    fn framed(mode: ChecksumMode, body: &[u8]) -> Vec<u8> {
        let mut expected = body.to_vec();
        expected.extend_from_slice(format!("|{}", checksum(mode, body)).as_bytes());
        expected
    }

    #[test]
    fn test_suffix_before_lf() {
        let mut stream = ChecksumStream::new(Sink::new(), ChecksumMode::Crc16);
        stream.write_slice(b"set led 1\n");

        let mut expected = framed(ChecksumMode::Crc16, b"set led 1");
        expected.push(b'\n');
        assert_eq!(stream.into_inner().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_crlf_emits_once() {
        let mut stream = ChecksumStream::new(Sink::new(), ChecksumMode::Crc16);
        stream.write_slice(b"status\r\n");

        let mut expected = framed(ChecksumMode::Crc16, b"status");
        expected.extend_from_slice(b"\r\n");
        assert_eq!(stream.into_inner().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_digest_resets_between_lines() {
        let mut stream = ChecksumStream::new(Sink::new(), ChecksumMode::Crc16);
        stream.write_slice(b"aa\naa\n");

        let mut expected = framed(ChecksumMode::Crc16, b"aa");
        expected.push(b'\n');
        expected.extend_from_slice(&framed(ChecksumMode::Crc16, b"aa"));
        expected.push(b'\n');
        assert_eq!(stream.into_inner().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_legacy_mode_suffix() {
        let mut stream = ChecksumStream::new(Sink::new(), ChecksumMode::Legacy);
        stream.write_slice(b"ab\n");

        // 'a' + 'b' = 195
        assert_eq!(stream.into_inner().as_slice(), b"ab|195\n");
    }

    #[test]
    fn test_leading_terminator_carries_empty_checksum() {
        let mut stream = ChecksumStream::new(Sink::new(), ChecksumMode::Crc16);
        stream.write_byte(b'\n');

        // Empty body checksum is the initial accumulator value.
        assert_eq!(stream.into_inner().as_slice(), b"|65535\n");
    }

    #[test]
    fn test_consecutive_terminators_after_body() {
        let mut stream = ChecksumStream::new(Sink::new(), ChecksumMode::Crc16);
        stream.write_slice(b"x\n\n\n");

        let mut expected = framed(ChecksumMode::Crc16, b"x");
        expected.extend_from_slice(b"\n\n\n");
        assert_eq!(stream.into_inner().as_slice(), expected.as_slice());
    }

    #[test]
    fn test_heapless_sink() {
        let sink = heapless::Vec::<u8, 32>::new();
        let mut stream = ChecksumStream::new(sink, ChecksumMode::Legacy);
        let written = stream.write_slice(b"ab\n");
        // Reports caller bytes accepted, not sink bytes (the suffix is extra).
        assert_eq!(written, 3);
        assert_eq!(stream.inner().as_slice(), b"ab|195\n");
    }

    #[test]
    fn test_read_side_passes_through() {
        let mut stream = ChecksumStream::new(MemStream::with_input(b"ok"), ChecksumMode::Crc16);

        assert_eq!(stream.available(), 2);
        assert_eq!(stream.peek(), Some(b'o'));
        assert_eq!(stream.read(), Some(b'o'));
        assert_eq!(stream.read(), Some(b'k'));
        assert_eq!(stream.read(), None);
        assert_eq!(stream.available(), 0);

        stream.flush();
        assert!(stream.inner().flushed);
    }
}
