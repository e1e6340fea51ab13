//! Byte sources for the decoder
//!
//! The decoder only needs "read N bytes or fail at end of input", so the same
//! code path serves card replies held in memory and files read from disk.

use std::io::{BufRead, ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};

use crate::error::{Result, TlvError};

/// Largest step taken by the default [`ByteSource::read_bytes`]
const READ_CHUNK: usize = 4096;

/// Cursor over some source of bytes
pub trait ByteSource {
    /// Fill `buf` completely or fail with [`TlvError::UnexpectedEof`]
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Whether the source has no more bytes
    fn is_exhausted(&mut self) -> Result<bool>;

    /// Read a single byte
    fn read_u8(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_into(&mut byte)?;
        Ok(byte[0])
    }

    /// Read exactly `len` bytes
    ///
    /// The buffer grows with the data actually read, so a declared length
    /// larger than the source never allocates up front.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(len.min(READ_CHUNK));
        let mut chunk = [0u8; READ_CHUNK];
        while buf.len() < len {
            let step = (len - buf.len()).min(READ_CHUNK);
            let after = len - buf.len() - step;
            self.read_into(&mut chunk[..step]).map_err(|e| match e {
                TlvError::UnexpectedEof { needed } => TlvError::UnexpectedEof {
                    needed: needed + after,
                },
                other => other,
            })?;
            buf.extend_from_slice(&chunk[..step]);
        }
        Ok(buf.freeze())
    }
}

impl ByteSource for &[u8] {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.len() < buf.len() {
            return Err(TlvError::UnexpectedEof {
                needed: buf.len() - self.len(),
            });
        }
        let (head, tail) = self.split_at(buf.len());
        buf.copy_from_slice(head);
        *self = tail;
        Ok(())
    }

    fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.is_empty())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.len() < len {
            return Err(TlvError::UnexpectedEof {
                needed: len - self.len(),
            });
        }
        let (head, tail) = self.split_at(len);
        *self = tail;
        Ok(Bytes::copy_from_slice(head))
    }
}

impl ByteSource for Bytes {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.remaining() < buf.len() {
            return Err(TlvError::UnexpectedEof {
                needed: buf.len() - self.remaining(),
            });
        }
        self.copy_to_slice(buf);
        Ok(())
    }

    fn is_exhausted(&mut self) -> Result<bool> {
        Ok(!self.has_remaining())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.remaining() < len {
            return Err(TlvError::UnexpectedEof {
                needed: len - self.remaining(),
            });
        }
        Ok(self.split_to(len))
    }
}

/// Byte source backed by a buffered reader, such as a file
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
    position: u64,
}

impl<R: BufRead> IoSource<R> {
    /// Wrap a buffered reader
    pub const fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Number of bytes consumed so far
    pub const fn position(&self) -> u64 {
        self.position
    }

    /// Return the wrapped reader
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: BufRead> ByteSource for IoSource<R> {
    fn read_into(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(TlvError::UnexpectedEof {
                        needed: buf.len() - filled,
                    });
                }
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn is_exhausted(&mut self) -> Result<bool> {
        Ok(self.inner.fill_buf()?.is_empty())
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        // Grow with the data actually present instead of trusting a declared length
        let mut buf = Vec::with_capacity(len.min(64 * 1024));
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut buf)?;
        self.position += read as u64;
        if read < len {
            return Err(TlvError::UnexpectedEof { needed: len - read });
        }
        Ok(Bytes::from(buf))
    }
}
