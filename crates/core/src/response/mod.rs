//! APDU response definitions
//!
//! A [`Response`] is the outcome of one logical exchange: the body
//! reassembled across every chained reply, and the status word of the last
//! reply.

pub mod assembler;
pub mod status;
pub mod utils;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::{Error, Result};
use status::StatusWord;

/// Basic APDU response structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response body, status bytes stripped
    payload: Bytes,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// Create a success response
    pub fn success(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, StatusWord::SUCCESS)
    }

    /// Parse a single raw reply (body followed by SW1 SW2)
    ///
    /// A reply shorter than two bytes becomes an empty response with
    /// [`StatusWord::UNDEFINED`].
    pub fn from_bytes(data: &[u8]) -> Self {
        let (status, body) = utils::split_reply(data);

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = body.len(),
            "Parsed APDU response"
        );

        Self {
            payload: Bytes::copy_from_slice(body),
            status,
        }
    }

    /// Get the response body
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Get the status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check if the response indicates success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the status word as a tuple (SW1, SW2)
    pub const fn status_tuple(&self) -> (u8, u8) {
        (self.status.sw1, self.status.sw2)
    }

    /// Take the body if the status is 90 00
    ///
    /// Any other status word is returned as an error, verbatim.
    pub fn into_result(self) -> Result<Bytes> {
        if self.status.is_success() {
            Ok(self.payload)
        } else if self.status.is_undefined() {
            Err(Error::UndefinedStatus)
        } else {
            Err(Error::NonSuccessStatus(self.status))
        }
    }
}

impl From<Response> for Bytes {
    fn from(response: Response) -> Self {
        let mut buf = BytesMut::with_capacity(response.payload.len() + 2);
        buf.put_slice(&response.payload);
        buf.put_u8(response.status.sw1);
        buf.put_u8(response.status.sw2);
        buf.freeze()
    }
}
