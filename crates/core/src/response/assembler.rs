//! Response reassembly across GET RESPONSE round trips

use bytes::BytesMut;
use tracing::debug;

use super::Response;
use super::status::StatusWord;
use super::utils::split_reply;
use crate::config::ExchangeConfig;
use crate::templates::Template;
use crate::transport::CardTransport;
use crate::{Error, Result};

/// Accumulates the body of one logical exchange
///
/// A fresh assembler is created per exchange. Reply bodies are appended in
/// order; the status word of each reply decides whether another GET RESPONSE
/// is needed.
#[derive(Debug)]
pub struct ResponseAssembler {
    body: BytesMut,
    max_len: usize,
    max_chains: usize,
    chains: usize,
}

impl ResponseAssembler {
    /// Create an assembler holding at most `max_len` bytes and following at
    /// most `max_chains` GET RESPONSE round trips
    pub fn new(max_len: usize, max_chains: usize) -> Self {
        Self {
            body: BytesMut::new(),
            max_len,
            max_chains,
            chains: 0,
        }
    }

    /// Create an assembler with the limits of an exchange configuration
    pub fn from_config(config: &ExchangeConfig) -> Self {
        Self::new(config.max_response_len, config.max_response_chains)
    }

    /// Bytes accumulated so far
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Number of GET RESPONSE round trips performed
    pub const fn chains(&self) -> usize {
        self.chains
    }

    /// Append the body of one raw reply and return its status word
    pub fn push_reply(&mut self, reply: &[u8]) -> Result<StatusWord> {
        let (status, body) = split_reply(reply);

        let required = self.body.len() + body.len();
        if required > self.max_len {
            return Err(Error::BufferTooSmall {
                required,
                capacity: self.max_len,
            });
        }

        self.body.extend_from_slice(body);
        Ok(status)
    }

    /// Consume `reply` and drain any 61 XX continuation from the card
    ///
    /// Returns the status word of the last reply, the first one whose SW1
    /// is not 61.
    pub fn complete<T: CardTransport + ?Sized>(
        &mut self,
        transport: &mut T,
        reply: &[u8],
    ) -> Result<StatusWord> {
        let mut status = self.push_reply(reply)?;

        while let Some(remaining) = status.remaining_bytes() {
            if self.chains >= self.max_chains {
                return Err(Error::ChainLimitExceeded);
            }
            self.chains += 1;

            debug!(
                remaining = status.get_response_length(),
                received = self.body.len(),
                "More response data available, sending GET RESPONSE"
            );

            let frame = Template::GetResponse
                .command()
                .with_le(u16::from(remaining))
                .to_bytes()?;
            let reply = transport.transmit_raw(&frame)?;
            status = self.push_reply(&reply)?;
        }

        Ok(status)
    }

    /// Finish the exchange with its final status word
    pub fn finish(self, status: StatusWord) -> Response {
        Response::new(self.body.freeze(), status)
    }
}
