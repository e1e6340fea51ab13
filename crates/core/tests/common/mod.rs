//! Scripted card transport shared by the integration tests

use std::collections::VecDeque;

use biocard_apdu_core::transport::{CardTransport, Exchange, TransportError};
use biocard_apdu_core::{Bytes, Response, Result as CoreResult};

/// Transport answering from a fixed script and recording every frame
#[derive(Debug, Default)]
pub struct ScriptedCard {
    replies: VecDeque<Bytes>,
    pub sent: Vec<Bytes>,
    pub transactions: usize,
    in_transaction: bool,
}

impl ScriptedCard {
    /// Replies given as hex strings, consumed in order
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: replies
                .iter()
                .map(|r| Bytes::from(hex::decode(r).expect("valid hex reply")))
                .collect(),
            ..Default::default()
        }
    }

    /// Queue a reply built from raw bytes
    #[allow(dead_code)]
    pub fn push_reply(&mut self, reply: impl Into<Bytes>) {
        self.replies.push_back(reply.into());
    }

    /// Sent frames as upper-case hex
    pub fn sent_hex(&self) -> Vec<String> {
        self.sent.iter().map(hex::encode_upper).collect()
    }
}

impl CardTransport for ScriptedCard {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        assert!(self.in_transaction, "frame sent outside a transaction");
        self.sent.push(Bytes::copy_from_slice(command));
        self.replies
            .pop_front()
            .ok_or_else(|| TransportError::other("script exhausted"))
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn transaction(&mut self, exchange: &mut Exchange<'_>) -> CoreResult<Response> {
        assert!(!self.in_transaction, "nested transaction");
        self.in_transaction = true;
        self.transactions += 1;
        let result = exchange(self);
        self.in_transaction = false;
        result
    }
}
