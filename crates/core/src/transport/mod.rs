//! Transport traits for APDU communication with cards
//!
//! A transport moves raw frames to and from one exclusively held card
//! session. It knows nothing of command chaining or GET RESPONSE; those are
//! driven by the executor on top of [`CardTransport::transmit_raw`].

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

use crate::response::Response;

/// One logical exchange run by [`CardTransport::transaction`]
pub type Exchange<'a> = dyn FnMut(&mut dyn CardTransport) -> crate::Result<Response> + 'a;

/// Trait for basic card transports
pub trait CardTransport: Send + fmt::Debug {
    /// Send one physical frame and return the reply, status word included
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        trace!(command = %hex::encode_upper(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode_upper(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = ?e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    /// This is the method that concrete implementations should override
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError>;

    /// Check if the transport is connected to a physical card
    fn is_connected(&self) -> bool;

    /// Reset the transport connection
    fn reset(&mut self) -> Result<(), TransportError>;

    /// Run one logical exchange with the card held exclusively
    ///
    /// Every frame of `exchange` goes through the transport it is handed.
    /// The default hands over `self`; transports sharing the card with other
    /// applications override this to keep a card transaction open for the
    /// whole exchange and release it afterwards, whatever the outcome.
    fn transaction(&mut self, exchange: &mut Exchange<'_>) -> crate::Result<Response>
    where
        Self: Sized,
    {
        exchange(self)
    }
}

/// Transport over a closure, for card services that only expose a
/// `transmit(bytes) -> bytes` primitive
pub struct FnTransport<F> {
    transmit: F,
}

impl<F> FnTransport<F>
where
    F: FnMut(&[u8]) -> Result<Bytes, TransportError> + Send,
{
    /// Wrap a transmit function
    pub const fn new(transmit: F) -> Self {
        Self { transmit }
    }
}

impl<F> fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransport").finish_non_exhaustive()
    }
}

impl<F> CardTransport for FnTransport<F>
where
    F: FnMut(&[u8]) -> Result<Bytes, TransportError> + Send,
{
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        (self.transmit)(command)
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use mock::MockTransport;

#[cfg(test)]
mod mock {
    use std::collections::VecDeque;

    use super::*;

    /// Scripted transport that records every frame it is given
    #[derive(Debug, Default)]
    pub(crate) struct MockTransport {
        /// Replies returned in order
        pub(crate) responses: VecDeque<Bytes>,
        /// Frames that were sent
        pub(crate) commands: Vec<Bytes>,
        /// Number of transactions opened
        pub(crate) transactions_begun: usize,
        /// Number of transactions closed
        pub(crate) transactions_ended: usize,
    }

    impl MockTransport {
        /// Create a mock transport replying with the hex-encoded `responses` in order
        pub(crate) fn new(responses: &[&str]) -> Self {
            Self {
                responses: responses
                    .iter()
                    .map(|r| Bytes::from(hex::decode(r).unwrap()))
                    .collect(),
                ..Default::default()
            }
        }

        /// Sent frames as upper-case hex strings
        pub(crate) fn sent_hex(&self) -> Vec<String> {
            self.commands.iter().map(hex::encode_upper).collect()
        }
    }

    impl CardTransport for MockTransport {
        fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
            self.commands.push(Bytes::copy_from_slice(command));
            self.responses
                .pop_front()
                .ok_or(TransportError::Transmission)
        }

        fn is_connected(&self) -> bool {
            true
        }

        fn reset(&mut self) -> Result<(), TransportError> {
            self.commands.clear();
            Ok(())
        }

        fn transaction(&mut self, exchange: &mut Exchange<'_>) -> crate::Result<Response> {
            self.transactions_begun += 1;
            let result = exchange(self);
            self.transactions_ended += 1;
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_transport() {
        let mut sent = Vec::new();
        let mut transport = FnTransport::new(|command: &[u8]| {
            sent.push(command.to_vec());
            Ok(Bytes::from_static(&[0x90, 0x00]))
        });

        let reply = transport.transmit_raw(&[0x00, 0xA4, 0x04, 0x00]).unwrap();
        assert_eq!(reply.as_ref(), &[0x90, 0x00]);
        drop(transport);
        assert_eq!(sent, vec![vec![0x00, 0xA4, 0x04, 0x00]]);
    }

    #[test]
    fn test_default_transaction_runs_exchange() {
        let mut transport = FnTransport::new(|_: &[u8]| Ok(Bytes::from_static(&[0x6A, 0x82])));

        let response = transport
            .transaction(&mut |channel| {
                let reply = channel.transmit_raw(&[0x00, 0xA4, 0x04, 0x00])?;
                Ok(Response::from_bytes(&reply))
            })
            .unwrap();
        assert_eq!(response.status().sw1, 0x6A);
        assert!(transport.is_connected());
    }

    #[test]
    fn test_mock_transport_runs_dry() {
        let mut transport = MockTransport::new(&["9000"]);
        assert!(transport.transmit_raw(&[0x00, 0xC0, 0x00, 0x00]).is_ok());
        assert_eq!(
            transport.transmit_raw(&[0x00, 0xC0, 0x00, 0x00]),
            Err(TransportError::Transmission)
        );
        assert_eq!(transport.sent_hex(), vec!["00C00000", "00C00000"]);
    }
}
