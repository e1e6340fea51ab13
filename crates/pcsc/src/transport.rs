//! PC/SC transport implementation

use std::ffi::{CStr, CString};
use std::fmt;

use biocard_apdu_core::transport::{CardTransport, Exchange, TransportError};
use biocard_apdu_core::{FramingMode, Response};
use bytes::Bytes;
use pcsc::{Card, Context, Disposition, Protocol, Transaction};
use tracing::{debug, warn};

use crate::config::{PcscConfig, framing_for};
use crate::error::PcscError;

/// Transport implementation using PC/SC
pub struct PcscTransport {
    /// Card connection, if established
    card: Option<Card>,
    /// Reader name
    reader_name: CString,
    /// Negotiated protocol
    protocol: Option<Protocol>,
    /// Configuration
    config: PcscConfig,
    /// Reply buffer, sized for extended frames
    receive_buffer: Vec<u8>,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader_name", &self.reader_name)
            .field("has_card", &self.card.is_some())
            .field("protocol", &self.protocol)
            .field("config", &self.config)
            .finish()
    }
}

impl PcscTransport {
    /// Connect to the card in `reader`
    pub fn connect(
        context: &Context,
        reader: &CStr,
        config: PcscConfig,
    ) -> Result<Self, PcscError> {
        let card = match context.connect(reader, config.share_mode.into(), config.protocols) {
            Ok(card) => card,
            Err(pcsc::Error::NoSmartcard) => {
                return Err(PcscError::NoCard(reader.to_string_lossy().into_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::from_card(card, reader.to_owned(), config))
    }

    /// Wrap an already connected card
    pub fn from_card(card: Card, reader_name: CString, config: PcscConfig) -> Self {
        let protocol = active_protocol(&card);
        debug!(reader = ?reader_name, ?protocol, "Connected to card");

        Self {
            card: Some(card),
            reader_name,
            protocol,
            config,
            receive_buffer: vec![0; pcsc::MAX_BUFFER_SIZE_EXTENDED],
        }
    }

    /// Get the ATR of the current card
    pub fn atr(&self) -> Result<Vec<u8>, PcscError> {
        self.card.as_ref().map_or_else(
            || Err(self.no_card()),
            |card| {
                card.get_attribute_owned(pcsc::Attribute::AtrString)
                    .map_err(Into::into)
            },
        )
    }

    /// Get the reader name
    pub fn reader_name(&self) -> &CStr {
        &self.reader_name
    }

    /// Protocol negotiated with the card
    pub const fn protocol(&self) -> Option<Protocol> {
        self.protocol
    }

    /// Framing suited to the negotiated protocol
    pub const fn framing_mode(&self) -> FramingMode {
        framing_for(self.protocol)
    }

    fn no_card(&self) -> PcscError {
        PcscError::NoCard(self.reader_name.to_string_lossy().into_owned())
    }

    fn reconnect(&mut self, initialization: Disposition) -> Result<(), PcscError> {
        let card = self.card.as_mut().ok_or_else(|| {
            PcscError::NoCard(self.reader_name.to_string_lossy().into_owned())
        })?;
        card.reconnect(
            self.config.share_mode.into(),
            self.config.protocols,
            initialization,
        )?;
        self.protocol = active_protocol(card);
        Ok(())
    }

    /// Transmit a command to the card
    fn transmit_command(&mut self, command: &[u8], retry: bool) -> Result<Bytes, PcscError> {
        let Some(card) = self.card.as_ref() else {
            return Err(self.no_card());
        };

        match card.transmit(command, &mut self.receive_buffer) {
            Ok(response) => Ok(Bytes::copy_from_slice(response)),
            Err(pcsc::Error::ResetCard) if retry && self.config.auto_reconnect => {
                warn!("Card was reset, reconnecting");
                self.reconnect(Disposition::LeaveCard)?;
                self.transmit_command(command, false)
            }
            Err(pcsc::Error::RemovedCard) => {
                self.card = None;
                Err(pcsc::Error::RemovedCard.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Run `exchange` inside one PC/SC transaction
    ///
    /// The outer error is a failure to open the transaction, raised before
    /// any frame was sent. Failing to close it fails the exchange instead.
    fn transact(
        &mut self,
        exchange: &mut Exchange<'_>,
    ) -> Result<biocard_apdu_core::Result<Response>, PcscError> {
        let Self {
            card,
            reader_name,
            receive_buffer,
            ..
        } = self;
        let Some(card) = card.as_mut() else {
            return Err(PcscError::NoCard(reader_name.to_string_lossy().into_owned()));
        };

        let mut transaction = card.transaction()?;
        let result = exchange(&mut TransactionChannel {
            transaction: &mut transaction,
            buffer: receive_buffer.as_mut_slice(),
        });

        if let Err((_, e)) = transaction.end(Disposition::LeaveCard) {
            if result.is_ok() {
                return Ok(Err(TransportError::from(PcscError::from(e)).into()));
            }
            debug!(error = %e, "Failed to end transaction after a failed exchange");
        }
        Ok(result)
    }
}

/// Frames sent while a transaction holds the card
struct TransactionChannel<'a, 'tx> {
    transaction: &'a mut Transaction<'tx>,
    buffer: &'a mut [u8],
}

impl fmt::Debug for TransactionChannel<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionChannel").finish_non_exhaustive()
    }
}

impl CardTransport for TransactionChannel<'_, '_> {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.transaction
            .transmit(command, self.buffer)
            .map(Bytes::copy_from_slice)
            .map_err(|e| PcscError::from(e).into())
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        Err(TransportError::other("Cannot reset the card inside a transaction"))
    }
}

fn active_protocol(card: &Card) -> Option<Protocol> {
    card.status2_owned().ok().and_then(|status| status.protocol2())
}

impl CardTransport for PcscTransport {
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, TransportError> {
        self.transmit_command(command, true).map_err(TransportError::from)
    }

    fn is_connected(&self) -> bool {
        self.card.is_some()
    }

    fn reset(&mut self) -> Result<(), TransportError> {
        self.reconnect(Disposition::ResetCard).map_err(Into::into)
    }

    // Other applications sharing the reader cannot interleave frames with
    // a chained command or its GET RESPONSE sequence.
    fn transaction(&mut self, exchange: &mut Exchange<'_>) -> biocard_apdu_core::Result<Response> {
        let outcome = match self.transact(exchange) {
            // Reset before the transaction opened, so nothing was sent yet
            Err(PcscError::Pcsc(pcsc::Error::ResetCard)) if self.config.auto_reconnect => {
                warn!("Card was reset, reconnecting");
                self.reconnect(Disposition::LeaveCard)
                    .map_err(TransportError::from)?;
                self.transact(exchange)
            }
            other => other,
        };
        outcome.map_err(TransportError::from)?
    }
}

impl Drop for PcscTransport {
    fn drop(&mut self) {
        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(Disposition::LeaveCard) {
                debug!(error = %e, "Failed to disconnect card");
            }
        }
    }
}
