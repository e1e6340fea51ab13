//! Executor for APDU command execution
//!
//! An executor owns one card session and runs logical exchanges on it: frame
//! the command, send every frame inside one transaction, follow GET RESPONSE
//! continuations and hand back the reassembled [`Response`].

use std::fmt;

use bytes::Bytes;
use tracing::{Level, debug, info, instrument, warn};

use crate::Result;
use crate::command::Command;
use crate::config::ExchangeConfig;
use crate::error::ResultExt;
use crate::framer::{FramePlan, Framer};
use crate::response::Response;
use crate::response::assembler::ResponseAssembler;
use crate::response::status::StatusWord;
use crate::transport::CardTransport;

/// Trait for APDU command execution
pub trait Executor: Send + fmt::Debug {
    /// Run one logical exchange and return the reassembled response
    ///
    /// Any status word is returned as is; use [`execute`](Self::execute) to
    /// treat everything but 90 00 as an error.
    #[instrument(
        level = "debug",
        skip_all,
        fields(command = command.description(), ins = command.ins)
    )]
    fn exchange(&mut self, command: &Command) -> Result<Response> {
        let response = self.do_exchange(command)?;
        let status = response.status();
        let level = status.tracing_level();

        if level == Level::WARN {
            warn!(%status, description = status.description(), "Card returned error status");
        } else if level == Level::INFO {
            info!(%status, description = status.description(), "Card returned warning status");
        } else {
            debug!(%status, len = response.payload().len(), "Exchange complete");
        }

        Ok(response)
    }

    /// Internal implementation of exchange
    fn do_exchange(&mut self, command: &Command) -> Result<Response>;

    /// Run one logical exchange and return its body if the card answered 90 00
    fn execute(&mut self, command: &Command) -> Result<Bytes> {
        let result = self.exchange(command).and_then(Response::into_result);
        if command.description().is_empty() {
            result
        } else {
            result.context(command.description().to_owned())
        }
    }

    /// Reset the executor, including the transport
    fn reset(&mut self) -> Result<()>;
}

/// Card executor over a single transport
#[derive(Debug)]
pub struct CardExecutor<T: CardTransport> {
    /// The transport used for communication
    transport: T,
    /// Framing and reassembly settings
    config: ExchangeConfig,
    /// The last response received
    last_response: Option<Response>,
}

impl<T: CardTransport> CardExecutor<T> {
    /// Create a new card executor with the default configuration
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ExchangeConfig::default(),
            last_response: None,
        }
    }

    /// Create a new card executor with the given configuration
    pub fn with_config(transport: T, config: ExchangeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            transport,
            config,
            last_response: None,
        })
    }

    /// Get the exchange configuration
    pub const fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Get a reference to the underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the underlying transport
    pub const fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Take ownership of the transport and return it
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Get the last response received
    pub const fn last_response(&self) -> Option<&Response> {
        self.last_response.as_ref()
    }

    /// Render the frames `command` would be sent as, without sending them
    pub fn render(&self, command: &Command) -> Result<FramePlan> {
        Framer::from_config(&self.config).plan(command)
    }
}

impl<T: CardTransport> Executor for CardExecutor<T> {
    fn do_exchange(&mut self, command: &Command) -> Result<Response> {
        let plan = self.render(command)?;

        if self.config.dry_run {
            for (index, frame) in plan.frames.iter().enumerate() {
                info!(
                    command = command.description(),
                    mode = %plan.mode,
                    frame = index + 1,
                    bytes = %hex::encode_upper(frame),
                    "Dry run, not transmitted"
                );
            }
            let response = Response::success(Bytes::new());
            self.last_response = Some(response.clone());
            return Ok(response);
        }

        let config = &self.config;
        let response = self
            .transport
            .transaction(&mut |transport| run(transport, config, &plan.frames))?;

        self.last_response = Some(response.clone());
        Ok(response)
    }

    fn reset(&mut self) -> Result<()> {
        self.transport.reset()?;
        self.last_response = None;
        Ok(())
    }
}

/// Send `frames` in order and reassemble the reply
///
/// A chained frame answered with anything but 90 00 stops the chain; that
/// status is returned with whatever body was received.
fn run(
    transport: &mut dyn CardTransport,
    config: &ExchangeConfig,
    frames: &[Bytes],
) -> Result<Response> {
    let mut assembler = ResponseAssembler::from_config(config);
    let mut status = StatusWord::UNDEFINED;

    for (index, frame) in frames.iter().enumerate() {
        let reply = transport.transmit_raw(frame)?;
        status = assembler.complete(&mut *transport, &reply)?;

        if !status.is_success() {
            if index + 1 < frames.len() {
                debug!(
                    frame = index + 1,
                    frames = frames.len(),
                    %status,
                    "Chained command stopped by card"
                );
            }
            break;
        }
    }

    Ok(assembler.finish(status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::config::FramingMode;
    use crate::transport::{MockTransport, TransportError};

    fn put_data(len: usize) -> Command {
        Command::new_with_data(0x00, 0xDB, 0x3F, 0xFF, vec![0x5A; len])
    }

    #[test]
    fn test_executor_basic_exchange() {
        let transport = MockTransport::new(&["C0029000"]);
        let mut executor = CardExecutor::new(transport);

        let response = executor
            .exchange(&Command::new_with_le(0x00, 0xCB, 0x3F, 0xFF, 0x04))
            .unwrap();
        assert_eq!(response.payload().as_ref(), &[0xC0, 0x02]);
        assert!(response.is_success());
        assert_eq!(executor.last_response(), Some(&response));

        let transport = executor.transport();
        assert_eq!(transport.sent_hex(), vec!["00CB3FFF04"]);
        assert_eq!(transport.transactions_begun, 1);
        assert_eq!(transport.transactions_ended, 1);
    }

    #[test]
    fn test_executor_chained_exchange() {
        let config = ExchangeConfig::new()
            .with_framing(FramingMode::Chained)
            .with_max_short_lc(100);
        let transport = MockTransport::new(&["9000", "9000", "6102", "AABB9000"]);
        let mut executor = CardExecutor::with_config(transport, config).unwrap();

        let response = executor.exchange(&put_data(250)).unwrap();
        assert!(response.is_success());
        // The last frame's reply carries no body; the GET RESPONSE reply does
        assert_eq!(response.payload().as_ref(), &[0xAA, 0xBB]);

        let sent = &executor.transport().commands;
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0][0], 0x10);
        assert_eq!(sent[1][0], 0x10);
        assert_eq!(sent[2][0], 0x00);
        assert_eq!(sent[3].as_ref(), &[0x00, 0xC0, 0x00, 0x00, 0x02]);
    }

    #[test]
    fn test_executor_chain_stopped_by_card() {
        let config = ExchangeConfig::new()
            .with_framing(FramingMode::Chained)
            .with_max_short_lc(100);
        let transport = MockTransport::new(&["9000", "6A80"]);
        let mut executor = CardExecutor::with_config(transport, config).unwrap();

        let response = executor.exchange(&put_data(250)).unwrap();
        assert_eq!(response.status(), StatusWord::new(0x6A, 0x80));
        assert_eq!(executor.transport().commands.len(), 2);
        assert_eq!(executor.transport().transactions_ended, 1);
    }

    #[test]
    fn test_transaction_ended_on_failure() {
        let transport = MockTransport::new(&[]);
        let mut executor = CardExecutor::new(transport);

        let result = executor.exchange(&Command::new(0x00, 0xA4, 0x04, 0x00));
        assert_eq!(result, Err(Error::Transport(TransportError::Transmission)));
        assert_eq!(executor.transport().transactions_begun, 1);
        assert_eq!(executor.transport().transactions_ended, 1);
        assert!(executor.last_response().is_none());
    }

    #[test]
    fn test_dry_run() {
        let config = ExchangeConfig::new().with_dry_run(true);
        let mut executor = CardExecutor::with_config(MockTransport::new(&[]), config).unwrap();

        let response = executor.exchange(&put_data(300)).unwrap();
        assert_eq!(response.status(), StatusWord::new(0x90, 0x00));
        assert!(response.payload().is_empty());
        assert!(executor.transport().commands.is_empty());
        assert_eq!(executor.transport().transactions_begun, 0);
    }

    #[test]
    fn test_render() {
        let executor = CardExecutor::new(MockTransport::new(&[]));
        let plan = executor.render(&put_data(300)).unwrap();
        assert_eq!(plan.frames.len(), 1);
        assert_eq!(plan.frames[0].len(), 307);
    }

    #[test]
    fn test_execute_maps_status() {
        let transport = MockTransport::new(&["63C2", "6D00"]);
        let mut executor = CardExecutor::new(transport);

        let verify = Command::new(0x00, 0x20, 0x00, 0x80).with_description("Verify PIN");
        let err = executor.execute(&verify).unwrap_err();
        assert_eq!(err.to_string(), "Verify PIN: Status error 63 C2: Counter value");
        assert_eq!(err.status_word().and_then(|sw| sw.retry_counter()), Some(2));

        let err = executor.execute(&Command::new(0x00, 0xFF, 0x00, 0x00)).unwrap_err();
        assert_eq!(err, Error::status(0x6D, 0x00));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExchangeConfig::new().with_max_short_lc(0);
        assert!(matches!(
            CardExecutor::with_config(MockTransport::new(&[]), config),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reset() {
        let mut executor = CardExecutor::new(MockTransport::new(&["9000"]));
        executor.exchange(&Command::new(0x00, 0xA4, 0x04, 0x00)).unwrap();
        assert!(executor.last_response().is_some());

        executor.reset().unwrap();
        assert!(executor.last_response().is_none());
        assert!(executor.transport().commands.is_empty());
    }
}
