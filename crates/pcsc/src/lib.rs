//! PC/SC transport for biocard APDU exchanges
//!
//! This crate implements the [`CardTransport`](biocard_apdu_core::CardTransport)
//! trait on top of the PC/SC API, so a [`CardExecutor`](biocard_apdu_core::CardExecutor)
//! can drive a card sitting in a system reader.
//!
//! Reader discovery is left to the caller: pass a reader name obtained from
//! [`Context::list_readers_owned`] to [`PcscTransport::connect`].
//!
//! # Examples
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use biocard_apdu_core::{CardExecutor, ExchangeConfig, Executor, Template};
//! use biocard_apdu_pcsc::{Context, PcscConfig, PcscTransport, Scope};
//!
//! let context = Context::establish(Scope::User)?;
//! let readers = context.list_readers_owned()?;
//! let Some(reader) = readers.first() else {
//!     println!("No readers found");
//!     return Ok(());
//! };
//!
//! let transport = PcscTransport::connect(&context, reader, PcscConfig::default())?;
//! let config = ExchangeConfig::new().with_framing(transport.framing_mode());
//! let mut executor = CardExecutor::with_config(transport, config)?;
//!
//! let fci = executor.execute(&Template::PivSelect.command())?;
//! println!("PIV application: {}", hex::encode_upper(&fci));
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

mod config;
mod error;
mod transport;

pub use config::{PcscConfig, ShareMode, framing_for};
pub use error::PcscError;
pub use transport::PcscTransport;

// Re-export some pcsc types for convenience
pub use pcsc::{Context, Protocol, Protocols, Scope};
