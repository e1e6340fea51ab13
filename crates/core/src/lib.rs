//! ISO/IEC 7816-4 APDU framing and exchange
//!
//! This crate turns logical card commands into the physical frames a reader
//! transmits, and turns the card's replies back into one response:
//!
//! - [`Command`] models one logical command, with [`templates`] for the PIV
//!   and match-on-card commands
//! - [`framer::Framer`] splits commands into short, chained or extended frames
//! - [`response::assembler::ResponseAssembler`] follows `61 XX` continuations
//!   with GET RESPONSE and reassembles the body
//! - [`CardExecutor`] runs whole exchanges over a [`CardTransport`], one
//!   transaction per exchange
//!
//! Status words are never interpreted on the caller's behalf; retry policy
//! belongs to the layer above.
//!
//! ```
//! use biocard_apdu_core::prelude::*;
//! use biocard_apdu_core::transport::{FnTransport, TransportError};
//!
//! let transport = FnTransport::new(|_: &[u8]| {
//!     Ok::<_, TransportError>(Bytes::from_static(&[0xC0, 0x02, 0x00, 0x2A, 0x90, 0x00]))
//! });
//! let mut executor = CardExecutor::new(transport);
//!
//! let body = executor.execute(&Template::MocGetScore.command())?;
//! assert_eq!(body.as_ref(), &[0xC0, 0x02, 0x00, 0x2A]);
//! # Ok::<(), biocard_apdu_core::Error>(())
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod config;
pub mod constants;
pub mod executor;
pub mod framer;
pub mod response;
pub mod templates;
pub mod transport;

mod error;
pub use error::{Error, Result, ResultExt};

pub use command::{Command, ExpectedLength};
pub use config::{ExchangeConfig, FramingMode};
pub use executor::{CardExecutor, Executor};
pub use framer::{FramePlan, Framer, TransmissionMode};
pub use response::Response;
pub use response::status::StatusWord;
pub use templates::Template;
pub use transport::CardTransport;

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, CardExecutor, Command, Error, ExchangeConfig, FramingMode, Response, Result,
        ResultExt, StatusWord, Template, executor::Executor, transport::CardTransport,
    };
}
