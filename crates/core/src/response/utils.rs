//! Utility functions for APDU response handling

use tracing::debug;

use crate::response::status::StatusWord;

/// Split a raw reply into its status word and the body before it
///
/// Replies shorter than two bytes carry no status word; they yield
/// [`StatusWord::UNDEFINED`] and an empty body.
pub fn split_reply(data: &[u8]) -> (StatusWord, &[u8]) {
    match data {
        [body @ .., sw1, sw2] => (StatusWord::new(*sw1, *sw2), body),
        _ => {
            debug!("Reply too short for a status word: {} bytes", data.len());
            (StatusWord::UNDEFINED, &[])
        }
    }
}
