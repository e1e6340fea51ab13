//! Tests against a live PC/SC reader
//!
//! Each test skips when no PC/SC service, reader or card is available.

use std::ffi::CString;

use biocard_apdu_core::{CardExecutor, CardTransport, Executor, Template};
use biocard_apdu_pcsc::{Context, PcscConfig, PcscTransport, Protocols, Scope, ShareMode};
use pcsc::Disposition;

fn first_reader() -> Option<(Context, CString)> {
    let context = match Context::establish(Scope::User) {
        Ok(context) => context,
        Err(e) => {
            println!("Skipping, PC/SC unavailable: {e}");
            return None;
        }
    };

    let reader = match context.list_readers_owned() {
        Ok(readers) => readers.into_iter().next(),
        Err(e) => {
            println!("Skipping, cannot list readers: {e}");
            None
        }
    }?;

    Some((context, reader))
}

fn connect(config: PcscConfig) -> Option<PcscTransport> {
    let (context, reader) = first_reader()?;
    match PcscTransport::connect(&context, &reader, config) {
        Ok(transport) => Some(transport),
        Err(e) => {
            println!("Skipping, cannot connect to {reader:?}: {e}");
            None
        }
    }
}

#[test]
fn test_connect_reports_card() {
    let Some(transport) = connect(PcscConfig::default()) else {
        return;
    };

    assert!(transport.is_connected());
    assert!(transport.protocol().is_some());
    assert!(!transport.atr().unwrap().is_empty());
    assert!(!transport.reader_name().to_bytes().is_empty());
}

#[test]
fn test_shared_exchange_releases_card() {
    let Some((context, reader)) = first_reader() else {
        return;
    };
    let config = PcscConfig::new().with_share_mode(ShareMode::Shared);
    let transport = match PcscTransport::connect(&context, &reader, config) {
        Ok(transport) => transport,
        Err(e) => {
            println!("Skipping, cannot connect to {reader:?}: {e}");
            return;
        }
    };
    let mut executor = CardExecutor::new(transport);
    executor.exchange(&Template::PivSelect.command()).unwrap();

    // A second handle can only take the card once the exchange let go of it
    let mut other = match context.connect(&reader, pcsc::ShareMode::Shared, Protocols::ANY) {
        Ok(card) => card,
        Err(e) => {
            println!("Skipping, cannot open a second handle: {e}");
            return;
        }
    };
    let transaction = other.transaction().unwrap();
    transaction
        .end(Disposition::LeaveCard)
        .map_err(|(_, e)| e)
        .unwrap();

    executor.exchange(&Template::PivSelect.command()).unwrap();
}

#[test]
fn test_select_returns_status() {
    let Some(transport) = connect(PcscConfig::default()) else {
        return;
    };

    let mut executor = CardExecutor::new(transport);
    // Cards without a PIV applet answer with an error status, which is still a reply
    let response = executor.exchange(&Template::PivSelect.command()).unwrap();
    println!(
        "SELECT PIV: {} {}",
        response.status(),
        hex::encode_upper(response.payload())
    );
    assert!(!response.status().is_undefined());
}
