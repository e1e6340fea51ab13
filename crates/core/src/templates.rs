//! Registry of well-known card commands
//!
//! Each [`Template`] builds a fresh [`Command`] on every call, so attaching a
//! payload never touches shared state.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::Command;
use crate::constants::limits::{PIN_LENGTH, PIN_PAD};
use crate::constants::{cla, ins};
use crate::{Error, Result};

/// PIV card application identifier
pub const PIV_AID: [u8; 11] = [
    0xA0, 0x00, 0x00, 0x03, 0x08, 0x00, 0x00, 0x10, 0x00, 0x01, 0x00,
];

/// Match-on-card application identifier
pub const MOC_AID: [u8; 16] = [
    0xF0, 0x4E, 0x49, 0x53, 0x54, 0x20, 0x4D, 0x4F, 0x43, 0x20, 0x54, 0x53, 0x54, 0x20, 0x50, 0x31,
];

/// Known command templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    /// Switch a dual-interface PIV card to contact mode
    PivSetContactMode,
    /// Select the PIV application
    PivSelect,
    /// Verify the PIV PIN; see [`verify_pin`]
    PivVerifyPin,
    /// Reset the PIN retry counter; see [`reset_retry_counter`]
    PivResetRetryCounter,
    /// Read the card authentication certificate
    PivGetCardAuthCert,
    /// Read the Card Holder Unique Identifier
    PivGetChuid,
    /// Read the fingerprint templates
    PivGetFingerprints,
    /// Read the PIV authentication certificate
    PivGetPivAuthCert,
    /// Read the security object
    PivGetSecurityObject,
    /// Read the card capability container
    PivGetCcc,
    /// Read the facial image
    PivGetFace,
    /// Read the printed information
    PivGetPrintedInfo,
    /// Read the digital signature certificate
    PivGetDigitalSigCert,
    /// Read the key management certificate
    PivGetKeyMgmtCert,
    /// Select the match-on-card application
    MocSelect,
    /// Select the match-on-card application, returning FCI
    MocSelectAlt,
    /// Store an enrollment template; data attached by the caller
    MocStoreTemplate,
    /// Read the Biometric Information Template group
    MocReadBit,
    /// Verify a probe template; data attached by the caller
    MocVerify,
    /// Read the score of the last verification
    MocGetScore,
    /// Read the card identifier
    MocGetCardId,
    /// Read the matcher identifier
    MocGetMatcherId,
    /// GET RESPONSE; Le attached by the caller
    GetResponse,
}

impl Template {
    /// Every template, in declaration order
    pub const ALL: [Self; 23] = [
        Self::PivSetContactMode,
        Self::PivSelect,
        Self::PivVerifyPin,
        Self::PivResetRetryCounter,
        Self::PivGetCardAuthCert,
        Self::PivGetChuid,
        Self::PivGetFingerprints,
        Self::PivGetPivAuthCert,
        Self::PivGetSecurityObject,
        Self::PivGetCcc,
        Self::PivGetFace,
        Self::PivGetPrintedInfo,
        Self::PivGetDigitalSigCert,
        Self::PivGetKeyMgmtCert,
        Self::MocSelect,
        Self::MocSelectAlt,
        Self::MocStoreTemplate,
        Self::MocReadBit,
        Self::MocVerify,
        Self::MocGetScore,
        Self::MocGetCardId,
        Self::MocGetMatcherId,
        Self::GetResponse,
    ];

    /// Identifier used by [`by_name`](Self::by_name)
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PivSetContactMode => "piv-set-contact-mode",
            Self::PivSelect => "piv-select",
            Self::PivVerifyPin => "piv-verify-pin",
            Self::PivResetRetryCounter => "piv-reset-retry-counter",
            Self::PivGetCardAuthCert => "piv-get-card-auth-cert",
            Self::PivGetChuid => "piv-get-chuid",
            Self::PivGetFingerprints => "piv-get-fingerprints",
            Self::PivGetPivAuthCert => "piv-get-piv-auth-cert",
            Self::PivGetSecurityObject => "piv-get-security-object",
            Self::PivGetCcc => "piv-get-ccc",
            Self::PivGetFace => "piv-get-face",
            Self::PivGetPrintedInfo => "piv-get-printed-info",
            Self::PivGetDigitalSigCert => "piv-get-digital-sig-cert",
            Self::PivGetKeyMgmtCert => "piv-get-key-mgmt-cert",
            Self::MocSelect => "moc-select",
            Self::MocSelectAlt => "moc-select-alt",
            Self::MocStoreTemplate => "moc-store-template",
            Self::MocReadBit => "moc-read-bit",
            Self::MocVerify => "moc-verify",
            Self::MocGetScore => "moc-get-score",
            Self::MocGetCardId => "moc-get-card-id",
            Self::MocGetMatcherId => "moc-get-matcher-id",
            Self::GetResponse => "get-response",
        }
    }

    /// Human-readable label carried by the built command
    pub const fn description(&self) -> &'static str {
        match self {
            Self::PivSetContactMode => "Set Contact Mode",
            Self::PivSelect => "Select PIV Application",
            Self::PivVerifyPin => "Verify PIN",
            Self::PivResetRetryCounter => "Reset PIN Retry Counter",
            Self::PivGetCardAuthCert => "Get Card Auth Cert",
            Self::PivGetChuid => "Get CHUID",
            Self::PivGetFingerprints => "Get Fingerprints",
            Self::PivGetPivAuthCert => "Get PIV Auth Cert",
            Self::PivGetSecurityObject => "Get Security Object",
            Self::PivGetCcc => "Get Card Capability Container",
            Self::PivGetFace => "Get Face",
            Self::PivGetPrintedInfo => "Get Printed Info",
            Self::PivGetDigitalSigCert => "Get Digital Signature Cert",
            Self::PivGetKeyMgmtCert => "Get Key Management Cert",
            Self::MocSelect => "Select MOC Application",
            Self::MocSelectAlt => "Alternative Select MOC Application",
            Self::MocStoreTemplate => "Store Enrollment Template",
            Self::MocReadBit => "Read BIT",
            Self::MocVerify => "MOC Verify",
            Self::MocGetScore => "MOC Get Score",
            Self::MocGetCardId => "MOC Get Card ID",
            Self::MocGetMatcherId => "MOC Get Matcher ID",
            Self::GetResponse => "Get Response",
        }
    }

    /// Look a template up by its [`name`](Self::name)
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Build the command for this template
    pub fn command(&self) -> Command {
        let command = match self {
            Self::PivSetContactMode => {
                Command::new(cla::PROPRIETARY, ins::SET_CONTACT_MODE, 0x00, 0x00)
            }
            Self::PivSelect => select(0x00, Bytes::from_static(&PIV_AID)),
            Self::PivVerifyPin => Command::new(cla::ISO, ins::VERIFY, 0x00, 0x80),
            Self::PivResetRetryCounter => {
                Command::new(cla::ISO, ins::RESET_RETRY_COUNTER, 0x00, 0x80)
            }
            Self::PivGetCardAuthCert => piv_data_object(0x01),
            Self::PivGetChuid => piv_data_object(0x02),
            Self::PivGetFingerprints => piv_data_object(0x03),
            Self::PivGetPivAuthCert => piv_data_object(0x05),
            Self::PivGetSecurityObject => piv_data_object(0x06),
            Self::PivGetCcc => piv_data_object(0x07),
            Self::PivGetFace => piv_data_object(0x08),
            Self::PivGetPrintedInfo => piv_data_object(0x09),
            Self::PivGetDigitalSigCert => piv_data_object(0x0A),
            Self::PivGetKeyMgmtCert => piv_data_object(0x0B),
            Self::MocSelect => select(0x0C, Bytes::from_static(&MOC_AID)),
            Self::MocSelectAlt => select(0x00, Bytes::from_static(&MOC_AID)),
            Self::MocStoreTemplate => Command::new(cla::ISO, ins::PUT_DATA, 0x3F, 0xFF),
            Self::MocReadBit => moc_data_object(&[0x5C, 0x02, 0x7F, 0x61], 0x00),
            Self::MocVerify => Command::new(cla::ISO, ins::VERIFY_BIOMETRIC, 0x00, 0x00),
            Self::MocGetScore => moc_data_object(&[0x5C, 0x01, 0xC0], 0x04),
            Self::MocGetCardId => moc_data_object(&[0x5C, 0x01, 0x66], 0x00),
            Self::MocGetMatcherId => moc_data_object(&[0x5C, 0x01, 0x6E], 0x00),
            Self::GetResponse => Command::new(cla::ISO, ins::GET_RESPONSE, 0x00, 0x00),
        };
        command.with_description(self.description())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn select(p2: u8, aid: Bytes) -> Command {
    Command::new_with_data(cla::ISO, ins::SELECT, 0x04, p2, aid)
}

fn piv_data_object(id: u8) -> Command {
    let tag_list = [0x5C, 0x03, 0x5F, 0xC1, id];
    Command::new_with_data(cla::ISO, ins::GET_DATA, 0x3F, 0xFF, tag_list.to_vec())
}

fn moc_data_object(tag_list: &'static [u8], le: u16) -> Command {
    Command::new_with_data_and_le(cla::ISO, ins::GET_DATA, 0x3F, 0xFF, tag_list, le)
}

fn put_pin(buffer: &mut BytesMut, pin: &[u8]) -> Result<()> {
    if pin.len() > PIN_LENGTH {
        return Err(Error::DataTooLong {
            len: pin.len(),
            max: PIN_LENGTH,
        });
    }
    buffer.put_slice(pin);
    buffer.put_bytes(PIN_PAD, PIN_LENGTH - pin.len());
    Ok(())
}

/// VERIFY PIN with the PIN padded to 8 bytes with FF
pub fn verify_pin(pin: &[u8]) -> Result<Command> {
    let mut data = BytesMut::with_capacity(PIN_LENGTH);
    put_pin(&mut data, pin)?;
    Ok(Template::PivVerifyPin.command().with_data(data.freeze()))
}

/// RESET RETRY COUNTER with the new PIN followed by the current PIN, each padded
pub fn reset_retry_counter(new_pin: &[u8], current_pin: &[u8]) -> Result<Command> {
    let mut data = BytesMut::with_capacity(2 * PIN_LENGTH);
    put_pin(&mut data, new_pin)?;
    put_pin(&mut data, current_pin)?;
    Ok(Template::PivResetRetryCounter.command().with_data(data.freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(template: Template) -> String {
        hex::encode_upper(template.command().to_bytes().unwrap())
    }

    #[test]
    fn test_piv_templates() {
        assert_eq!(frame(Template::PivSetContactMode), "C0170000");
        assert_eq!(frame(Template::PivSelect), "00A404000BA000000308000010000100");
        assert_eq!(frame(Template::PivGetChuid), "00CB3FFF055C035FC102");
        assert_eq!(frame(Template::PivGetKeyMgmtCert), "00CB3FFF055C035FC10B");
    }

    #[test]
    fn test_moc_templates() {
        assert_eq!(
            frame(Template::MocSelect),
            "00A4040C10F04E495354204D4F4320545354205031"
        );
        assert_eq!(frame(Template::MocReadBit), "00CB3FFF045C027F6100");
        assert_eq!(frame(Template::MocGetScore), "00CB3FFF035C01C004");
        assert_eq!(frame(Template::MocGetCardId), "00CB3FFF035C016600");
        assert_eq!(frame(Template::MocVerify), "00210000");
    }

    #[test]
    fn test_template_carries_description() {
        let command = Template::MocGetScore.command();
        assert_eq!(command.description(), "MOC Get Score");
        assert_eq!(command.le, Some(0x04));
    }

    #[test]
    fn test_by_name() {
        for template in Template::ALL {
            assert_eq!(Template::by_name(template.name()), Some(template));
        }
        assert_eq!(Template::by_name("moc-read-bit"), Some(Template::MocReadBit));
        assert_eq!(Template::by_name("unknown"), None);
    }

    #[test]
    fn test_attached_data_does_not_leak() {
        let store = Template::MocStoreTemplate.command().with_data(vec![0x7F, 0x2E, 0x00]);
        assert_eq!(store.data_len(), 3);
        assert!(Template::MocStoreTemplate.command().data.is_none());
    }

    #[test]
    fn test_verify_pin_padding() {
        let command = verify_pin(b"123456").unwrap();
        assert_eq!(
            hex::encode_upper(command.to_bytes().unwrap()),
            "0020008008313233343536FFFF"
        );
        assert_eq!(command.description(), "Verify PIN");

        assert_eq!(
            verify_pin(b"123456789"),
            Err(Error::DataTooLong { len: 9, max: 8 })
        );
    }

    #[test]
    fn test_reset_retry_counter() {
        let command = reset_retry_counter(b"87654321", b"1234").unwrap();
        assert_eq!(command.data_len(), 16);
        assert_eq!(
            command.data_bytes(),
            [&b"87654321"[..], b"1234", &[0xFF; 4]].concat()
        );
    }
}
