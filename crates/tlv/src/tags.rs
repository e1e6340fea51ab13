//! Tags of the match-on-card and PIV data objects

/// Biometric Information Template group
pub const BIT_GROUP: u32 = 0x7F61;
/// Biometric Information Template
pub const BIT: u32 = 0x7F60;
/// Biometric Header Template
pub const BHT: u32 = 0xA1;
/// Biometric matching algorithm parameters
pub const ALGORITHM_PARAMETERS: u32 = 0xB1;
/// Biometric data template carrying the minutiae to store or verify
pub const BIOMETRIC_DATA_TEMPLATE: u32 = 0x7F2E;

/// Number of BITs in a group
pub const BIT_COUNT: u32 = 0x02;
/// Biometric type, inside the BHT
pub const BIOMETRIC_TYPE: u32 = 0x81;
/// Biometric subtype, inside the BHT
pub const BIOMETRIC_SUBTYPE: u32 = 0x82;
/// CBEFF format owner, inside the BHT
pub const FORMAT_OWNER: u32 = 0x87;
/// CBEFF format type, inside the BHT
pub const FORMAT_TYPE: u32 = 0x88;
/// Minimum and maximum number of minutiae, inside the algorithm parameters
pub const MIN_MAX_MINUTIAE: u32 = 0x81;
/// Minutiae order, inside the algorithm parameters
pub const MINUTIAE_ORDER: u32 = 0x82;
/// Feature handling indicator, inside the algorithm parameters
pub const FEATURE_HANDLING: u32 = 0x83;
/// Finger minutiae data, inside the biometric data template
pub const FINGER_MINUTIAE: u32 = 0x81;

/// Comparison score returned by the matcher
pub const MATCH_SCORE: u32 = 0xC0;
/// Card identifier
pub const CARD_ID: u32 = 0x88;
/// Matcher identifier
pub const MATCHER_ID: u32 = 0x99;
/// Discretionary data wrapper of a PIV data object
pub const DISCRETIONARY_DATA: u32 = 0x53;
/// Proprietary data wrapper
pub const PROPRIETARY_DATA: u32 = 0x73;

/// Biometric type value for fingerprints
pub const BIOMETRIC_TYPE_FINGERPRINT: u8 = 0x08;
/// Feature handling value: no special handling
pub const FEATURE_HANDLING_NONE: u8 = 0x00;
