//! Hexadecimal helpers, used for seeds.

use crate::error::FormatError;

/// Decode a hex string into bytes. Upper and lower case digits are accepted.
pub fn decode_hex(s: &str) -> Result<Vec<u8>, FormatError> {
    if s.len() % 2 != 0 {
        return Err(FormatError::OddLength(s.len()));
    }
    hex::decode(s).map_err(|err| match err {
        hex::FromHexError::InvalidHexCharacter { c, index } => FormatError::InvalidCharacter {
            character: c,
            index,
        },
        hex::FromHexError::OddLength => FormatError::OddLength(s.len()),
        hex::FromHexError::InvalidStringLength => FormatError::WrongLength {
            expected: s.len() / 2,
            actual: 0,
        },
    })
}

/// Encode bytes as lowercase hex.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
