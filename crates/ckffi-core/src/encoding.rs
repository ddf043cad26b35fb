//! Text normalization across the generic bridge.
//!
//! The bridge speaks a fixed encoding chosen by the host runtime. These two
//! functions are the only place that knows about it; backends receive the
//! [`TextEncoding`] once at construction and pass it through.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Wire encoding of bridge strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextEncoding {
    /// Bytes are UTF-8, no terminator.
    Utf8,
    /// Bytes are little-endian UTF-16 code units, possibly with a trailing NUL unit.
    Utf16,
}

/// Encode `text` for hand-off to the bridge.
#[must_use]
pub fn encode(text: &str, enc: TextEncoding) -> Vec<u8> {
    match enc {
        TextEncoding::Utf8 => text.as_bytes().to_vec(),
        TextEncoding::Utf16 => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
    }
}

/// Decode bytes returned by the bridge into a Rust string.
///
/// Under [`TextEncoding::Utf16`] a single trailing NUL unit is stripped.
pub fn decode(bytes: &[u8], enc: TextEncoding) -> Result<String> {
    match enc {
        TextEncoding::Utf8 => String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Encoding(format!("invalid UTF-8: {e}"))),
        TextEncoding::Utf16 => {
            if bytes.len() % 2 != 0 {
                return Err(Error::Encoding(format!(
                    "UTF-16 payload has odd length {}",
                    bytes.len()
                )));
            }
            let mut units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|p| u16::from_le_bytes([p[0], p[1]]))
                .collect();
            if units.last() == Some(&0) {
                units.pop();
            }
            String::from_utf16(&units).map_err(|e| Error::Encoding(format!("invalid UTF-16: {e}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn utf16_strips_one_trailing_nul() {
        let mut wire = encode("hi theree", TextEncoding::Utf16);
        wire.extend_from_slice(&[0, 0]);
        assert_eq!(decode(&wire, TextEncoding::Utf16).unwrap(), "hi theree");
    }

    #[test]
    fn utf16_rejects_odd_length() {
        let err = decode(&[0x68, 0x00, 0x69], TextEncoding::Utf16).unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
    }

    #[test]
    fn utf8_is_passthrough() {
        assert_eq!(encode("{\"a\":1}", TextEncoding::Utf8), b"{\"a\":1}");
        assert!(decode(&[0xff, 0xfe], TextEncoding::Utf8).is_err());
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(s in "\\PC*", wide in any::<bool>()) {
            let enc = if wide { TextEncoding::Utf16 } else { TextEncoding::Utf8 };
            // A string ending in NUL would lose it to the terminator strip.
            prop_assume!(!s.ends_with('\0'));
            prop_assert_eq!(decode(&encode(&s, enc), enc).unwrap(), s);
        }
    }
}
