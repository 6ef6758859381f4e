//! URL-safe text encoding of envelopes
//!
//! Tokens use the base64 URL-safe alphabet (`-` and `_` instead of `+` and
//! `/`) with `*` in place of `=` as the pad character, so an encoded token can
//! sit in a query string, cookie, or header without further escaping.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use thiserror::Error;

/// Pad character used instead of `=`
pub const PAD: char = '*';

const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Token text is empty")]
    Empty,

    #[error("Invalid character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("Padding character in the middle of the token")]
    MisplacedPadding,

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Encode envelope bytes as token text
pub fn encode_text(bytes: &[u8]) -> String {
    ENGINE.encode(bytes).replace('=', "*")
}

/// Decode token text back into envelope bytes
///
/// Any character outside `[A-Za-z0-9_*-]`, whitespace included, is rejected
/// before base64 decoding.
pub fn decode_text(text: &str) -> Result<Vec<u8>, TransportError> {
    if text.is_empty() {
        return Err(TransportError::Empty);
    }

    let mut padding_started = false;
    for (position, character) in text.char_indices() {
        match character {
            PAD => padding_started = true,
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' if !padding_started => {}
            'A'..='Z' | 'a'..='z' | '0'..='9' | '-' | '_' => {
                return Err(TransportError::MisplacedPadding)
            }
            _ => {
                return Err(TransportError::InvalidCharacter {
                    character,
                    position,
                })
            }
        }
    }

    Ok(ENGINE.decode(text.replace(PAD, "="))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_prefix_encoding() {
        // Every OpenToken starts with "T1RL": base64 of "OTK"
        assert!(encode_text(b"OTK\x02").starts_with("T1RL"));
    }

    #[test]
    fn test_url_safe_alphabet_and_star_padding() {
        let encoded = encode_text(&[0xFB, 0xFF]);
        assert_eq!(encoded, "-_8*");
        assert_eq!(decode_text(&encoded).unwrap(), vec![0xFB, 0xFF]);

        assert_eq!(encode_text(&[0xFF]), "_w**");
    }

    #[test]
    fn test_roundtrip_all_lengths() {
        let data: Vec<u8> = (0..=255).collect();
        for len in [0usize, 1, 2, 3, 31, 32, 33, 256] {
            let slice = &data[..len.min(data.len())];
            let encoded = encode_text(slice);
            assert!(!encoded.contains('='));
            assert!(!encoded.contains('+'));
            assert!(!encoded.contains('/'));
            if !slice.is_empty() {
                assert_eq!(decode_text(&encoded).unwrap(), slice);
            }
        }
    }

    #[test]
    fn test_missing_padding_accepted() {
        assert_eq!(decode_text("_w").unwrap(), vec![0xFF]);
    }

    #[test]
    fn test_rejects_standard_alphabet_and_padding() {
        assert!(matches!(
            decode_text("+/8="),
            Err(TransportError::InvalidCharacter { character: '+', position: 0 })
        ));
        assert!(matches!(
            decode_text("_w=="),
            Err(TransportError::InvalidCharacter { character: '=', .. })
        ));
        assert!(matches!(
            decode_text("T1 RL"),
            Err(TransportError::InvalidCharacter { character: ' ', .. })
        ));
    }

    #[test]
    fn test_rejects_padding_in_the_middle() {
        assert!(matches!(
            decode_text("_w**T1RL"),
            Err(TransportError::MisplacedPadding)
        ));
    }

    #[test]
    fn test_empty_and_whitespace() {
        assert!(matches!(decode_text(""), Err(TransportError::Empty)));
        assert!(matches!(
            decode_text("  \n"),
            Err(TransportError::InvalidCharacter { character: ' ', position: 0 })
        ));
    }

    #[test]
    fn test_surrounding_whitespace_rejected() {
        let encoded = encode_text(b"OTK\x02");
        assert!(matches!(
            decode_text(&format!(" {encoded}")),
            Err(TransportError::InvalidCharacter { character: ' ', position: 0 })
        ));
        assert!(matches!(
            decode_text(&format!("{encoded}\n")),
            Err(TransportError::InvalidCharacter { character: '\n', .. })
        ));
    }
}
