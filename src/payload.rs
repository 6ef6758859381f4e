//! Attribute payload serialization
//!
//! The attribute map is framed with length prefixes only, so no character in
//! a key or value is ever special:
//!
//! ```text
//! count      u16
//! repeat count times:
//!   key_len    u16, key   (UTF-8)
//!   value_len  u16, value (UTF-8)
//! ```

use crate::binary::{read_prefixed, read_u16_be, write_prefixed, write_u16_be};
use std::collections::BTreeMap;
use std::io::{self, Cursor};
use thiserror::Error;

/// String attributes carried by a token
pub type AttributeMap = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Payload truncated")]
    Truncated,

    #[error("{0} unexpected trailing bytes after the last attribute")]
    TrailingBytes(usize),

    #[error("Attribute {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("Duplicate attribute key: {0}")]
    DuplicateKey(String),

    #[error("Too many attributes: {count} exceeds {max}")]
    TooManyAttributes { count: usize, max: usize },

    #[error("Attribute field too large: {size} bytes exceeds {max}")]
    FieldTooLarge { size: usize, max: usize },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl PayloadError {
    /// Returns true if the failure came from the caller's attributes rather
    /// than from a received payload
    pub fn is_oversize(&self) -> bool {
        matches!(
            self,
            PayloadError::TooManyAttributes { .. } | PayloadError::FieldTooLarge { .. }
        )
    }
}

/// Serialize an attribute map into payload bytes
pub fn serialize(attributes: &AttributeMap) -> Result<Vec<u8>, PayloadError> {
    let count = u16::try_from(attributes.len()).map_err(|_| PayloadError::TooManyAttributes {
        count: attributes.len(),
        max: u16::MAX as usize,
    })?;

    let capacity = 2 + attributes
        .iter()
        .map(|(k, v)| 4 + k.len() + v.len())
        .sum::<usize>();
    let mut out = Vec::with_capacity(capacity);
    write_u16_be(&mut out, count)?;

    for (key, value) in attributes {
        for field in [key, value] {
            if field.len() > u16::MAX as usize {
                return Err(PayloadError::FieldTooLarge {
                    size: field.len(),
                    max: u16::MAX as usize,
                });
            }
            write_prefixed(&mut out, field.as_bytes())?;
        }
    }

    Ok(out)
}

/// Parse payload bytes back into an attribute map
pub fn deserialize(bytes: &[u8]) -> Result<AttributeMap, PayloadError> {
    let mut reader = Cursor::new(bytes);
    let count = read_u16_be(&mut reader).map_err(truncation)?;

    let mut attributes = AttributeMap::new();
    for _ in 0..count {
        let key = read_prefixed(&mut reader).map_err(truncation)?;
        let value = read_prefixed(&mut reader).map_err(truncation)?;

        let key = String::from_utf8(key).map_err(|_| PayloadError::InvalidUtf8 { field: "key" })?;
        let value =
            String::from_utf8(value).map_err(|_| PayloadError::InvalidUtf8 { field: "value" })?;

        if attributes.contains_key(&key) {
            return Err(PayloadError::DuplicateKey(key));
        }
        attributes.insert(key, value);
    }

    let consumed = reader.position() as usize;
    if consumed != bytes.len() {
        return Err(PayloadError::TrailingBytes(bytes.len() - consumed));
    }

    Ok(attributes)
}

fn truncation(err: io::Error) -> PayloadError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        PayloadError::Truncated
    } else {
        PayloadError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_exact_layout() {
        let bytes = serialize(&attrs(&[("a", "bc")])).unwrap();
        assert_eq!(bytes, vec![0, 1, 0, 1, b'a', 0, 2, b'b', b'c']);
    }

    #[test]
    fn test_empty_map() {
        let bytes = serialize(&AttributeMap::new()).unwrap();
        assert_eq!(bytes, vec![0, 0]);
        assert!(deserialize(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_special_characters_need_no_escaping() {
        let map = attrs(&[
            ("last_name", "D'angelo"),
            ("quote", "say \"hi\"\n= \\ ;"),
            ("subject", "André"),
            ("empty", ""),
        ]);
        let bytes = serialize(&map).unwrap();
        assert_eq!(deserialize(&bytes).unwrap(), map);
    }

    #[test]
    fn test_truncated_payload_fails() {
        let bytes = serialize(&attrs(&[("subject", "john@example.com")])).unwrap();
        for cut in [1, 3, bytes.len() - 1] {
            assert!(matches!(
                deserialize(&bytes[..cut]),
                Err(PayloadError::Truncated)
            ));
        }
    }

    #[test]
    fn test_inflated_count_fails() {
        let mut bytes = serialize(&attrs(&[("a", "b")])).unwrap();
        bytes[1] = 2;
        assert!(matches!(deserialize(&bytes), Err(PayloadError::Truncated)));
    }

    #[test]
    fn test_trailing_bytes_fail() {
        let mut bytes = serialize(&attrs(&[("a", "b")])).unwrap();
        bytes.push(0);
        assert!(matches!(
            deserialize(&bytes),
            Err(PayloadError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_duplicate_key_fails() {
        let bytes = vec![0, 2, 0, 1, b'k', 0, 1, b'x', 0, 1, b'k', 0, 1, b'y'];
        assert!(matches!(
            deserialize(&bytes),
            Err(PayloadError::DuplicateKey(k)) if k == "k"
        ));
    }

    #[test]
    fn test_invalid_utf8_fails() {
        let bytes = vec![0, 1, 0, 1, 0xFF, 0, 0];
        assert!(matches!(
            deserialize(&bytes),
            Err(PayloadError::InvalidUtf8 { field: "key" })
        ));
    }

    #[test]
    fn test_oversized_value_rejected_on_serialize() {
        let value = "x".repeat(u16::MAX as usize + 1);
        let map = attrs(&[("k", value.as_str())]);
        let err = serialize(&map).unwrap_err();
        assert!(err.is_oversize());
    }
}
