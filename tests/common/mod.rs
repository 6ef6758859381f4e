//! Common test utilities for opentoken integration tests
//!
//! This module provides shared helper functions to reduce code duplication
//! across integration test files.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;

// Re-export commonly used types
pub use opentoken::{AttributeMap, CipherSuite, OpenToken, OpenTokenError, Token};

/// Shared password used by most tests
pub const PASSWORD: &str = "Test123";

/// A password that does not match [`PASSWORD`]
pub const WRONG_PASSWORD: &str = "NotTheSamePassword";

/// Ciphers that actually encrypt the payload
pub const ENCRYPTING_CIPHERS: [CipherSuite; 3] = [
    CipherSuite::Aes128Cbc,
    CipherSuite::Aes256Cbc,
    CipherSuite::Des3Cbc,
];

/// Fixed issue instant: `2010-03-04T19:19:15Z`
pub fn issued_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2010, 3, 4, 19, 19, 15).unwrap()
}

/// Issue instant shifted by `secs`
pub fn at_offset(secs: i64) -> DateTime<Utc> {
    issued_at() + Duration::seconds(secs)
}

/// Build an attribute map from string pairs
pub fn attrs(pairs: &[(&str, &str)]) -> AttributeMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A small mix of ASCII, non-ASCII and quote-bearing values
pub fn sample_attrs() -> AttributeMap {
    attrs(&[
        ("subject", "john@example.com"),
        ("first_name", "André"),
        ("last_name", "D'angelo"),
        ("motto", "say \"hello\""),
    ])
}

/// Sample attributes with a five minute window opening at [`issued_at`]
pub fn windowed_attrs() -> AttributeMap {
    let mut map = sample_attrs();
    map.insert("not-before".to_string(), "2010-03-04T19:19:15Z".to_string());
    map.insert(
        "not-on-or-after".to_string(),
        "2010-03-04T19:24:15Z".to_string(),
    );
    map.insert("renew-until".to_string(), "2010-03-05T07:19:15Z".to_string());
    map
}

/// Random string of `len` characters from `'A'..='z'`
///
/// The range includes `[ \ ] ^ _` and the backtick as well as letters.
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range('A'..='z')).collect()
}

/// `count` random pairs with keys and values of `len` characters
pub fn random_attrs(count: usize, len: usize) -> AttributeMap {
    let mut map = AttributeMap::new();
    while map.len() < count {
        map.insert(random_string(len), random_string(len));
    }
    map
}

/// Context with the given cipher and compression setting
pub fn context(cipher: CipherSuite, compress: bool) -> OpenToken {
    OpenToken::builder(PASSWORD)
        .cipher(cipher)
        .compress(compress)
        .build()
        .unwrap()
}
