//! OpenToken
//!
//! Signed, encrypted, URL-safe bearer tokens carrying a flat map of string
//! attributes. A token is an envelope (`OTK`, version, cipher, IV, ciphertext,
//! HMAC-SHA1) rendered as URL-safe base64 with `*` padding.
//!
//! Decoding verifies the signature before anything is decrypted, then checks
//! the `not-before` / `not-on-or-after` window with a symmetric clock skew.
//!
//! # Example
//!
//! ```
//! use opentoken::{AttributeMap, OpenToken};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = OpenToken::new("Password1")?;
//! let attrs = AttributeMap::from([("subject".to_string(), "john@example.com".to_string())]);
//!
//! let text = ctx.issue(&attrs, chrono::Utc::now())?;
//! let token = ctx.decode(&text)?;
//! assert_eq!(token.subject(), Some("john@example.com"));
//! # Ok(())
//! # }
//! ```

pub mod binary;
pub mod cipher;
mod codec;
pub mod compression;
pub mod config;
pub mod envelope;
pub mod error;
pub mod keys;
pub mod payload;
pub mod prelude;
pub mod signature;
pub mod token;
pub mod transport;
pub mod validation;

// Re-export commonly used types
pub use cipher::{CipherError, CipherSuite, MacAlgorithm};
pub use codec::{decode, encode, OpenToken, OpenTokenBuilder, TokenLifetime, DEFAULT_CIPHER};
pub use config::TokenConfig;
pub use error::{ConfigError, InvalidTokenError, OpenTokenError, TokenExpiredError};
pub use payload::AttributeMap;
pub use token::{ReservedAttribute, Token};
pub use validation::{
    format_timestamp, parse_timestamp, TemporalError, TemporalPolicy, ValidityWindow,
};
