//! Unified error type for the OpenToken public API
//!
//! Decoding fails in exactly two ways a caller needs to act on: the token is
//! invalid, or it is valid but outside its time window. Internal modules keep
//! their own error types; they are folded into [`InvalidTokenError`] before
//! crossing the public boundary.
//!
//! # Example
//!
//! ```no_run
//! use opentoken::{OpenToken, OpenTokenError};
//!
//! fn authenticate(ctx: &OpenToken, header: &str) -> Option<String> {
//!     match ctx.decode(header) {
//!         Ok(token) => token.subject().map(str::to_string),
//!         Err(OpenTokenError::TokenExpired(expired))
//!             if expired.token().is_renewable_at(chrono::Utc::now()) =>
//!         {
//!             // send the user through renewal
//!             None
//!         }
//!         Err(_) => None,
//!     }
//! }
//! ```

use crate::cipher::CipherError;
use crate::envelope::EnvelopeError;
use crate::payload::PayloadError;
use crate::token::Token;
use crate::transport::TransportError;
use crate::validation::TemporalError;
use thiserror::Error;

/// Why a token was rejected as malformed
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvalidTokenError {
    #[error("No token supplied")]
    Missing,

    #[error("Transport encoding: {0}")]
    Transport(#[from] TransportError),

    #[error("Envelope: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("Attribute payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("Validity window: {0}")]
    Timestamp(#[source] TemporalError),
}

/// A verified token presented outside its validity window
///
/// The verified token is kept so that a caller can still consult
/// [`Token::valid_until`] when deciding whether to renew the session.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct TokenExpiredError {
    reason: TemporalError,
    token: Box<Token>,
}

impl TokenExpiredError {
    pub(crate) fn new(reason: TemporalError, token: Token) -> Self {
        Self {
            reason,
            token: Box::new(token),
        }
    }

    /// Which bound was violated
    pub fn reason(&self) -> &TemporalError {
        &self.reason
    }

    /// The verified token
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Consume the error, returning the verified token
    pub fn into_token(self) -> Token {
        *self.token
    }
}

/// Caller configuration problems
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Invalid cipher suite: {0}")]
    Cipher(#[from] CipherError),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },

    #[error("{field} out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },
}

/// Unified error type for all OpenToken operations
///
/// # Error Categories
///
/// - **TokenInvalid**: malformed text, envelope, signature, cipher or payload
/// - **TokenExpired**: verified, but outside the `not-before` / `not-on-or-after` window
/// - **Configuration**: empty password or unusable settings
/// - **PayloadTooLarge** / **Encoding**: only raised while encoding
#[derive(Debug, Error)]
pub enum OpenTokenError {
    #[error("Token invalid: {0}")]
    TokenInvalid(#[from] InvalidTokenError),

    #[error("Token expired: {0}")]
    TokenExpired(#[from] TokenExpiredError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Payload too large: {size} exceeds limit of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Encoding failed: {0}")]
    Encoding(String),
}

impl OpenTokenError {
    /// Returns true if the token was malformed or tampered with
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::TokenInvalid(_))
    }

    /// Returns true if the token verified but is outside its time window
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::TokenExpired(_))
    }

    /// Returns true if the caller's configuration was rejected
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns a suggestion for resolving this error
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::TokenInvalid(InvalidTokenError::Envelope(EnvelopeError::Signature(_))) => {
                Some("Check that issuer and verifier share the same password")
            }
            Self::TokenInvalid(InvalidTokenError::Envelope(EnvelopeError::UnsupportedVersion(
                _,
            ))) => Some("The token was produced by an incompatible OpenToken version"),
            Self::TokenExpired(_) => {
                Some("Check clock synchronization or increase the clock skew tolerance")
            }
            Self::Configuration(ConfigError::EmptyPassword) => {
                Some("Configure a non-empty shared password")
            }
            Self::PayloadTooLarge { .. } => Some("Reduce the number or size of attributes"),
            _ => None,
        }
    }
}
