//! High-level OpenToken API
//!
//! [`OpenToken`] is an immutable context holding the shared password, the
//! cipher used for new tokens, and the clock-skew tolerance. Build one at
//! startup and share it by reference; every call derives its own keys and IV.
//!
//! The free functions [`encode`] and [`decode`] take everything explicitly for
//! callers that do not want a context.

use crate::cipher::CipherSuite;
use crate::envelope::{Envelope, EnvelopeError};
use crate::error::{ConfigError, InvalidTokenError, OpenTokenError, TokenExpiredError};
use crate::keys::derive_keys;
use crate::payload::{self, AttributeMap, PayloadError};
use crate::token::Token;
use crate::transport;
use crate::validation::{
    format_timestamp, TemporalPolicy, NOT_BEFORE, NOT_ON_OR_AFTER, RENEW_UNTIL,
};
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Cipher used for new tokens unless configured otherwise
pub const DEFAULT_CIPHER: CipherSuite = CipherSuite::Aes128Cbc;

/// Encode attributes into token text
///
/// The payload is compressed when that makes it smaller.
///
/// # Example
///
/// ```
/// use opentoken::{decode, encode, AttributeMap, CipherSuite};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let attrs = AttributeMap::from([("subject".to_string(), "john@example.com".to_string())]);
/// let text = encode(&attrs, CipherSuite::Aes256Cbc, "Password1")?;
///
/// let token = decode(&text, "Password1", chrono::Utc::now(), chrono::Duration::seconds(5))?;
/// assert_eq!(token.subject(), Some("john@example.com"));
/// # Ok(())
/// # }
/// ```
pub fn encode(
    attributes: &AttributeMap,
    cipher: CipherSuite,
    password: &str,
) -> Result<String, OpenTokenError> {
    require_password(password)?;
    encode_token(attributes, cipher, password, true)
}

/// Decode and verify token text, checking its validity window at `now`
pub fn decode(
    text: &str,
    password: &str,
    now: DateTime<Utc>,
    skew: Duration,
) -> Result<Token, OpenTokenError> {
    if text.is_empty() {
        return Err(InvalidTokenError::Missing.into());
    }
    require_password(password)?;
    decode_token(text, password, now, &TemporalPolicy::new(skew))
}

/// How long issued tokens stay valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLifetime {
    /// Gap between `not-before` and `not-on-or-after`
    pub lifetime: Duration,
    /// Gap between `not-before` and `renew-until`
    pub renew_window: Duration,
}

impl Default for TokenLifetime {
    fn default() -> Self {
        Self {
            lifetime: Duration::minutes(5),
            renew_window: Duration::hours(12),
        }
    }
}

/// Shared, read-only token context
///
/// # Examples
///
/// ```
/// use opentoken::{AttributeMap, CipherSuite, OpenToken};
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = OpenToken::builder("Password1")
///     .cipher(CipherSuite::Aes256Cbc)
///     .build()?;
///
/// let attrs = AttributeMap::from([("subject".to_string(), "john@example.com".to_string())]);
/// let text = ctx.issue(&attrs, chrono::Utc::now())?;
/// let token = ctx.decode(&text)?;
/// assert!(token.valid_until().is_some());
/// # Ok(())
/// # }
/// ```
pub struct OpenToken {
    password: Zeroizing<String>,
    cipher: CipherSuite,
    policy: TemporalPolicy,
    compress: bool,
    lifetime: TokenLifetime,
}

impl OpenToken {
    /// Start building a context for `password`
    pub fn builder(password: impl Into<String>) -> OpenTokenBuilder {
        OpenTokenBuilder::new(password.into())
    }

    /// Context with default cipher, skew, and lifetime
    pub fn new(password: impl Into<String>) -> Result<Self, OpenTokenError> {
        Self::builder(password).build()
    }

    /// Cipher used by [`OpenToken::encode`]
    pub fn cipher(&self) -> CipherSuite {
        self.cipher
    }

    /// Clock-skew tolerance used when decoding
    pub fn clock_skew(&self) -> Duration {
        self.policy.clock_skew()
    }

    /// Lifetime stamped by [`OpenToken::issue`]
    pub fn lifetime(&self) -> TokenLifetime {
        self.lifetime
    }

    /// Encode attributes with the configured cipher
    pub fn encode(&self, attributes: &AttributeMap) -> Result<String, OpenTokenError> {
        self.encode_with(attributes, self.cipher)
    }

    /// Encode attributes with an explicit cipher
    pub fn encode_with(
        &self,
        attributes: &AttributeMap,
        cipher: CipherSuite,
    ) -> Result<String, OpenTokenError> {
        encode_token(attributes, cipher, &self.password, self.compress)
    }

    /// Stamp a validity window onto the attributes and encode them
    ///
    /// `not-before`, `not-on-or-after`, and `renew-until` are only added when
    /// the caller has not set them.
    pub fn issue(
        &self,
        attributes: &AttributeMap,
        now: DateTime<Utc>,
    ) -> Result<String, OpenTokenError> {
        let offset = |delta: Duration| {
            now.checked_add_signed(delta)
                .map(format_timestamp)
                .ok_or_else(|| OpenTokenError::Encoding(format!("{now} + {delta} out of range")))
        };

        let mut stamped = attributes.clone();
        if !stamped.contains_key(NOT_BEFORE) {
            stamped.insert(NOT_BEFORE.to_string(), format_timestamp(now));
        }
        if !stamped.contains_key(NOT_ON_OR_AFTER) {
            stamped.insert(NOT_ON_OR_AFTER.to_string(), offset(self.lifetime.lifetime)?);
        }
        if !stamped.contains_key(RENEW_UNTIL) {
            stamped.insert(RENEW_UNTIL.to_string(), offset(self.lifetime.renew_window)?);
        }
        self.encode(&stamped)
    }

    /// Decode token text, checking the validity window against the system clock
    pub fn decode(&self, text: &str) -> Result<Token, OpenTokenError> {
        self.decode_at(text, Utc::now())
    }

    /// Decode token text, checking the validity window at `now`
    pub fn decode_at(&self, text: &str, now: DateTime<Utc>) -> Result<Token, OpenTokenError> {
        decode_token(text, &self.password, now, &self.policy)
    }

    /// Decode a token that may be absent, e.g. a missing header or cookie
    pub fn decode_optional(&self, text: Option<&str>) -> Result<Token, OpenTokenError> {
        match text {
            Some(text) => self.decode(text),
            None => Err(InvalidTokenError::Missing.into()),
        }
    }
}

impl fmt::Debug for OpenToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenToken")
            .field("password", &"<redacted>")
            .field("cipher", &self.cipher)
            .field("policy", &self.policy)
            .field("compress", &self.compress)
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Builder for [`OpenToken`]
pub struct OpenTokenBuilder {
    password: Zeroizing<String>,
    cipher: CipherSuite,
    clock_skew: Option<Duration>,
    compress: bool,
    lifetime: TokenLifetime,
}

impl OpenTokenBuilder {
    pub(crate) fn new(password: String) -> Self {
        Self {
            password: Zeroizing::new(password),
            cipher: DEFAULT_CIPHER,
            clock_skew: None,
            compress: true,
            lifetime: TokenLifetime::default(),
        }
    }

    /// Cipher for new tokens
    pub fn cipher(mut self, cipher: CipherSuite) -> Self {
        self.cipher = cipher;
        self
    }

    /// Tolerance applied to both validity bounds
    pub fn clock_skew(mut self, skew: Duration) -> Self {
        self.clock_skew = Some(skew);
        self
    }

    /// Whether to try compressing payloads
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Validity window stamped by [`OpenToken::issue`]
    pub fn lifetime(mut self, lifetime: TokenLifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn build(self) -> Result<OpenToken, OpenTokenError> {
        require_password(&self.password)?;
        let policy = self
            .clock_skew
            .map(TemporalPolicy::new)
            .unwrap_or_default();

        Ok(OpenToken {
            password: self.password,
            cipher: self.cipher,
            policy,
            compress: self.compress,
            lifetime: self.lifetime,
        })
    }
}

fn require_password(password: &str) -> Result<(), OpenTokenError> {
    if password.is_empty() {
        return Err(ConfigError::EmptyPassword.into());
    }
    Ok(())
}

fn encode_token(
    attributes: &AttributeMap,
    cipher: CipherSuite,
    password: &str,
    compress: bool,
) -> Result<String, OpenTokenError> {
    let payload = payload::serialize(attributes).map_err(payload_error)?;
    let keys = derive_keys(password, cipher);

    let envelope = Envelope::seal(&payload, cipher, &keys, compress).map_err(|err| match err {
        EnvelopeError::PayloadTooLarge { size, max } => {
            OpenTokenError::PayloadTooLarge { size, max }
        }
        other => OpenTokenError::Encoding(other.to_string()),
    })?;
    let bytes = envelope
        .to_bytes()
        .map_err(|err| OpenTokenError::Encoding(err.to_string()))?;

    let text = transport::encode_text(&bytes);
    debug!(
        cipher = %cipher,
        attributes = attributes.len(),
        token_len = text.len(),
        "Encoded token"
    );
    Ok(text)
}

fn payload_error(err: PayloadError) -> OpenTokenError {
    match err {
        PayloadError::TooManyAttributes { count, max } => {
            OpenTokenError::PayloadTooLarge { size: count, max }
        }
        PayloadError::FieldTooLarge { size, max } => OpenTokenError::PayloadTooLarge { size, max },
        other => OpenTokenError::Encoding(other.to_string()),
    }
}

fn decode_token(
    text: &str,
    password: &str,
    now: DateTime<Utc>,
    policy: &TemporalPolicy,
) -> Result<Token, OpenTokenError> {
    if text.is_empty() {
        return Err(InvalidTokenError::Missing.into());
    }

    let bytes = transport::decode_text(text).map_err(InvalidTokenError::from)?;
    let envelope = Envelope::parse(&bytes).map_err(InvalidTokenError::from)?;
    let cipher = envelope.cipher();

    let keys = derive_keys(password, cipher);
    let verified = envelope.verify(&keys).map_err(|err| {
        warn!(cipher = %cipher, "Rejected token: {}", err);
        InvalidTokenError::from(err)
    })?;
    let payload = verified.decrypt(&keys).map_err(InvalidTokenError::from)?;
    let attributes = payload::deserialize(&payload).map_err(InvalidTokenError::from)?;
    let token = Token::from_attributes(attributes).map_err(InvalidTokenError::Timestamp)?;

    if let Err(reason) = policy.check(token.window(), now) {
        debug!(%now, "Rejected token outside validity window: {}", reason);
        return Err(TokenExpiredError::new(reason, token).into());
    }

    debug!(cipher = %cipher, attributes = token.len(), "Decoded token");
    Ok(token)
}
