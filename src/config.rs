//! Loading an [`OpenToken`] context from configuration
//!
//! Settings can come from JSON (for services that keep their configuration in
//! a file or secret store) or from environment variables:
//!
//! | variable                    | field             |
//! |-----------------------------|-------------------|
//! | `OPENTOKEN_PASSWORD`        | `password`        |
//! | `OPENTOKEN_CIPHER`          | `cipher`          |
//! | `OPENTOKEN_CLOCK_SKEW_SECS` | `clock_skew_secs` |
//! | `OPENTOKEN_COMPRESS`        | `compress`        |
//! | `OPENTOKEN_LIFETIME_SECS`   | `lifetime_secs`   |
//! | `OPENTOKEN_RENEW_SECS`      | `renew_window_secs` |

use crate::cipher::CipherSuite;
use crate::codec::{OpenToken, TokenLifetime, DEFAULT_CIPHER};
use crate::error::{ConfigError, OpenTokenError};
use crate::validation::DEFAULT_CLOCK_SKEW_SECS;
use chrono::Duration;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Raw token settings
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenConfig {
    pub password: String,
    pub cipher: String,
    pub clock_skew_secs: i64,
    pub compress: bool,
    pub lifetime_secs: i64,
    pub renew_window_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        let lifetime = TokenLifetime::default();
        Self {
            password: String::new(),
            cipher: DEFAULT_CIPHER.name().to_string(),
            clock_skew_secs: DEFAULT_CLOCK_SKEW_SECS,
            compress: true,
            lifetime_secs: lifetime.lifetime.num_seconds(),
            renew_window_secs: lifetime.renew_window.num_seconds(),
        }
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("password", &"<redacted>")
            .field("cipher", &self.cipher)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .field("compress", &self.compress)
            .field("lifetime_secs", &self.lifetime_secs)
            .field("renew_window_secs", &self.renew_window_secs)
            .finish()
    }
}

impl TokenConfig {
    /// Parse settings from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read settings from `OPENTOKEN_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(password) = lookup("OPENTOKEN_PASSWORD") {
            config.password = password;
        }
        if let Some(cipher) = lookup("OPENTOKEN_CIPHER") {
            config.cipher = cipher;
        }
        if let Some(skew) = parse_var(&lookup, "OPENTOKEN_CLOCK_SKEW_SECS")? {
            config.clock_skew_secs = skew;
        }
        if let Some(compress) = parse_var(&lookup, "OPENTOKEN_COMPRESS")? {
            config.compress = compress;
        }
        if let Some(lifetime) = parse_var(&lookup, "OPENTOKEN_LIFETIME_SECS")? {
            config.lifetime_secs = lifetime;
        }
        if let Some(renew) = parse_var(&lookup, "OPENTOKEN_RENEW_SECS")? {
            config.renew_window_secs = renew;
        }
        Ok(config)
    }

    /// Build the token context described by these settings
    pub fn build(&self) -> Result<OpenToken, OpenTokenError> {
        let cipher = CipherSuite::from_str(&self.cipher).map_err(ConfigError::from)?;
        OpenToken::builder(self.password.clone())
            .cipher(cipher)
            .clock_skew(seconds("clock_skew_secs", self.clock_skew_secs)?)
            .compress(self.compress)
            .lifetime(TokenLifetime {
                lifetime: seconds("lifetime_secs", self.lifetime_secs)?,
                renew_window: seconds("renew_window_secs", self.renew_window_secs)?,
            })
            .build()
    }
}

fn seconds(field: &'static str, value: i64) -> Result<Duration, ConfigError> {
    Duration::try_seconds(value).ok_or(ConfigError::OutOfRange { field, value })
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Env { var, value })
        })
        .transpose()
}
