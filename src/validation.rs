//! Temporal validity of decoded tokens
//!
//! A token may carry three timestamps:
//!
//! - `not-before`: earliest instant the token is accepted
//! - `not-on-or-after`: latest instant the token is accepted
//! - `renew-until`: latest instant the session may be renewed
//!
//! Only the first two decide acceptance. The clock skew widens both bounds by
//! the same amount, so a verifier whose clock runs slightly ahead of or behind
//! the issuer's still accepts a fresh token. `now` is always passed in.

use crate::payload::AttributeMap;
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

/// Attribute holding the earliest acceptance instant
pub const NOT_BEFORE: &str = "not-before";

/// Attribute holding the latest acceptance instant
pub const NOT_ON_OR_AFTER: &str = "not-on-or-after";

/// Attribute holding the renewal deadline
pub const RENEW_UNTIL: &str = "renew-until";

/// Default tolerance applied to both bounds
pub const DEFAULT_CLOCK_SKEW_SECS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemporalError {
    #[error("Token not valid before {not_before} (now {now}, skew {skew_secs}s)")]
    NotYetValid {
        not_before: DateTime<Utc>,
        now: DateTime<Utc>,
        skew_secs: i64,
    },

    #[error("Token not valid on or after {not_on_or_after} (now {now}, skew {skew_secs}s)")]
    Expired {
        not_on_or_after: DateTime<Utc>,
        now: DateTime<Utc>,
        skew_secs: i64,
    },

    #[error("Attribute {attribute} is not an ISO-8601 timestamp: {value:?}")]
    InvalidTimestamp {
        attribute: &'static str,
        value: String,
    },
}

/// Parsed temporal attributes of a token
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    pub not_before: Option<DateTime<Utc>>,
    pub not_on_or_after: Option<DateTime<Utc>>,
    pub renew_until: Option<DateTime<Utc>>,
}

impl ValidityWindow {
    /// Extract and parse the reserved timestamps
    ///
    /// Absent attributes are `None`; present but unparseable ones are an error.
    pub fn from_attributes(attributes: &AttributeMap) -> Result<Self, TemporalError> {
        let field = |attribute: &'static str| {
            attributes
                .get(attribute)
                .map(|value| parse_timestamp(attribute, value))
                .transpose()
        };

        Ok(Self {
            not_before: field(NOT_BEFORE)?,
            not_on_or_after: field(NOT_ON_OR_AFTER)?,
            renew_until: field(RENEW_UNTIL)?,
        })
    }
}

/// Acceptance check with clock-skew tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalPolicy {
    clock_skew: Duration,
}

impl Default for TemporalPolicy {
    fn default() -> Self {
        Self {
            clock_skew: Duration::seconds(DEFAULT_CLOCK_SKEW_SECS),
        }
    }
}

impl TemporalPolicy {
    /// Create a policy with the given skew; negative values count as zero
    pub fn new(clock_skew: Duration) -> Self {
        Self {
            clock_skew: clock_skew.max(Duration::zero()),
        }
    }

    /// Skew applied to both bounds
    pub fn clock_skew(&self) -> Duration {
        self.clock_skew
    }

    /// Parse the reserved timestamps from `attributes` and check them at `now`
    pub fn evaluate(
        &self,
        attributes: &AttributeMap,
        now: DateTime<Utc>,
    ) -> Result<(), TemporalError> {
        self.check(&ValidityWindow::from_attributes(attributes)?, now)
    }

    /// Check an already parsed window at `now`
    ///
    /// Valid when `not_before - skew <= now <= not_on_or_after + skew`.
    pub fn check(&self, window: &ValidityWindow, now: DateTime<Utc>) -> Result<(), TemporalError> {
        let skew_secs = self.clock_skew.num_seconds();

        if let Some(not_before) = window.not_before {
            let earliest = not_before
                .checked_sub_signed(self.clock_skew)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            if now < earliest {
                return Err(TemporalError::NotYetValid {
                    not_before,
                    now,
                    skew_secs,
                });
            }
        }

        if let Some(not_on_or_after) = window.not_on_or_after {
            let latest = not_on_or_after
                .checked_add_signed(self.clock_skew)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            if now > latest {
                return Err(TemporalError::Expired {
                    not_on_or_after,
                    now,
                    skew_secs,
                });
            }
        }

        Ok(())
    }
}

/// Evaluate `attributes` at `now` with the given skew
pub fn evaluate(
    attributes: &AttributeMap,
    now: DateTime<Utc>,
    skew: Duration,
) -> Result<(), TemporalError> {
    TemporalPolicy::new(skew).evaluate(attributes, now)
}

/// Parse an ISO-8601 timestamp
///
/// Accepts RFC 3339 with any offset, and offset-less timestamps read as UTC.
pub fn parse_timestamp(attribute: &'static str, value: &str) -> Result<DateTime<Utc>, TemporalError> {
    let trimmed = value.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.and_utc())
        })
        .map_err(|_| TemporalError::InvalidTimestamp {
            attribute,
            value: value.to_string(),
        })
}

/// Format a timestamp the way issuers write it: `2010-03-04T19:19:15Z`
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}
