//! Decoded OpenToken
//!
//! A [`Token`] is the verified attribute map plus its parsed validity window.
//! Lookup accepts anything string-like, including the symbolic
//! [`ReservedAttribute`] names, and normalizes it to the same string key.

use crate::payload::AttributeMap;
use crate::validation::{
    TemporalError, ValidityWindow, NOT_BEFORE, NOT_ON_OR_AFTER, RENEW_UNTIL,
};
use chrono::{DateTime, Utc};
use std::ops::Index;

/// Attribute naming the authenticated principal
pub const SUBJECT: &str = "subject";

/// Attribute names with a fixed meaning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedAttribute {
    Subject,
    NotBefore,
    NotOnOrAfter,
    RenewUntil,
}

impl ReservedAttribute {
    /// Wire name of the attribute
    pub const fn key(self) -> &'static str {
        match self {
            ReservedAttribute::Subject => SUBJECT,
            ReservedAttribute::NotBefore => NOT_BEFORE,
            ReservedAttribute::NotOnOrAfter => NOT_ON_OR_AFTER,
            ReservedAttribute::RenewUntil => RENEW_UNTIL,
        }
    }
}

impl AsRef<str> for ReservedAttribute {
    fn as_ref(&self) -> &str {
        self.key()
    }
}

/// Attributes recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    attributes: AttributeMap,
    window: ValidityWindow,
}

impl Token {
    /// Wrap an attribute map, parsing its reserved timestamps
    pub fn from_attributes(attributes: AttributeMap) -> Result<Self, TemporalError> {
        let window = ValidityWindow::from_attributes(&attributes)?;
        Ok(Self { attributes, window })
    }

    /// Look up an attribute by string or symbolic key
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.attributes.get(key.as_ref()).map(String::as_str)
    }

    /// Returns true if the attribute is present
    pub fn contains_key<K: AsRef<str>>(&self, key: K) -> bool {
        self.attributes.contains_key(key.as_ref())
    }

    /// The `subject` attribute
    pub fn subject(&self) -> Option<&str> {
        self.get(ReservedAttribute::Subject)
    }

    /// Parsed `not-before`
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.window.not_before
    }

    /// Parsed `not-on-or-after`
    pub fn not_on_or_after(&self) -> Option<DateTime<Utc>> {
        self.window.not_on_or_after
    }

    /// Parsed `renew-until`
    ///
    /// Informational only: it never affects whether the token decodes.
    pub fn valid_until(&self) -> Option<DateTime<Utc>> {
        self.window.renew_until
    }

    /// Returns true if the session may still be renewed at `now`
    pub fn is_renewable_at(&self, now: DateTime<Utc>) -> bool {
        self.window.renew_until.is_some_and(|until| now <= until)
    }

    /// Parsed validity window
    pub fn window(&self) -> &ValidityWindow {
        &self.window
    }

    /// All attributes
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Consume the token, returning its attributes
    pub fn into_attributes(self) -> AttributeMap {
        self.attributes
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl<K: AsRef<str>> Index<K> for Token {
    type Output = str;

    /// Panics if the attribute is missing, like `BTreeMap` indexing
    fn index(&self, key: K) -> &str {
        let key = key.as_ref();
        match self.get(key) {
            Some(value) => value,
            None => panic!("attribute {key:?} not present in token"),
        }
    }
}

impl PartialEq<AttributeMap> for Token {
    fn eq(&self, other: &AttributeMap) -> bool {
        &self.attributes == other
    }
}

impl From<Token> for AttributeMap {
    fn from(token: Token) -> Self {
        token.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token() -> Token {
        Token::from_attributes(AttributeMap::from([
            ("subject".to_string(), "john@example.com".to_string()),
            ("last_name".to_string(), "D'angelo".to_string()),
            ("not-before".to_string(), "2010-03-04T19:19:15Z".to_string()),
            ("not-on-or-after".to_string(), "2010-03-04T19:24:15Z".to_string()),
            ("renew-until".to_string(), "2010-03-05T07:19:15Z".to_string()),
        ]))
        .unwrap()
    }

    #[test]
    fn test_lookup_by_any_key_form() {
        let token = token();
        let owned = String::from("subject");
        assert_eq!(token.get("subject"), Some("john@example.com"));
        assert_eq!(token.get(&owned), Some("john@example.com"));
        assert_eq!(token.get(ReservedAttribute::Subject), Some("john@example.com"));
        assert_eq!(&token["last_name"], "D'angelo");
        assert_eq!(&token[ReservedAttribute::Subject], "john@example.com");
        assert_eq!(token.get("Subject"), None);
    }

    #[test]
    fn test_valid_until_is_renew_until() {
        let token = token();
        assert_eq!(
            token.valid_until(),
            Some(Utc.with_ymd_and_hms(2010, 3, 5, 7, 19, 15).unwrap())
        );
        assert_eq!(
            token.not_before(),
            Some(Utc.with_ymd_and_hms(2010, 3, 4, 19, 19, 15).unwrap())
        );
    }

    #[test]
    fn test_renewable() {
        let token = token();
        assert!(token.is_renewable_at(Utc.with_ymd_and_hms(2010, 3, 5, 7, 0, 0).unwrap()));
        assert!(!token.is_renewable_at(Utc.with_ymd_and_hms(2010, 3, 5, 8, 0, 0).unwrap()));

        let no_renewal = Token::from_attributes(AttributeMap::new()).unwrap();
        assert!(!no_renewal.is_renewable_at(Utc::now()));
        assert_eq!(no_renewal.valid_until(), None);
    }

    #[test]
    #[should_panic(expected = "not present")]
    fn test_index_missing_panics() {
        let _ = &token()["missing"];
    }

    #[test]
    fn test_compares_with_attribute_map() {
        let token = token();
        let attrs = token.attributes().clone();
        assert_eq!(token, attrs);
        assert_eq!(token.len(), 5);
        assert_eq!(token.iter().count(), 5);
        assert_eq!(AttributeMap::from(token), attrs);
    }
}
