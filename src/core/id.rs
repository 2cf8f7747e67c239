use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::text::normalize_text;

/// Surrogate identifier assigned to every record at load time.
///
/// A hash of the normalized title, year and abstract: stable across reloads of the
/// same export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(u128);

#[derive(Error, Debug, PartialEq)]
#[error("Invalid record id '{0}': expected 32 hex digits")]
pub struct ParseRecordIdError(String);

impl RecordId {
    pub fn from_content(title: &str, year: i64, abstract_text: &str) -> Self {
        let canonical = format!(
            "title={}\nyear={}\nabstract={}\n",
            normalize_text(title),
            year,
            normalize_text(abstract_text)
        );

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let hash: [u8; 32] = hasher.finalize().into();

        let mut truncated = [0u8; 16];
        truncated.copy_from_slice(&hash[..16]);
        RecordId(u128::from_be_bytes(truncated))
    }
}

impl From<u128> for RecordId {
    fn from(value: u128) -> Self {
        RecordId(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = ParseRecordIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 32 || !s.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseRecordIdError(s.to_string()));
        }
        u128::from_str_radix(s, 16)
            .map(RecordId)
            .map_err(|_| ParseRecordIdError(s.to_string()))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_ignores_whitespace_noise() {
        let a = RecordId::from_content("Attention", 2017, "We propose  a new\nmodel.");
        let b = RecordId::from_content(" Attention ", 2017, "We propose a new model.");
        assert_eq!(a, b);
    }

    #[test]
    fn content_id_depends_on_year() {
        let a = RecordId::from_content("Attention", 2017, "abstract");
        let b = RecordId::from_content("Attention", 2018, "abstract");
        assert_ne!(a, b);
    }

    #[test]
    fn display_and_parse_agree() {
        let id = RecordId::from_content("t", 2020, "a");
        let text = id.to_string();
        assert_eq!(text.len(), 32);
        assert_eq!(text.parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn parse_rejects_short_and_non_hex() {
        assert!("abc".parse::<RecordId>().is_err());
        assert!("zz".repeat(16).parse::<RecordId>().is_err());
    }

    #[test]
    fn parse_rejects_sign_prefix() {
        let signed = format!("+{}", "f".repeat(31));
        assert_eq!(signed.len(), 32);
        assert!(signed.parse::<RecordId>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let id = RecordId::from(255u128);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"000000000000000000000000000000ff\"");
        let back: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
