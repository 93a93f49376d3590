//! One `timestamp+source` version token.
//!
//! Timestamps are opaque strings ordered byte-wise; writers are expected to
//! produce lexicographically ordered (effectively fixed-width) stamps. The
//! engine never interprets them numerically.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ParseError;
use super::spec::{is_body_char, Token};

/// A single version: who wrote, and at which stamp.
///
/// Ordering is lexicographic on `(ts, source)`; the source is the
/// deterministic tiebreak.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub ts: String,
    pub source: String,
}

impl Version {
    pub fn new(ts: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            ts: ts.into(),
            source: source.into(),
        }
    }

    /// The zero version: the default state every replica starts from.
    pub fn zero() -> Self {
        Self {
            ts: "0".to_string(),
            source: String::new(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.ts == "0"
    }

    pub(crate) fn from_token(token: &Token) -> Self {
        Self {
            ts: token.bare.clone(),
            source: token.ext.clone().unwrap_or_default(),
        }
    }

    /// Parse a bare `ts+src` pair, or `0` for the zero version.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw == "0" {
            return Ok(Version::zero());
        }
        let Some((ts, source)) = raw.split_once('+') else {
            return Err(ParseError::version(raw, "missing `+source`"));
        };
        if ts.is_empty() || source.is_empty() {
            return Err(ParseError::version(raw, "empty timestamp or source"));
        }
        if !ts.chars().all(is_body_char) || !source.chars().all(is_body_char) {
            return Err(ParseError::version(raw, "invalid character"));
        }
        Ok(Version::new(ts, source))
    }

    /// True when `raw` is a parseable single version token.
    pub fn looks_like(raw: &str) -> bool {
        Version::parse(raw).is_ok() && raw != "0"
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.source.is_empty() {
            write!(f, "{}", self.ts)
        } else {
            write!(f, "{}+{}", self.ts, self.source)
        }
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}
