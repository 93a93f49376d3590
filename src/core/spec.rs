//! Sigil-tokenized operation specifiers.
//!
//! A specifier is a dotted concatenation of typed tokens, each introduced by
//! one of `/ # ! .` and shaped `bare` or `bare+ext`. `/Type#id!ts+src.op`
//! names one operation on one replicated object.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ParseError;
use super::version::Version;

/// Token class, keyed by the introducing sigil.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sigil {
    /// `/` - object type
    Type,
    /// `#` - object id
    Id,
    /// `!` - version
    Version,
    /// `.` - operation name
    Op,
}

impl Sigil {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '/' => Some(Sigil::Type),
            '#' => Some(Sigil::Id),
            '!' => Some(Sigil::Version),
            '.' => Some(Sigil::Op),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Sigil::Type => '/',
            Sigil::Id => '#',
            Sigil::Version => '!',
            Sigil::Op => '.',
        }
    }
}

pub(crate) fn is_body_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '~'
}

/// One sigil-prefixed token, split around `+` into `bare` and `ext`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Token {
    pub sigil: Sigil,
    pub bare: String,
    pub ext: Option<String>,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.sigil.as_char(), self.bare)?;
        if let Some(ext) = &self.ext {
            write!(f, "+{ext}")?;
        }
        Ok(())
    }
}

/// A parsed specifier. Parse once, then read tokens without substring work.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Spec {
    tokens: Vec<Token>,
}

impl Spec {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        if raw.is_empty() {
            return Err(ParseError::spec(raw, "empty"));
        }
        let mut tokens = Vec::new();
        let mut chars = raw.chars().peekable();
        while let Some(c) = chars.next() {
            let Some(sigil) = Sigil::from_char(c) else {
                return Err(ParseError::spec(raw, format!("expected sigil, got `{c}`")));
            };
            let mut bare = String::new();
            while let Some(&c) = chars.peek() {
                if is_body_char(c) {
                    bare.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            if bare.is_empty() {
                return Err(ParseError::spec(raw, "empty token body"));
            }
            let ext = if chars.peek() == Some(&'+') {
                chars.next();
                let mut ext = String::new();
                while let Some(&c) = chars.peek() {
                    if is_body_char(c) {
                        ext.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if ext.is_empty() {
                    return Err(ParseError::spec(raw, "empty token ext"));
                }
                Some(ext)
            } else {
                None
            };
            tokens.push(Token { sigil, bare, ext });
        }
        Ok(Spec { tokens })
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    fn first(&self, sigil: Sigil) -> Option<&Token> {
        self.tokens.iter().find(|t| t.sigil == sigil)
    }

    pub fn type_name(&self) -> Option<&str> {
        self.first(Sigil::Type).map(|t| t.bare.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.first(Sigil::Id).map(|t| t.bare.as_str())
    }

    /// Name of the operation: bare part of the first `.` token.
    pub fn op_name(&self) -> Option<&str> {
        self.first(Sigil::Op).map(|t| t.bare.as_str())
    }

    /// First `!` token as a version. `!0` is the zero version.
    pub fn version(&self) -> Option<Version> {
        self.first(Sigil::Version).map(Version::from_token)
    }

    /// Source of the first `!` token (the replica that stamped it).
    pub fn source(&self) -> Option<&str> {
        self.first(Sigil::Version)
            .and_then(|t| t.ext.as_deref())
    }

    /// Author of the record: same position as [`Spec::source`], read when the
    /// first version token is the record's own stamp.
    pub fn author(&self) -> Option<&str> {
        self.source()
    }

    /// All `!` tokens as versions, in spec order.
    pub fn versions(&self) -> Vec<Version> {
        self.tokens
            .iter()
            .filter(|t| t.sigil == Sigil::Version)
            .map(Version::from_token)
            .collect()
    }

    /// Keep only tokens whose sigil is in `sigils`.
    pub fn filter(&self, sigils: &[Sigil]) -> Spec {
        Spec {
            tokens: self
                .tokens
                .iter()
                .filter(|t| sigils.contains(&t.sigil))
                .cloned()
                .collect(),
        }
    }

    /// `/Type#Id` prefix shared by every persistent record of the object.
    pub fn object_prefix(&self) -> Result<String, ParseError> {
        let ty = self
            .type_name()
            .ok_or_else(|| ParseError::spec(self.to_string(), "missing type token"))?;
        let id = self
            .id()
            .ok_or_else(|| ParseError::spec(self.to_string(), "missing id token"))?;
        Ok(format!("/{ty}#{id}"))
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}

impl FromStr for Spec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Spec::parse(s)
    }
}

impl TryFrom<String> for Spec {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Spec::parse(&value)
    }
}

impl From<Spec> for String {
    fn from(spec: Spec) -> String {
        spec.to_string()
    }
}

impl PartialOrd for Spec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Spec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_spec() {
        let spec = Spec::parse("/Type#id!11+X.set").unwrap();
        assert_eq!(spec.type_name(), Some("Type"));
        assert_eq!(spec.id(), Some("id"));
        assert_eq!(spec.op_name(), Some("set"));
        assert_eq!(spec.source(), Some("X"));
        let v = spec.version().unwrap();
        assert_eq!(v.to_string(), "11+X");
        assert_eq!(spec.to_string(), "/Type#id!11+X.set");
    }

    #[test]
    fn parses_state_spec_with_vector() {
        let spec = Spec::parse("/T#A!10+X!10+X.state").unwrap();
        assert_eq!(spec.versions().len(), 2);
        assert_eq!(spec.author(), Some("X"));
        assert_eq!(
            spec.filter(&[Sigil::Version]).to_string(),
            "!10+X!10+X"
        );
    }

    #[test]
    fn parses_record_suffixes() {
        let spec = Spec::parse("!12+Z.~br").unwrap();
        assert_eq!(spec.op_name(), Some("~br"));
        assert_eq!(spec.version().unwrap().to_string(), "12+Z");
        assert!(spec.type_name().is_none());
    }

    #[test]
    fn zero_version_token() {
        let spec = Spec::parse("!0").unwrap();
        let v = spec.version().unwrap();
        assert!(v.is_zero());
    }

    #[test]
    fn rejects_malformed() {
        assert!(Spec::parse("").is_err());
        assert!(Spec::parse("noSigil").is_err());
        assert!(Spec::parse("/").is_err());
        assert!(Spec::parse("/T#A!11+").is_err());
        assert!(Spec::parse("/T#A!11+X.se t").is_err());
    }

    #[test]
    fn object_prefix_requires_type_and_id() {
        let spec = Spec::parse("/T#A.on").unwrap();
        assert_eq!(spec.object_prefix().unwrap(), "/T#A");
        assert!(Spec::parse(".on").unwrap().object_prefix().is_err());
    }

    #[test]
    fn ordering_is_lexicographic_on_rendering() {
        let a = Spec::parse("/T#A!09+W.set").unwrap();
        let b = Spec::parse("/T#A!11+X.set").unwrap();
        assert!(a < b);
    }
}
