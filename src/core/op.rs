//! The op delivery unit exchanged with the host.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ParseError;
use super::spec::{is_body_char, Spec};

/// Replica identifier - non-empty, wire-token alphabet.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    pub fn new(s: impl Into<String>) -> Result<Self, ParseError> {
        let s = s.into();
        if s.is_empty() {
            return Err(ParseError::Source {
                raw: s,
                reason: "empty".into(),
            });
        }
        if !s.chars().all(is_body_char) {
            return Err(ParseError::Source {
                raw: s,
                reason: "invalid character".into(),
            });
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceId({:?})", self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One op in flight: a parsed specifier, an opaque value, and the replica id
/// of the immediate sender (not necessarily the original author).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Op {
    pub spec: Spec,
    pub value: String,
    pub source: SourceId,
}

impl Op {
    pub fn new(spec: Spec, value: impl Into<String>, source: SourceId) -> Self {
        Self {
            spec,
            value: value.into(),
            source,
        }
    }

    pub fn parse(
        spec: &str,
        value: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, ParseError> {
        Ok(Self {
            spec: Spec::parse(spec)?,
            value: value.into(),
            source: SourceId::new(source)?,
        })
    }

    pub fn op_name(&self) -> Option<&str> {
        self.spec.op_name()
    }
}
