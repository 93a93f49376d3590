//! Core parse errors (specifiers, versions, vectors, diff payloads).
//!
//! These are bounded and stable: they represent malformed wire input,
//! not library implementation details.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    #[error("spec `{raw}` is invalid: {reason}")]
    Spec { raw: String, reason: String },
    #[error("version `{raw}` is invalid: {reason}")]
    Version { raw: String, reason: String },
    #[error("version vector `{raw}` is invalid: {reason}")]
    Vector { raw: String, reason: String },
    #[error("source id `{raw}` is invalid: {reason}")]
    Source { raw: String, reason: String },
    #[error("diff payload is invalid: {reason}")]
    Diff { reason: String },
}

impl ParseError {
    pub fn spec(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::Spec {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn version(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::Version {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn vector(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        ParseError::Vector {
            raw: raw.into(),
            reason: reason.into(),
        }
    }
}
