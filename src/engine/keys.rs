//! Record key layout within one object prefix.
//!
//! Suffix order in the raw key space: `!version…` log records, then the `.`
//! manifest block (`.base_state` < `.bm&…` < `.ebm&…` < `.recent_state` <
//! `.tip`), with `/` terminating the object. The first scan of every request
//! reads `[prefix + ".", prefix + "/")` and later scans extend downward into
//! the log, so the manifest is always loaded before any tail read.

use crate::core::{ParseError, Spec, Version};

/// Start of the manifest block; also the initial `need_mark`.
pub const META_MARK: &str = ".";
/// One past everything for the object; the initial `mark`.
pub const END_MARK: &str = "/";
/// Floor of the whole log.
pub const ZERO_MARK: &str = "!0";

pub const BASE_STATE: &str = ".base_state";
pub const RECENT_STATE: &str = ".recent_state";
pub const TIP: &str = ".tip";
pub const BM_PREFIX: &str = ".bm&";
pub const EBM_PREFIX: &str = ".ebm&";

pub const STATE_OP: &str = "state";
pub const BACKREF_OP: &str = "~br";

pub fn bm_suffix(source: &str) -> String {
    format!("{BM_PREFIX}{source}")
}

pub fn ebm_suffix(source: &str) -> String {
    format!("{EBM_PREFIX}{source}")
}

pub fn op_suffix(version: &Version, name: &str) -> String {
    format!("!{version}.{name}")
}

/// Scan offset for "everything at or above this version".
pub fn version_mark(version: &Version) -> String {
    format!("!{version}")
}

/// A parsed log-record key suffix: `!stamp(!vector…).name`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogRecord {
    pub versions: Vec<Version>,
    pub name: String,
}

impl LogRecord {
    pub fn stamp(&self) -> &Version {
        &self.versions[0]
    }

    pub fn is_state(&self) -> bool {
        self.name == STATE_OP
    }

    pub fn is_backref(&self) -> bool {
        self.name == BACKREF_OP
    }
}

pub fn parse_log_suffix(suffix: &str) -> Result<LogRecord, ParseError> {
    let spec = Spec::parse(suffix)?;
    let versions = spec.versions();
    if versions.is_empty() {
        return Err(ParseError::spec(suffix, "log record missing version"));
    }
    let name = spec
        .op_name()
        .ok_or_else(|| ParseError::spec(suffix, "log record missing name"))?
        .to_string();
    Ok(LogRecord { versions, name })
}
