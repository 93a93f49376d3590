//! Per-op transient state and the scan cursors of the reentrant load loop.

use std::collections::BTreeMap;

use crate::core::{Op, ParseError, Version, VersionMap};
use crate::store::Write;

use super::keys::{self, parse_log_suffix, BASE_STATE, END_MARK, META_MARK, RECENT_STATE, TIP};

/// Handler outcome: finished, or needs the scan extended to an older offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Done,
    Later,
}

/// Everything derived from one incoming op.
///
/// `mark` is the oldest key offset already loaded; `need_mark` the oldest
/// offset the current handler demands. Both only move toward older offsets,
/// so every record is scanned at most once per request.
#[derive(Debug)]
pub struct Request {
    pub op: Op,
    pub prefix: String,
    /// All loaded records for the object, keyed by suffix.
    pub ops: BTreeMap<String, String>,
    /// Loaded singleton records (suffixes containing no `!`).
    pub meta: BTreeMap<String, String>,
    pub batch: Vec<Write>,
    pub responses: Vec<Op>,
    pub mark: String,
    pub need_mark: Option<String>,
}

impl Request {
    pub fn new(op: Op) -> Result<Self, ParseError> {
        let prefix = op.spec.object_prefix()?;
        Ok(Self {
            op,
            prefix,
            ops: BTreeMap::new(),
            meta: BTreeMap::new(),
            batch: Vec::new(),
            responses: Vec::new(),
            mark: END_MARK.to_string(),
            need_mark: Some(META_MARK.to_string()),
        })
    }

    pub fn absorb(&mut self, suffix: String, value: String) {
        if !suffix.contains('!') {
            self.meta.insert(suffix.clone(), value.clone());
        }
        self.ops.insert(suffix, value);
    }

    /// True when records at or above `target` are already loaded; otherwise
    /// lowers `need_mark` and the caller returns [`Step::Later`].
    pub fn mark_loaded(&mut self, target: &str) -> bool {
        if self.mark.as_str() <= target {
            return true;
        }
        match &self.need_mark {
            Some(current) if current.as_str() <= target => {}
            _ => self.need_mark = Some(target.to_string()),
        }
        false
    }

    /// True when every version referenced by a loaded backreference is inside
    /// the loaded range. Backreferences never chain, so widening the scan to
    /// the smallest referenced version settles the check.
    pub fn backrefs_loaded(&mut self) -> Result<bool, ParseError> {
        let mut floor = VersionMap::new();
        for (suffix, value) in self.log_records() {
            if parse_log_suffix(suffix)?.is_backref() {
                floor = floor.lower_union(&value.parse()?);
            }
        }
        let Some(min) = floor.min_ts() else {
            return Ok(true);
        };
        Ok(self.mark_loaded(&keys::version_mark(&min)))
    }

    pub fn log_records(&self) -> impl Iterator<Item = (&String, &String)> {
        self.ops.iter().filter(|(suffix, _)| suffix.contains('!'))
    }

    pub fn tip(&self) -> Result<Option<Version>, ParseError> {
        self.meta.get(TIP).map(|raw| Version::parse(raw)).transpose()
    }

    pub fn base_state_raw(&self) -> Option<&str> {
        self.meta.get(BASE_STATE).map(String::as_str)
    }

    pub fn recent_raw(&self) -> Option<&str> {
        self.meta.get(RECENT_STATE).map(String::as_str)
    }

    pub fn recent_map(&self) -> Result<Option<VersionMap>, ParseError> {
        self.recent_raw().map(str::parse).transpose()
    }

    pub fn bookmark(&self, source: &str) -> Option<&str> {
        self.meta.get(&keys::bm_suffix(source)).map(String::as_str)
    }

    pub fn echo_bookmark(&self, source: &str) -> Option<&str> {
        self.meta.get(&keys::ebm_suffix(source)).map(String::as_str)
    }

    pub fn put(&mut self, suffix: impl AsRef<str>, value: impl Into<String>) {
        self.batch.push(Write::put(
            format!("{}{}", self.prefix, suffix.as_ref()),
            value,
        ));
    }

    pub fn del(&mut self, suffix: impl AsRef<str>) {
        self.batch
            .push(Write::del(format!("{}{}", self.prefix, suffix.as_ref())));
    }

    pub fn respond(&mut self, op: Op) {
        self.responses.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Op;

    fn request() -> Request {
        let op = Op::parse("/T#A.on", "", "peer").unwrap();
        Request::new(op).unwrap()
    }

    #[test]
    fn cursors_start_at_the_manifest_block() {
        let req = request();
        assert_eq!(req.mark, "/");
        assert_eq!(req.need_mark.as_deref(), Some("."));
    }

    #[test]
    fn mark_loaded_lowers_need_mark_once() {
        let mut req = request();
        req.mark = META_MARK.to_string();
        assert!(!req.mark_loaded("!10+X"));
        assert_eq!(req.need_mark.as_deref(), Some("!10+X"));

        // an even older demand wins; a newer one does not overwrite it
        assert!(!req.mark_loaded("!09+W"));
        assert_eq!(req.need_mark.as_deref(), Some("!09+W"));
        assert!(!req.mark_loaded("!11+X"));
        assert_eq!(req.need_mark.as_deref(), Some("!09+W"));

        req.mark = "!09+W".to_string();
        req.need_mark = None;
        assert!(req.mark_loaded("!10+X"));
        assert!(req.need_mark.is_none());
    }

    #[test]
    fn absorb_separates_meta_from_log() {
        let mut req = request();
        req.absorb(".tip".into(), "11+X".into());
        req.absorb("!11+X.set".into(), "v".into());
        assert_eq!(req.meta.len(), 1);
        assert_eq!(req.ops.len(), 2);
        assert_eq!(req.tip().unwrap().unwrap().to_string(), "11+X");
        assert_eq!(req.log_records().count(), 1);
    }

    #[test]
    fn backrefs_widen_the_scan_to_the_smallest_reference() {
        let mut req = request();
        req.mark = "!10+X".to_string();
        req.absorb("!12+Z.~br".into(), "!09+W".into());
        req.absorb("!13+Z.~br".into(), "!05+W!11+Y".into());

        assert!(!req.backrefs_loaded().unwrap());
        assert_eq!(req.need_mark.as_deref(), Some("!05+W"));

        req.mark = "!05+W".to_string();
        req.need_mark = None;
        assert!(req.backrefs_loaded().unwrap());
    }

    #[test]
    fn backrefs_loaded_with_no_backrefs_is_immediate() {
        let mut req = request();
        req.mark = META_MARK.to_string();
        req.absorb("!11+X.set".into(), "v".into());
        assert!(req.backrefs_loaded().unwrap());
    }

    #[test]
    fn writes_are_prefixed() {
        let mut req = request();
        req.put(".tip", "11+X");
        req.del("!10+X!10+X.state");
        assert_eq!(req.batch[0].key(), "/T#A.tip");
        assert_eq!(req.batch[1].key(), "/T#A!10+X!10+X.state");
    }
}
