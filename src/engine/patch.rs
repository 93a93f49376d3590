//! Subscription handling: patch construction and the reciprocal subscription.
//!
//! A patch brings a peer from its declared `base` to our current state with a
//! tail read, never a full-log scan - except the documented worst case where
//! the peer's base does not cover the newest snapshot cut.

use crate::core::{bundle, Op, Spec, SourceId, Version, VersionMap};

use super::error::EngineError;
use super::keys::{self, parse_log_suffix, ZERO_MARK};
use super::request::{Request, Step};

/// `base` value that suppresses the patch entirely.
const NO_PATCH: &str = "~";
/// `base` value of a peer that refuses ops.
const NO_OPS: &str = "!~";
/// `base` value asking us to resume from our own echo bookmark.
const FROM_EBM: &str = "-";

pub fn on(req: &mut Request, id: &SourceId) -> Result<Step, EngineError> {
    let base = req.op.value.clone();

    let patch = if base == NO_PATCH {
        None
    } else {
        match build(req, &base)? {
            Some(lines) => Some(lines),
            None => return Ok(Step::Later),
        }
    };

    let reciprocal = if req.op.source.as_str() == id.as_str() {
        // subscribing back to the subscriber would loop
        None
    } else {
        match reciprocal_base(req, &base)? {
            Some(value) => Some(value),
            None => return Ok(Step::Later),
        }
    };

    if let Some(lines) = patch {
        if !lines.is_empty() {
            let payload = bundle(lines.iter().map(|(s, v)| (s.as_str(), v.as_str())));
            let spec = Spec::parse(&format!("{}.diff", req.prefix))?;
            req.respond(Op::new(spec, payload, id.clone()));
        }
    }
    if let Some(value) = reciprocal {
        let spec = Spec::parse(&format!("{}.on", req.prefix))?;
        req.respond(Op::new(spec, value, id.clone()));
    }
    Ok(Step::Done)
}

type Lines = Vec<(String, String)>;

/// Dispatch on the shape of `base`. `None` means the scan must widen first.
fn build(req: &mut Request, base: &str) -> Result<Option<Lines>, EngineError> {
    if base.is_empty() {
        return empty_base(req);
    }
    if base == NO_OPS {
        return Ok(Some(Vec::new()));
    }
    if base == FROM_EBM {
        let Some(ebm) = req.echo_bookmark(req.op.source.as_str()).map(str::to_string) else {
            return Err(EngineError::UnrecognizedBase {
                base: base.to_string(),
            });
        };
        let v = Version::parse(&ebm)?;
        return vector_base(req, &VersionMap::from_versions(&[v]));
    }
    if Version::looks_like(base) {
        let v = Version::parse(base)?;
        return bookmark_base(req, &v);
    }
    if base.starts_with('!') {
        if let Ok(map) = base.parse::<VersionMap>() {
            return vector_base(req, &map);
        }
    }
    Err(EngineError::UnrecognizedBase {
        base: base.to_string(),
    })
}

/// Peer is empty: newest snapshot plus every op past its cut.
fn empty_base(req: &mut Request) -> Result<Option<Lines>, EngineError> {
    let Some(recent_raw) = req.recent_raw().map(str::to_string) else {
        return Ok(Some(Vec::new()));
    };
    if !req.mark_loaded(&recent_raw) {
        return Ok(None);
    }
    if !req.backrefs_loaded()? {
        return Ok(None);
    }

    let recent_map: VersionMap = recent_raw.parse()?;
    let snapshot_suffix = format!("{recent_raw}.{}", keys::STATE_OP);
    let mut lines = Vec::new();
    if let Some(value) = req.ops.get(&snapshot_suffix) {
        lines.push((snapshot_suffix.clone(), value.clone()));
    }
    for (suffix, value) in req.log_records() {
        let record = parse_log_suffix(suffix)?;
        if record.is_state() || record.is_backref() {
            continue;
        }
        if !recent_map.covers(record.stamp()) {
            lines.push((suffix.clone(), value.clone()));
        }
    }
    Ok(Some(lines))
}

/// Peer resumes from an arrival-order position: everything it may have
/// missed sits at or above the bookmark, except reordered ops reachable
/// through backreferences.
fn bookmark_base(req: &mut Request, v: &Version) -> Result<Option<Lines>, EngineError> {
    if !req.mark_loaded(&keys::version_mark(v)) {
        return Ok(None);
    }
    if !req.backrefs_loaded()? {
        return Ok(None);
    }
    let mut lines = Vec::new();
    for (suffix, value) in req.log_records() {
        let record = parse_log_suffix(suffix)?;
        if record.is_state() || record.is_backref() {
            continue;
        }
        // the peer already holds the op it bookmarked
        if record.stamp() == v {
            continue;
        }
        lines.push((suffix.clone(), value.clone()));
    }
    Ok(Some(lines))
}

/// General case: every op the peer's vector does not cover. When the base
/// covers our newest snapshot cut a tail read suffices; otherwise the whole
/// log is on the table.
fn vector_base(req: &mut Request, base: &VersionMap) -> Result<Option<Lines>, EngineError> {
    let from = match req.recent_map()? {
        Some(recent) if base.covers_all(&recent) => match recent.max_ts() {
            Some(max) => keys::version_mark(&max),
            None => ZERO_MARK.to_string(),
        },
        _ => ZERO_MARK.to_string(),
    };
    if !req.mark_loaded(&from) {
        return Ok(None);
    }
    if !req.backrefs_loaded()? {
        return Ok(None);
    }
    let mut lines = Vec::new();
    for (suffix, value) in req.log_records() {
        let record = parse_log_suffix(suffix)?;
        if record.is_state() || record.is_backref() {
            continue;
        }
        if !base.covers(record.stamp()) {
            lines.push((suffix.clone(), value.clone()));
        }
    }
    Ok(Some(lines))
}

/// Choose the `base` of the subscription we send back.
fn reciprocal_base(req: &mut Request, base: &str) -> Result<Option<String>, EngineError> {
    if req.base_state_raw().is_none() {
        return Ok(Some(String::new()));
    }
    if base.is_empty() {
        // a self-fulfilling bookmark: the peer resumes us from our tip
        return Ok(Some(req.meta.get(keys::TIP).cloned().unwrap_or_default()));
    }
    if let Some(bm) = req.bookmark(req.op.source.as_str()) {
        return Ok(Some(bm.to_string()));
    }
    if Version::looks_like(base) {
        // the peer's own echo bookmark already tells it where we stand
        return Ok(Some(String::new()));
    }
    derived_map(req).map(|derived| derived.map(|map| map.to_string()))
}

/// Our full version vector: the newest snapshot cut raised by every loaded
/// op and every version a backreference names.
fn derived_map(req: &mut Request) -> Result<Option<VersionMap>, EngineError> {
    let Some(recent) = req.recent_map()? else {
        return Ok(Some(VersionMap::new()));
    };
    if let Some(max) = recent.max_ts() {
        if !req.mark_loaded(&keys::version_mark(&max)) {
            return Ok(None);
        }
    }
    let mut map = recent;
    for (suffix, value) in req.log_records() {
        let record = parse_log_suffix(suffix)?;
        map.add(record.stamp());
        if record.is_backref() {
            let br: VersionMap = value.parse()?;
            for v in br.iter() {
                map.add(&v);
            }
        }
    }
    Ok(Some(map))
}
