//! Regular op ingestion: echo, replay, reorder, causal violation, in-order.

use crate::config::EngineConfig;
use crate::core::{ParseError, SourceId, Version, VersionMap};

use super::error::EngineError;
use super::keys::{self, parse_log_suffix, BACKREF_OP, TIP};
use super::request::{Request, Step};

pub fn anyop(req: &mut Request, _id: &SourceId, config: &EngineConfig) -> Result<Step, EngineError> {
    let v = req
        .op
        .spec
        .version()
        .ok_or_else(|| ParseError::spec(req.op.spec.to_string(), "op missing version"))?;
    if v.source.is_empty() {
        return Err(ParseError::version(v.to_string(), "missing source").into());
    }
    let name = req
        .op
        .spec
        .op_name()
        .ok_or_else(|| ParseError::spec(req.op.spec.to_string(), "op missing name"))?
        .to_string();
    let Some(tip) = req.tip()? else {
        return Err(EngineError::NoSuchObject);
    };

    if v == tip {
        // echo of the latest op: remember how far this peer has heard
        req.put(keys::ebm_suffix(req.op.source.as_str()), tip.to_string());
        if config.bookmarking {
            req.put(keys::bm_suffix(req.op.source.as_str()), v.to_string());
        }
        return Ok(Step::Done);
    }

    if v < tip {
        if !req.mark_loaded(&keys::version_mark(&v)) {
            return Ok(Step::Later);
        }
        match classify_late(req, &v)? {
            Late::Replay => return Ok(Step::Done),
            Late::Violation => return Err(EngineError::OutOfOrder),
            Late::Reorder => {}
        }
        let value = req.op.value.clone();
        req.put(keys::op_suffix(&v, &name), value);
        extend_backref(req, &tip, &v)?;
        if config.bookmarking {
            req.put(keys::bm_suffix(req.op.source.as_str()), v.to_string());
        }
        req.respond(req.op.clone());
        return Ok(Step::Done);
    }

    // new in-order op
    let value = req.op.value.clone();
    req.put(keys::op_suffix(&v, &name), value);
    req.put(TIP, v.to_string());
    if config.bookmarking {
        req.put(keys::bm_suffix(req.op.source.as_str()), v.to_string());
    }
    req.respond(req.op.clone());
    Ok(Step::Done)
}

enum Late {
    Replay,
    Reorder,
    Violation,
}

/// Walk loaded ops from the same source. A logged later op means the stream
/// from that source went backwards; an equal one means we already have it.
fn classify_late(req: &Request, v: &Version) -> Result<Late, ParseError> {
    let mut outcome = Late::Reorder;
    for (suffix, _) in req.log_records() {
        let record = parse_log_suffix(suffix)?;
        if record.is_state() || record.is_backref() {
            continue;
        }
        let rv = record.stamp();
        if rv.source != v.source {
            continue;
        }
        if rv.ts > v.ts {
            return Ok(Late::Violation);
        }
        if rv == v {
            outcome = Late::Replay;
        }
    }
    Ok(outcome)
}

/// Record the inversion at the current tip, keeping only the earliest reorder
/// per source.
fn extend_backref(req: &mut Request, tip: &Version, v: &Version) -> Result<(), ParseError> {
    let suffix = keys::op_suffix(tip, BACKREF_OP);
    let mut br = match req.ops.get(&suffix) {
        Some(raw) => raw.parse::<VersionMap>()?,
        None => VersionMap::new(),
    };
    if !br.has_source(&v.source) {
        br.add(v);
        req.put(suffix, br.to_string());
    }
    Ok(())
}
