//! State snapshot handler.

use crate::core::{ParseError, Sigil, SourceId, Version, VersionMap};

use super::error::EngineError;
use super::keys::{BASE_STATE, RECENT_STATE, STATE_OP, TIP};
use super::request::{Request, Step};

/// Author id reserved for base-state overwrites.
const BASE_AUTHOR: &str = "swarm";

pub fn state(req: &mut Request, id: &SourceId) -> Result<Step, EngineError> {
    let author = req
        .op
        .spec
        .author()
        .ok_or_else(|| ParseError::spec(req.op.spec.to_string(), "snapshot missing version"))?
        .to_string();
    // the snapshot's version tokens, kept verbatim so the record key echoes
    // the wire form
    let vv_raw = req.op.spec.filter(&[Sigil::Version]).to_string();
    let map: VersionMap = vv_raw.parse()?;

    match req.tip()? {
        None => {
            let tip = map.max_ts().unwrap_or_else(Version::zero);
            let value = req.op.value.clone();
            req.put(format!("{vv_raw}.{STATE_OP}"), value);
            req.put(BASE_STATE, vv_raw.clone());
            req.put(RECENT_STATE, vv_raw);
            req.put(TIP, tip.to_string());
            Ok(Step::Done)
        }
        Some(tip) if author == id.as_str() => {
            if let Some(prev) = req.recent_raw().map(str::to_string) {
                if prev != vv_raw {
                    req.del(format!("{prev}.{STATE_OP}"));
                }
            }
            let value = req.op.value.clone();
            req.put(format!("{vv_raw}.{STATE_OP}"), value);
            req.put(RECENT_STATE, vv_raw);
            if let Some(max) = map.max_ts() {
                if max > tip {
                    req.put(TIP, max.to_string());
                }
            }
            Ok(Step::Done)
        }
        Some(_) if author == BASE_AUTHOR => Err(EngineError::NotImplemented),
        Some(_) => Err(EngineError::HaveState),
    }
}
