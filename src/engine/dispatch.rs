//! Handler selection by op kind.

use tracing::warn;

use crate::config::EngineConfig;
use crate::core::SourceId;

use super::error::EngineError;
use super::request::{Request, Step};
use super::{ingest, patch, snapshot};

/// The handler set is finite and closed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpKind {
    On,
    Off,
    State,
    Diff,
    Error,
    Regular,
}

impl OpKind {
    pub fn classify(name: Option<&str>) -> OpKind {
        match name {
            Some("on") => OpKind::On,
            Some("off") => OpKind::Off,
            Some("state") => OpKind::State,
            Some("diff") => OpKind::Diff,
            Some("error") => OpKind::Error,
            _ => OpKind::Regular,
        }
    }
}

pub fn dispatch(
    req: &mut Request,
    id: &SourceId,
    config: &EngineConfig,
) -> Result<Step, EngineError> {
    match OpKind::classify(req.op.spec.op_name()) {
        OpKind::On => patch::on(req, id),
        OpKind::Off => Ok(Step::Done),
        OpKind::State => snapshot::state(req, id),
        // flattened by the queue before dispatch
        OpKind::Diff => Ok(Step::Done),
        OpKind::Error => {
            warn!(spec = %req.op.spec, from = %req.op.source, report = %req.op.value, "peer error");
            Ok(Step::Done)
        }
        OpKind::Regular => ingest::anyop(req, id, config),
    }
}
