//! Pending-op FIFO and diff flattening.
//!
//! One queue per engine instance with a busy flag, so at most one request is
//! in flight and same-object ops stay serialized.

use std::collections::VecDeque;

use crate::core::{unbundle, Op, Spec};

use super::error::EngineError;

#[derive(Debug, Default)]
pub struct OpQueue {
    items: VecDeque<Op>,
    pub busy: bool,
}

impl OpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_back(&mut self, op: Op) {
        self.items.push_back(op);
    }

    pub fn push_front(&mut self, op: Op) {
        self.items.push_front(op);
    }

    pub fn pop_front(&mut self) -> Option<Op> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Expand a `.diff` bundle into its inner ops, in payload order. Relative
/// specs are resolved against the bundle's object; the sender is inherited.
pub fn unbundle_diff(op: &Op) -> Result<Vec<Op>, EngineError> {
    let prefix = op.spec.object_prefix()?;
    let mut inner = Vec::new();
    for (spec, value) in unbundle(&op.value)? {
        let spec = if spec.starts_with('/') {
            Spec::parse(&spec)?
        } else {
            Spec::parse(&format!("{prefix}{spec}"))?
        };
        inner.push(Op::new(spec, value, op.source.clone()));
    }
    Ok(inner)
}
