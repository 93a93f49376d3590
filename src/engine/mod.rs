//! The storage engine: queue, reentrant load/dispatch cycle, atomic commit,
//! response delivery.
//!
//! One engine owns one backend. Exactly one request is in flight at a time;
//! handlers are synchronous functions of the loaded state, and the only
//! suspension points are the range scan and the batch commit.

mod dispatch;
mod error;
mod ingest;
mod keys;
mod patch;
mod queue;
mod request;
mod snapshot;

pub use dispatch::OpKind;
pub use error::EngineError;
pub use request::{Request, Step};

use std::collections::HashMap;

use crossbeam::channel::Sender;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::core::{Op, SourceId, Spec};
use crate::store::{Backend, StoreError, Write};

use dispatch::dispatch;
use queue::OpQueue;

/// Longest `.error` op value handed back to the host.
const MAX_ERROR_LEN: usize = 50;

pub struct Engine<B: Backend> {
    id: SourceId,
    backend: B,
    config: EngineConfig,
    queue: OpQueue,
    host_tx: Sender<Op>,
    /// Ops appended since the newest snapshot, per object. Advisory only.
    log_counts: HashMap<String, usize>,
}

impl<B: Backend> Engine<B> {
    pub fn new(id: SourceId, backend: B, config: EngineConfig, host_tx: Sender<Op>) -> Self {
        Self {
            id,
            backend,
            config,
            queue: OpQueue::new(),
            host_tx,
            log_counts: HashMap::new(),
        }
    }

    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// The single inbound method: admit an op and drain the queue.
    pub fn deliver(&mut self, op: Op) {
        self.queue.push_back(op);
        self.drain();
    }

    /// Close the engine, dropping the backend exactly once.
    pub fn close(self) {}

    /// Read-only dump of one object's records, suffixes relative to `prefix`.
    pub fn object_records(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let rows = self
            .backend
            .scan(&format!("{prefix}!"), &format!("{prefix}/"))?;
        Ok(rows
            .into_iter()
            .map(|(key, value)| (key[prefix.len()..].to_string(), self.restore(value)))
            .collect())
    }

    fn drain(&mut self) {
        if self.queue.busy {
            return;
        }
        self.queue.busy = true;
        while let Some(op) = self.queue.pop_front() {
            if OpKind::classify(op.op_name()) == OpKind::Diff {
                // flatten: the bundled ops take the diff's place, in order
                match queue::unbundle_diff(&op) {
                    Ok(inner) => {
                        for op in inner.into_iter().rev() {
                            self.queue.push_front(op);
                        }
                    }
                    Err(err) => self.emit_error(&op, &err),
                }
                continue;
            }
            self.process(op);
        }
        self.queue.busy = false;
    }

    fn process(&mut self, op: Op) {
        match self.run(&op) {
            Ok(responses) => {
                for response in responses {
                    self.send(response);
                }
            }
            Err(err) => self.emit_error(&op, &err),
        }
    }

    fn run(&mut self, op: &Op) -> Result<Vec<Op>, EngineError> {
        let mut req = Request::new(op.clone())?;
        loop {
            let need = req
                .need_mark
                .take()
                .expect("handler requested reload without lowering need_mark");
            debug_assert!(need < req.mark);
            let lo = format!("{}{}", req.prefix, need);
            let hi = format!("{}{}", req.prefix, req.mark);
            let rows = self.backend.scan(&lo, &hi)?;
            debug!(prefix = %req.prefix, from = %need, rows = rows.len(), "scan");
            for (key, value) in rows {
                let suffix = key[req.prefix.len()..].to_string();
                let value = self.restore(value);
                req.absorb(suffix, value);
            }
            req.mark = need;
            match dispatch(&mut req, &self.id, &self.config)? {
                Step::Done => break,
                Step::Later => {}
            }
        }
        if !req.batch.is_empty() {
            self.commit(&req.batch)?;
            self.note_growth(&req);
        }
        Ok(req.responses)
    }

    fn commit(&mut self, writes: &[Write]) -> Result<(), StoreError> {
        if !self.backend.forbids_empty_values() {
            return self.backend.batch(writes);
        }
        let writes: Vec<Write> = writes
            .iter()
            .map(|w| match w {
                Write::Put { key, value } if value.is_empty() => Write::put(key.clone(), " "),
                other => other.clone(),
            })
            .collect();
        self.backend.batch(&writes)
    }

    fn restore(&self, value: String) -> String {
        if self.backend.forbids_empty_values() && value == " " {
            String::new()
        } else {
            value
        }
    }

    fn note_growth(&mut self, req: &Request) {
        let mut appended = 0usize;
        let mut compacted = false;
        for write in &req.batch {
            let Write::Put { key, .. } = write else {
                continue;
            };
            let suffix = &key[req.prefix.len()..];
            if suffix == keys::RECENT_STATE {
                compacted = true;
            } else if suffix.contains('!')
                && !suffix.ends_with(".state")
                && !suffix.ends_with(".~br")
            {
                appended += 1;
            }
        }
        let count = self.log_counts.entry(req.prefix.clone()).or_insert(0);
        if compacted {
            *count = 0;
        }
        *count += appended;
        if *count > self.config.max_log_size {
            debug!(prefix = %req.prefix, count = *count, "log grew past threshold, snapshot recommended");
        }
    }

    fn emit_error(&mut self, op: &Op, err: &EngineError) {
        warn!(spec = %op.spec, source = %op.source, %err, "request failed");
        let mut message = err.to_string().replace('\n', " ");
        if message.len() > MAX_ERROR_LEN {
            let mut end = MAX_ERROR_LEN;
            while !message.is_char_boundary(end) {
                end -= 1;
            }
            message.truncate(end);
        }
        let prefix = op.spec.object_prefix().unwrap_or_default();
        let Ok(spec) = Spec::parse(&format!("{prefix}.error")) else {
            return;
        };
        self.send(Op::new(spec, message, self.id.clone()));
    }

    fn send(&self, op: Op) {
        if self.host_tx.send(op).is_err() {
            warn!("host channel closed, dropping response");
        }
    }
}
