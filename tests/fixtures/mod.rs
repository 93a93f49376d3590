#![allow(dead_code)]

use crossbeam::channel::{unbounded, Receiver};

use swarmlog::{Engine, EngineConfig, MemoryBackend, Op, SourceId};

/// An engine over a memory backend with the host side of the response
/// channel held open for assertions.
pub struct EngineRig {
    pub engine: Engine<MemoryBackend>,
    pub host_rx: Receiver<Op>,
}

impl EngineRig {
    pub fn new(id: &str) -> Self {
        Self::with_config(id, EngineConfig::default())
    }

    pub fn with_config(id: &str, config: EngineConfig) -> Self {
        Self::with_backend(id, MemoryBackend::new(), config)
    }

    pub fn with_backend(id: &str, backend: MemoryBackend, config: EngineConfig) -> Self {
        swarmlog::telemetry::init();
        let (host_tx, host_rx) = unbounded();
        let engine = Engine::new(SourceId::new(id).unwrap(), backend, config, host_tx);
        Self { engine, host_rx }
    }

    pub fn deliver(&mut self, spec: &str, value: &str, source: &str) {
        self.engine
            .deliver(Op::parse(spec, value, source).expect("test op"));
    }

    /// Drain everything the engine has handed to the host so far.
    pub fn responses(&self) -> Vec<Op> {
        self.host_rx.try_iter().collect()
    }

    pub fn records(&self, prefix: &str) -> Vec<(String, String)> {
        self.engine.object_records(prefix).expect("scan")
    }

    pub fn record(&self, prefix: &str, suffix: &str) -> Option<String> {
        self.records(prefix)
            .into_iter()
            .find(|(s, _)| s == suffix)
            .map(|(_, value)| value)
    }

    pub fn tip(&self, prefix: &str) -> Option<String> {
        self.record(prefix, ".tip")
    }

    /// One object with a snapshot at `!10+X!10+X` and one op `!11+X.set`,
    /// host traffic drained.
    pub fn seed_object(&mut self) {
        self.deliver("/T#A!10+X!10+X.state", "s0", "X");
        self.deliver("/T#A!11+X.set", "v", "X");
        let _ = self.responses();
    }
}
