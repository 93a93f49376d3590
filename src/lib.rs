#![forbid(unsafe_code)]

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod store;
pub mod telemetry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::config::EngineConfig;
pub use crate::core::{
    bundle, unbundle, Op, ParseError, Sigil, SourceId, Spec, Token, Version, VersionMap,
};
pub use crate::engine::{Engine, EngineError};
pub use crate::store::{Backend, MemoryBackend, RedbBackend, StoreError, Write};
