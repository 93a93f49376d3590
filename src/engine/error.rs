//! Engine-local errors, surfaced to the host as `.error` ops.

use thiserror::Error;

use crate::core::ParseError;
use crate::store::StoreError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Regular op for an object with no prior state.
    #[error("no such object")]
    NoSuchObject,

    /// Snapshot from a foreign non-base author over an existing object.
    #[error("have state already")]
    HaveState,

    /// Late op from a source whose later op is already logged.
    #[error("op is out of order")]
    OutOfOrder,

    /// Subscription base matching none of the recognized shapes.
    #[error("base `{base}` is unrecognized")]
    UnrecognizedBase { base: String },

    /// Base-state overwrite path, reserved.
    #[error("base state overwrite is not implemented")]
    NotImplemented,

    #[error("backend: {0}")]
    Backend(#[from] StoreError),
}
