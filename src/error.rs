use thiserror::Error;

use crate::core::ParseError;
use crate::engine::EngineError;
use crate::store::StoreError;

/// Crate-level convenience error: a thin wrapper over the capability errors,
/// not a catch-all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
