//! Layered core: specifiers, versions, version vectors, the op delivery unit.

mod diff;
mod error;
mod op;
mod spec;
mod version;
mod vmap;

pub use diff::{bundle, unbundle};
pub use error::ParseError;
pub use op::{Op, SourceId};
pub use spec::{Sigil, Spec, Token};
pub use version::Version;
pub use vmap::VersionMap;
