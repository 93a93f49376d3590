//! Version vectors: per-source high-water marks.
//!
//! A map `source -> max timestamp accepted from that source`; equivalently,
//! the set of versions at or below it. Value semantics throughout - maps are
//! cloned into each request, never shared mutable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ParseError;
use super::spec::{Sigil, Spec};
use super::version::Version;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionMap {
    inner: BTreeMap<String, String>,
}

impl VersionMap {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn get(&self, source: &str) -> Option<&str> {
        self.inner.get(source).map(String::as_str)
    }

    pub fn has_source(&self, source: &str) -> bool {
        self.inner.contains_key(source)
    }

    /// Monotonic raise: a version never lowers an entry. Zero adds nothing.
    pub fn add(&mut self, version: &Version) {
        if version.is_zero() {
            return;
        }
        let entry = self.inner.entry(version.source.clone()).or_default();
        if version.ts > *entry {
            *entry = version.ts.clone();
        }
    }

    /// Is `version` at or below this map? The zero version always is.
    pub fn covers(&self, version: &Version) -> bool {
        if version.is_zero() {
            return true;
        }
        self.inner
            .get(&version.source)
            .is_some_and(|ts| *ts >= version.ts)
    }

    /// Does this map cover every entry of `other`?
    pub fn covers_all(&self, other: &VersionMap) -> bool {
        other
            .iter()
            .all(|v| self.covers(&v))
    }

    /// Greatest entry by `(ts, source)`. None for the empty map.
    pub fn max_ts(&self) -> Option<Version> {
        self.iter().max()
    }

    /// Smallest entry by `(ts, source)`. None for the empty map.
    pub fn min_ts(&self) -> Option<Version> {
        self.iter().min()
    }

    /// Componentwise max.
    pub fn union(&self, other: &VersionMap) -> VersionMap {
        let mut out = self.clone();
        for v in other.iter() {
            out.add(&v);
        }
        out
    }

    /// Componentwise min of positive entries; a source present on one side
    /// only keeps its entry.
    pub fn lower_union(&self, other: &VersionMap) -> VersionMap {
        let mut inner = BTreeMap::new();
        for (source, ts) in &self.inner {
            let ts = match other.inner.get(source) {
                Some(theirs) if theirs < ts => theirs,
                _ => ts,
            };
            inner.insert(source.clone(), ts.clone());
        }
        for (source, ts) in &other.inner {
            inner
                .entry(source.clone())
                .or_insert_with(|| ts.clone());
        }
        VersionMap { inner }
    }

    pub fn iter(&self) -> impl Iterator<Item = Version> + '_ {
        self.inner
            .iter()
            .map(|(source, ts)| Version::new(ts.clone(), source.clone()))
    }

    pub fn from_versions<'a>(versions: impl IntoIterator<Item = &'a Version>) -> Self {
        let mut map = VersionMap::new();
        for v in versions {
            map.add(v);
        }
        map
    }
}

/// Sorted by source, one `!ts+src` token per entry. Empty renders as `!0`.
impl fmt::Display for VersionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            return write!(f, "!0");
        }
        for (source, ts) in &self.inner {
            write!(f, "!{ts}+{source}")?;
        }
        Ok(())
    }
}

impl FromStr for VersionMap {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = Spec::parse(s).map_err(|_| ParseError::vector(s, "malformed tokens"))?;
        if spec.tokens().any(|t| t.sigil != Sigil::Version) {
            return Err(ParseError::vector(s, "non-version token"));
        }
        let versions = spec.versions();
        if versions.iter().any(|v| !v.is_zero() && v.source.is_empty()) {
            return Err(ParseError::vector(s, "version missing source"));
        }
        Ok(VersionMap::from_versions(&versions))
    }
}
