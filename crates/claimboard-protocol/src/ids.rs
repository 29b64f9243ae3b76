use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a map tile, as assigned by the geometry document.
///
/// Unsigned on purpose: a negative id in a geometry or state document is a
/// corrupt source and fails at deserialization, before any rule runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileId(pub u32);

impl TileId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TileId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

/// Alliance ids are opaque strings handed out by the account backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllianceId(pub String);

impl AllianceId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AllianceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AllianceId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Local id of an item in a planning sequence.
///
/// Only unique within the planner that issued it; ids are regenerated when a
/// plan is decoded from a share string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceItemId(pub u64);

impl fmt::Display for SequenceItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seq-{}", self.0)
    }
}

/// Monotonic id source owned by a single planner instance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceIdGenerator {
    next: u64,
}

impl SequenceIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> SequenceItemId {
        let id = SequenceItemId(self.next);
        self.next += 1;
        id
    }
}
