//! Identity newtypes shared by every distributable object (C3) and by the
//! mesh entities layered on top of them (C1).

use std::fmt;

/// Processor-independent global identity. Source dense enough to sort by
/// value and compare cheaply; real deployments derive it from a
/// per-processor counter high-bit-tagged with the creating processor's
/// [`ProcId`], but that derivation is a caller concern, not this crate's.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct Gid(pub u64);

impl fmt::Display for Gid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gid:{:#x}", self.0)
    }
}

/// Identifies a processor in the parallel machine. `ProcId::NONE` is used as
/// a sentinel for "no remote processor" in contexts that need one (e.g. a
/// coupling enumeration's synthetic self-entry).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProcId(pub u16);

impl ProcId {
    pub const NONE: ProcId = ProcId(u16::MAX);
}

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A per-type-descriptor tag distinguishing e.g. `Vertex` from `Element`
/// from `Vector`, and boundary from inner variants of the same entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct ObjType(pub u16);

/// Fixed type tags for the five C1 entity kinds (spec §3.1), used wherever
/// the transfer engine (C4) needs to know which kind of entity a gid names
/// without carrying the concrete Rust type along (`crate::xfer::message::
/// PackedObject` only ever holds an `ObjType` and raw payload bytes).
pub const OBJTYPE_VERTEX: ObjType = ObjType(0);
pub const OBJTYPE_NODE: ObjType = ObjType(1);
pub const OBJTYPE_EDGE: ObjType = ObjType(2);
pub const OBJTYPE_ELEMENT: ObjType = ObjType(3);
pub const OBJTYPE_VECTOR: ObjType = ObjType(4);

/// A refinement level, 0 is the coarsest grid.
pub type Level = u32;

/// Process-local, non-stable index into an [`crate::objtable::ObjectTable`].
/// Only valid until the next compaction of the table that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LocalId(pub usize);
