//! Wire message shape (spec §4.4.3 steps 5-7): a sorted symbol table of
//! every gid the message's objects reference, a sorted object table of the
//! objects themselves, and each object's gathered payload.
//!
//! Real pointer relocalization (rewriting a packed pointer's foreign
//! address into a local one via the symbol table) happens inside
//! `XFERSCATTER`/`XFERSCATTERX` handlers, which receive the resolved
//! symbol table alongside the raw payload bytes; this module only builds
//! and carries that symbol table; it does not interpret payloads.

use serde::{Deserialize, Serialize};

use crate::handlers::Newness;
use crate::header::Attr;
use crate::ids::{Gid, ObjType, ProcId};
use crate::priority::Priority;

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct PackedObject {
    pub gid: Gid,
    pub objtype: ObjType,
    pub priority: Priority,
    pub attr: Attr,
    pub newness: Newness,
    pub payload: Vec<u8>,
    /// `false` when the very same `XferEnd` round that sent this copy also
    /// deleted the sender's own object (a migration rather than a
    /// replication). The receiver then must not register a coupling back
    /// to a processor that is about to hold nothing at all.
    pub still_held: bool,
}

// `Newness` needs (de)serialize to ride inside `PackedObject`.
impl Serialize for Newness {
    fn serialize<Ser: serde::Serializer>(&self, s: Ser) -> Result<Ser::Ok, Ser::Error> {
        let tag: u8 = match self {
            Newness::NotNew => 0,
            Newness::PartNew => 1,
            Newness::PrunedNew => 2,
            Newness::TotalNew => 3,
        };
        s.serialize_u8(tag)
    }
}

impl<'de> Deserialize<'de> for Newness {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let tag = u8::deserialize(d)?;
        Ok(match tag {
            0 => Newness::NotNew,
            1 => Newness::PartNew,
            2 => Newness::PrunedNew,
            _ => Newness::TotalNew,
        })
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct XferMessage {
    pub from: ProcId,
    /// Every gid any packed object or its payload refers to, sorted (spec
    /// §4.4.3 step 6: "sort the symbol table by gid").
    pub symbol_table: Vec<Gid>,
    /// The objects themselves, sorted by gid (same step).
    pub objects: Vec<PackedObject>,
    /// Gids the sender just deleted locally, addressed only to processors
    /// it already had a coupling with for that object (spec §4.4.1). The
    /// receiver drops its own coupling entry for `from` — it does not
    /// delete its own copy, since the sender giving up its copy says
    /// nothing about whether the receiver's copy should disappear too.
    pub deletes: Vec<Gid>,
    /// `(gid, new_priority)` pairs the sender changed locally via
    /// `XferPrioChange`, again addressed only to existing coupling
    /// partners; the receiver updates its coupling record of the sender's
    /// priority, not its own object's priority.
    pub prio_changes: Vec<(Gid, Priority)>,
}

impl XferMessage {
    pub fn resolve_symbol(&self, index: usize) -> Option<Gid> {
        self.symbol_table.get(index).copied()
    }
}
