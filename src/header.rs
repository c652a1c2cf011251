//! The C3 object header every distributable entity embeds (spec §3.1, §4.1).

use crate::coupling::CouplingList;
use crate::ids::{Gid, Level, ObjType};
use crate::priority::Priority;

/// Per-processor-local context encoding grid level and other packed
/// attribute bits the original keeps on a single `attr` word. Kept as a
/// plain struct rather than a bitfield: nothing downstream of this crate
/// reads it as raw bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Attr {
    pub level: Level,
    pub subdomain: u16,
}

/// The header every mesh entity (C1) carries, giving it cross-processor
/// identity, a role, and a coupling chain (C3).
#[derive(Debug)]
pub struct ObjHeader {
    pub gid: Gid,
    pub objtype: ObjType,
    pub attr: Attr,
    pub priority: Priority,
    /// Set while the object is linked into its owning grid list / object
    /// table; cleared just before deallocation so dangling references can
    /// be detected defensively in debug assertions.
    pub used: bool,
    /// Set during `XferEnd`'s pruning phase (spec §4.4.2) on objects whose
    /// `XferDeleteObj` command was pruned because an equal-or-better copy
    /// was inbound. Observable via [`ObjHeader::is_pruned_delete`].
    pub pruned: bool,
    /// Set alongside `pruned` when the pruned object's incoming copy is
    /// also a fresh send from the same step (spec scenario 4, "prune-delete").
    pub resent: bool,
    /// Sticky once-identified marker, Open Question (d) in DESIGN.md:
    /// survives independently of `Options::ident_only_new`.
    pub identified: bool,
    pub couplings: CouplingList,
}

impl ObjHeader {
    pub fn new(gid: Gid, objtype: ObjType, attr: Attr, priority: Priority) -> Self {
        ObjHeader {
            gid,
            objtype,
            attr,
            priority,
            used: true,
            pruned: false,
            resent: false,
            identified: false,
            couplings: CouplingList::new(),
        }
    }

    /// An object is "local" (glossary) iff it has zero couplings.
    pub fn is_local(&self) -> bool {
        self.couplings.is_empty()
    }

    pub fn is_pruned_delete(&self) -> bool {
        self.pruned
    }

    pub fn is_resent(&self) -> bool {
        self.resent
    }
}
