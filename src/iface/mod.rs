//! C5: the interface builder and node-class propagation (spec §4.5).
//!
//! An "interface" is the set of (local object, remote processor, remote
//! priority) triples describing which of this processor's coupled objects
//! must be exchanged with which peer, grouped by priority-pair so C4 and
//! numerical solvers alike can iterate just the pairs they care about
//! (e.g. master↔border only).

pub mod nodeclass;

use crate::header::ObjHeader;
use crate::ids::{Gid, ProcId};
use crate::objtable::ObjectTable;
use crate::priority::Priority;

/// One interface entry: a local object coupled to `peer` at `peer_prio`,
/// while this processor holds it at `local_prio`.
#[derive(Clone, Copy, Debug)]
pub struct IfEntry {
    pub gid: Gid,
    pub peer: ProcId,
    pub local_prio: Priority,
    pub peer_prio: Priority,
}

#[derive(Default, Debug)]
pub struct Interface {
    pub entries: Vec<IfEntry>,
}

impl Interface {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_peer(&self, peer: ProcId) -> impl Iterator<Item = &IfEntry> {
        self.entries.iter().filter(move |e| e.peer == peer)
    }
}

/// `IFAllFromScratch`: rebuild the whole interface by scanning every
/// coupled object's coupling list (spec §4.5: "from scratch" means no
/// incremental reuse of a previous interface — every entry is
/// regenerated).
pub fn if_all_from_scratch(objtable: &ObjectTable, self_prio_of: impl Fn(&ObjHeader) -> Priority) -> Interface {
    let span = tracing::info_span!("if_all_from_scratch");
    let _guard = span.enter();

    let mut entries = Vec::new();
    for header in objtable.coupled() {
        let local_prio = self_prio_of(header);
        for (peer, peer_prio) in header.couplings.iter() {
            entries.push(IfEntry { gid: header.gid, peer, local_prio, peer_prio });
        }
    }
    tracing::debug!(n_entries = entries.len(), "interface rebuilt from scratch");
    Interface { entries }
}

/// `IFRefreshAll`: recompute only the priority fields of an existing
/// interface's entries against the current object table, without changing
/// its membership (spec §4.5; used after a priority-only change such as
/// `XferPrioChange` that doesn't add or remove couplings).
pub fn if_refresh_all(iface: &mut Interface, objtable: &ObjectTable, self_prio_of: impl Fn(&ObjHeader) -> Priority) {
    for entry in &mut iface.entries {
        if let Some(header) = objtable.get(entry.gid) {
            entry.local_prio = self_prio_of(header);
            if let Some(p) = header.couplings.find(entry.peer) {
                entry.peer_prio = p;
            }
        }
    }
}
