//! Message application (spec §4.4.3 steps 9-12): fold one incoming
//! [`XferMessage`] into the receiver's object table and coupling state.
//!
//! Reconstructing the actual mesh entity a `PackedObject` describes (its
//! geometry, corners, payload-typed fields) is necessarily type-specific —
//! that is exactly what `XFERSCATTER`/`XFERSCATTERX` and `OBJMKCONS` exist
//! to do (spec §4.6) — so this module only owns the generic part that
//! does not depend on the concrete entity type: object-table
//! insertion/update, coupling bookkeeping, priority merge, and
//! prune-delete. It returns an [`UnpackReport`] describing what happened
//! so a caller holding the concrete `Multigrid<B, S>` can drive handler
//! callbacks and grid-list reclassification for each event.

use crate::coupling::{add_coupling, del_coupling, mod_coupling, CplMgr};
use crate::handlers::Newness;
use crate::header::ObjHeader;
use crate::ids::{Gid, ObjType};
use crate::objtable::ObjectTable;
use crate::options::Options;
use crate::priority::{self, Priority};
use crate::xfer::message::XferMessage;

#[derive(Debug)]
pub enum UnpackEvent {
    /// A brand-new object was inserted into the object table. Carries the
    /// gathered payload bytes and the `ObjType` tag so a caller holding the
    /// concrete `Multigrid<B, S>` can dispatch to the right `XFERSCATTER`
    /// reconstruction (spec §4.6) without this module knowing entity types.
    Created { gid: Gid, objtype: ObjType, priority: Priority, newness: Newness, payload: Vec<u8> },
    /// An object already present had its priority merged/updated.
    Updated { gid: Gid, old_priority: Priority, new_priority: Priority },
    /// A queued delete was executed on this processor's own object table
    /// (emitted by [`crate::xfer::xfer_end`], not by [`apply_message`]).
    Deleted { gid: Gid },
    /// A queued delete was pruned because an equal-or-better incoming copy
    /// superseded it this same round (spec §4.4.2 XFER-M1; emitted by
    /// [`crate::xfer::xfer_end`], not by [`apply_message`]).
    DeletePruned { gid: Gid },
    /// A remote peer reported it deleted its own copy or changed its
    /// priority; the local coupling entry for that peer was dropped or
    /// updated accordingly (no local object was deleted).
    CouplingDropped { gid: Gid, peer: crate::ids::ProcId },
    /// A remote peer's recorded priority for a coupled object changed.
    PriorityChanged { gid: Gid, peer: crate::ids::ProcId, old_priority: Priority, new_priority: Priority },
}

#[derive(Default, Debug)]
pub struct UnpackReport {
    pub events: Vec<UnpackEvent>,
}

pub fn apply_message(
    msg: &XferMessage,
    objtable: &mut ObjectTable,
    cplmgr: &mut CplMgr,
    options: &Options,
) -> UnpackReport {
    let mut report = UnpackReport::default();

    for obj in &msg.objects {
        match objtable.get_mut(obj.gid) {
            Some(existing) => {
                let old = existing.priority;
                let merged = priority::default_merge(old, obj.priority);
                existing.priority = merged;
                let already_coupled = existing.couplings.iter().any(|(p, _)| p == msg.from);
                if obj.still_held && !already_coupled {
                    let _ = add_coupling(cplmgr, &mut existing.couplings, obj.gid, msg.from, obj.priority, options.cplmgr_use_freelist);
                } else if !obj.still_held && already_coupled {
                    del_coupling(cplmgr, &mut existing.couplings, msg.from);
                    if existing.is_local() {
                        objtable.demote_to_local(obj.gid);
                    }
                }
                report.events.push(UnpackEvent::Updated { gid: obj.gid, old_priority: old, new_priority: merged });
            }
            None => {
                let mut header = ObjHeader::new(obj.gid, obj.objtype, obj.attr, obj.priority);
                if obj.still_held {
                    let _ = add_coupling(cplmgr, &mut header.couplings, obj.gid, msg.from, obj.priority, options.cplmgr_use_freelist);
                }
                objtable.insert_local(header);
                if obj.still_held {
                    objtable.promote_to_coupled(obj.gid);
                }
                report.events.push(UnpackEvent::Created {
                    gid: obj.gid,
                    objtype: obj.objtype,
                    priority: obj.priority,
                    newness: obj.newness,
                    payload: obj.payload.clone(),
                });
            }
        }
    }

    for &gid in &msg.deletes {
        if let Some(h) = objtable.get_mut(gid) {
            del_coupling(cplmgr, &mut h.couplings, msg.from);
            if h.is_local() {
                objtable.demote_to_local(gid);
            }
            report.events.push(UnpackEvent::CouplingDropped { gid, peer: msg.from });
        }
    }

    for &(gid, new_priority) in &msg.prio_changes {
        if let Some(h) = objtable.get_mut(gid) {
            let old = h.couplings.find(msg.from).unwrap_or(new_priority);
            let _ = mod_coupling(&mut h.couplings, gid, msg.from, new_priority);
            report.events.push(UnpackEvent::PriorityChanged { gid, peer: msg.from, old_priority: old, new_priority });
        }
    }

    report
}
