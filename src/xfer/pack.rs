//! Message building (spec §4.4.3 steps 5-7): turn one destination
//! processor's slice of the merged command set into an [`XferMessage`].
//!
//! `DeleteObj`/`PrioChange` commands carry no destination of their own —
//! unlike `CopyObj` they act on an object already held locally — so the
//! peers to notify are read off that object's current coupling list: only
//! a processor this object is actually coupled to needs to hear that the
//! sender deleted its copy or changed its priority.

use crate::handlers::{HandlerRegistry, Newness};
use crate::ids::{Gid, ProcId};
use crate::objtable::ObjectTable;
use crate::xfer::commands::{Command, CommandQueue};
use crate::xfer::message::{PackedObject, XferMessage};

/// Build the message addressed to `dest` out of every command in `queue`
/// that targets it, reading current payload state from `objtable`/
/// `registry`. `self_proc` becomes the message's `from` field.
pub fn build_message<B: crate::boundary::BndP, S: crate::boundary::BndS>(
    self_proc: ProcId,
    dest: ProcId,
    queue: &CommandQueue,
    objtable: &ObjectTable,
    _registry: &HandlerRegistry<B, S>,
) -> XferMessage {
    let mut objects = Vec::new();
    let mut deletes = Vec::new();
    let mut prio_changes = Vec::new();
    let mut referenced: Vec<Gid> = Vec::new();

    for cmd in &queue.commands {
        match cmd {
            Command::CopyObj(c) if c.dest == dest => {
                let payload = queue
                    .commands
                    .iter()
                    .filter_map(|other| match other {
                        Command::AddData(a) if a.gid == c.gid && a.dest == dest => Some(a.data.clone()),
                        _ => None,
                    })
                    .next()
                    .unwrap_or_default();
                let newness = if objtable.contains(c.gid) { Newness::PartNew } else { Newness::TotalNew };
                let still_held = !queue
                    .commands
                    .iter()
                    .any(|other| matches!(other, Command::DeleteObj(d) if d.gid == c.gid));
                referenced.push(c.gid);
                objects.push(PackedObject {
                    gid: c.gid,
                    objtype: c.objtype,
                    priority: c.priority,
                    attr: c.attr,
                    newness,
                    payload,
                    still_held,
                });
            }
            Command::DeleteObj(d) => {
                if objtable.get(d.gid).is_some_and(|h| h.couplings.iter().any(|(p, _)| p == dest)) {
                    deletes.push(d.gid);
                }
            }
            Command::PrioChange(p) => {
                if objtable.get(p.gid).is_some_and(|h| h.couplings.iter().any(|(p2, _)| p2 == dest)) {
                    prio_changes.push((p.gid, p.new_priority));
                }
            }
            _ => {}
        }
    }

    objects.sort_by_key(|o| o.gid);
    referenced.sort_unstable();
    referenced.dedup();

    XferMessage { from: self_proc, symbol_table: referenced, objects, deletes, prio_changes }
}
