//! C4: the transfer engine (spec §4.4) — `XferBegin`/`XferEnd`'s mode state
//! machine, command queuing, message pack/unpack, and the low-level
//! transport boundary.

pub mod commands;
pub mod lowcomm;
pub mod merge;
pub mod message;
pub mod pack;
pub mod unpack;

use crate::coupling::CplMgr;
use crate::error::XferError;
use crate::handlers::HandlerRegistry;
use crate::ids::{Gid, ObjType, ProcId};
use crate::header::Attr;
use crate::objtable::ObjectTable;
use crate::options::Options;
use crate::priority::Priority;
use commands::{AddData, Command, CommandQueue, CopyObj, DeleteObj, PrioChange};
use lowcomm::LowComm;
use unpack::UnpackReport;

/// `XMODE_IDLE` → `XMODE_CMDS` → `XMODE_BUSY` → `XMODE_IDLE` (spec §4.4):
/// commands may only be queued in `Cmds`, and `XferEnd` transitions
/// through `Busy` while messages are in flight.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum XferMode {
    Idle,
    Cmds,
    Busy,
}

/// Per-processor transfer state: the current mode and the commands queued
/// since the last `XferBegin`.
pub struct XferState {
    pub mode: XferMode,
    pub queue: CommandQueue,
}

impl Default for XferState {
    fn default() -> Self {
        XferState { mode: XferMode::Idle, queue: CommandQueue::new() }
    }
}

impl XferState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `XferBegin`: only legal from `Idle`.
    pub fn begin(&mut self) -> Result<(), XferError> {
        if self.mode != XferMode::Idle {
            return Err(XferError::BeginWrongMode(self.mode));
        }
        self.mode = XferMode::Cmds;
        self.queue.clear();
        Ok(())
    }

    fn require_cmds_mode(&self) -> Result<(), XferError> {
        if self.mode != XferMode::Cmds {
            return Err(XferError::EndWrongMode(self.mode));
        }
        Ok(())
    }

    pub fn copy_obj(&mut self, gid: Gid, objtype: ObjType, dest: ProcId, priority: Priority, attr: Attr) -> Result<(), XferError> {
        self.require_cmds_mode()?;
        self.queue.push(Command::CopyObj(CopyObj { gid, objtype, dest, priority, attr, payload_size: None }));
        Ok(())
    }

    pub fn copy_obj_x(
        &mut self,
        gid: Gid,
        objtype: ObjType,
        dest: ProcId,
        priority: Priority,
        attr: Attr,
        payload_size: usize,
    ) -> Result<(), XferError> {
        self.require_cmds_mode()?;
        self.queue.push(Command::CopyObj(CopyObj { gid, objtype, dest, priority, attr, payload_size: Some(payload_size) }));
        Ok(())
    }

    pub fn delete_obj(&mut self, gid: Gid) -> Result<(), XferError> {
        self.require_cmds_mode()?;
        self.queue.push(Command::DeleteObj(DeleteObj { gid }));
        Ok(())
    }

    pub fn prio_change(&mut self, gid: Gid, new_priority: Priority) -> Result<(), XferError> {
        self.require_cmds_mode()?;
        self.queue.push(Command::PrioChange(PrioChange { gid, new_priority }));
        Ok(())
    }

    pub fn add_data(&mut self, gid: Gid, dest: ProcId, data: Vec<u8>) -> Result<(), XferError> {
        self.require_cmds_mode()?;
        self.queue.push(Command::AddData(AddData { gid, dest, data }));
        Ok(())
    }
}

/// `XferEnd`'s thirteen-step pipeline, reduced to the steps this crate
/// implements generically (spec §4.4.3): validate mode, build one message
/// per destination, send, receive every inbound message, unpack each,
/// register this processor's own new couplings from un-shadowed
/// `CopyObj` commands, execute this processor's own queued deletes/prio-
/// changes locally, and return to `Idle`. Rule-selection / son-
/// construction style failures belong to C2, not C4; a transport failure
/// here surfaces as [`XferError::PeerAborted`] and leaves the state
/// machine at `Busy` for the caller to retry or abort.
pub fn xfer_end<B, S, C>(
    state: &mut XferState,
    comm: &mut C,
    self_proc: ProcId,
    objtable: &mut ObjectTable,
    cplmgr: &mut CplMgr,
    options: &Options,
    registry: &HandlerRegistry<B, S>,
) -> Result<Vec<UnpackReport>, XferError>
where
    B: crate::boundary::BndP,
    S: crate::boundary::BndS,
    C: LowComm,
{
    state.require_cmds_mode()?;
    state.mode = XferMode::Busy;

    let span = tracing::info_span!("xfer_end", proc = %self_proc);
    let _guard = span.enter();

    // A `DeleteObj`/`PrioChange` command has no destination of its own; it
    // is addressed to every processor already coupled to the object it
    // touches, on top of whatever `CopyObj`/`AddData` already names.
    let mut destinations = state.queue.destinations();
    for cmd in &state.queue.commands {
        let gid = match cmd {
            Command::DeleteObj(d) => d.gid,
            Command::PrioChange(p) => p.gid,
            _ => continue,
        };
        if let Some(header) = objtable.get(gid) {
            for (peer, _) in header.couplings.iter() {
                if !destinations.contains(&peer) {
                    destinations.push(peer);
                }
            }
        }
    }
    destinations.sort_unstable_by_key(|p| p.0);
    destinations.dedup();

    for dest in destinations {
        let msg = pack::build_message(self_proc, dest, &state.queue, objtable, registry);
        if options.debug_xfermsgs {
            tracing::debug!(?dest, n_objects = msg.objects.len(), "xfer message built");
        }
        let bytes = serde_json::to_vec(&msg).map_err(|_| XferError::PlanningOutOfMemory)?;
        comm.send(dest, bytes);
    }

    // Receive every inbound message before unpacking any of them, and
    // before this processor's own local deletes run, so a delete whose
    // gid was simultaneously replicated in from elsewhere is pruned
    // (spec §4.4.2 XFER-M1) rather than clobbering the fresher copy.
    let mut incoming = Vec::new();
    for (_from, bytes) in comm.receive_all() {
        let msg: message::XferMessage = serde_json::from_slice(&bytes).map_err(|_| XferError::PlanningOutOfMemory)?;
        incoming.push(msg);
    }
    let incoming_gids: std::collections::HashSet<Gid> =
        incoming.iter().flat_map(|m| m.objects.iter().map(|o| o.gid)).collect();

    let mut reports = Vec::new();
    for msg in &incoming {
        if options.info_xfer.contains(crate::options::InfoXfer::SHOW_MSGSALL) {
            tracing::info!(from = %msg.from, n_objects = msg.objects.len(), "xfer message received");
        }
        reports.push(unpack::apply_message(msg, objtable, cplmgr, options));
    }

    // A `CopyObj` that isn't shadowed by a same-round `DeleteObj` on the
    // same gid hands out a copy this processor keeps holding — register
    // the coupling to `dest` on this side too, so the coupling invariant
    // (spec §7/§8: "entries mirror the couplings held by the
    // corresponding remote processor") holds from this same round rather
    // than waiting on a reply message that never comes.
    for cmd in &state.queue.commands {
        if let Command::CopyObj(c) = cmd {
            let shadowed_by_delete = state.queue.commands.iter().any(|other| matches!(other, Command::DeleteObj(d) if d.gid == c.gid));
            if shadowed_by_delete {
                continue;
            }
            if let Some(header) = objtable.get_mut(c.gid) {
                let was_local = header.is_local();
                if crate::coupling::add_coupling(cplmgr, &mut header.couplings, c.gid, c.dest, c.priority, options.cplmgr_use_freelist).is_ok() && was_local {
                    objtable.promote_to_coupled(c.gid);
                }
            }
        }
    }

    // Local deletes first, then local prio-changes (spec §4.4.3 steps 5
    // and 7) — run against this processor's own object table now that the
    // incoming batch is known, so a delete superseded by an inbound copy
    // of the same gid is pruned rather than executed.
    let mut local_report = UnpackReport::default();
    for cmd in &state.queue.commands {
        match cmd {
            Command::DeleteObj(d) => {
                if options.xfer_prune_delete && incoming_gids.contains(&d.gid) {
                    if let Some(h) = objtable.get_mut(d.gid) {
                        h.pruned = true;
                        h.resent = true;
                    }
                    local_report.events.push(unpack::UnpackEvent::DeletePruned { gid: d.gid });
                } else if let Some(mut header) = objtable.remove(d.gid) {
                    crate::coupling::dispose_coupling_list(cplmgr, &mut header.couplings);
                    local_report.events.push(unpack::UnpackEvent::Deleted { gid: d.gid });
                }
            }
            Command::PrioChange(p) => {
                if let Some(h) = objtable.get_mut(p.gid) {
                    h.priority = p.new_priority;
                }
            }
            _ => {}
        }
    }
    if !local_report.events.is_empty() {
        reports.push(local_report);
    }

    state.queue.clear();
    state.mode = XferMode::Idle;
    Ok(reports)
}
