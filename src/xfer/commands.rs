//! C4 transfer commands (spec §4.4): the five commands a processor queues
//! between `XferBegin` and `XferEnd`, accumulated per destination
//! processor until `XferEnd` merges and executes them.

use crate::header::Attr;
use crate::ids::{Gid, ObjType, ProcId};
use crate::priority::Priority;

/// `XferCopyObj`/`XferCopyObjX`: send a copy of a local object to `dest`
/// at `priority`. The `X` variant additionally carries an explicit
/// `payload_size` used to validate against the type's declared size
/// (`XferError::SizeMismatch`); the non-`X` form infers it from the
/// handler registry.
#[derive(Clone, Debug)]
pub struct CopyObj {
    pub gid: Gid,
    pub objtype: ObjType,
    pub dest: ProcId,
    pub priority: Priority,
    pub attr: Attr,
    pub payload_size: Option<usize>,
}

/// `XferDeleteObj`: request deletion of a local object once the transfer
/// completes. Subject to pruning (spec §4.4.2 XFER-M1) if an equal-or-
/// better incoming copy supersedes it.
#[derive(Clone, Debug)]
pub struct DeleteObj {
    pub gid: Gid,
}

/// `XferPrioChange`: change a coupled object's priority without moving it.
#[derive(Clone, Debug)]
pub struct PrioChange {
    pub gid: Gid,
    pub new_priority: Priority,
}

/// `XferAddData`/`XferAddDataX`: attach extra payload bytes to an
/// already-queued `CopyObj` command, gathered via the handler registry's
/// `XFERGATHER`/`XFERGATHERX` at send time and distributed via
/// `XFERSCATTER`/`XFERSCATTERX` at the receiver.
#[derive(Clone, Debug)]
pub struct AddData {
    pub gid: Gid,
    pub dest: ProcId,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug)]
pub enum Command {
    CopyObj(CopyObj),
    DeleteObj(DeleteObj),
    PrioChange(PrioChange),
    AddData(AddData),
}

/// One processor's pending command queue between `XferBegin` and
/// `XferEnd`.
#[derive(Default)]
pub struct CommandQueue {
    pub commands: Vec<Command>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, cmd: Command) {
        self.commands.push(cmd);
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Every distinct destination processor referenced by a `CopyObj` or
    /// `AddData` command, used to decide which peers need a message built
    /// at all (spec §4.4.3 step 2).
    pub fn destinations(&self) -> Vec<ProcId> {
        let mut dests: Vec<ProcId> = self
            .commands
            .iter()
            .filter_map(|c| match c {
                Command::CopyObj(c) => Some(c.dest),
                Command::AddData(a) => Some(a.dest),
                _ => None,
            })
            .collect();
        dests.sort_unstable_by_key(|p| p.0);
        dests.dedup();
        dests
    }
}
