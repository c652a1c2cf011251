//! Closed error kinds (spec §7), one `thiserror` enum per concern, matching
//! the teacher's `error.rs` shape of a single enum of `#[error("...")]`
//! variants rather than a string-typed error.

use thiserror::Error;

use crate::ids::{Gid, ProcId};

/// C3 coupling-manager errors. Most invariant violations here are
/// best-effort repaired and only logged (spec §7 "Invariant" class); these
/// variants are for the subset that must surface to the caller.
#[derive(Error, Debug)]
pub enum CouplingError {
    #[error("cannot couple object {0} to the local processor")]
    SelfCoupling(Gid),
    #[error("no coupling from {gid} to {proc} to modify")]
    NoSuchCoupling { gid: Gid, proc: ProcId },
    #[error("out of memory allocating a coupling for {0}")]
    OutOfMemory(Gid),
}

/// C1 mesh object model errors.
#[derive(Error, Debug)]
pub enum MeshError {
    #[error("out of memory creating {0}")]
    OutOfMemory(&'static str),
    #[error("edge {0}-{1} not found")]
    EdgeNotFound(Gid, Gid),
    #[error("boundary evaluation failed for boundary point on edge {0}-{1}")]
    BoundaryEval(Gid, Gid),
    #[error("element {0} has no father on level {1}")]
    NoFather(Gid, u32),
}

/// C2 refinement engine errors.
#[derive(Error, Debug)]
pub enum RefineError {
    #[error("no refinement rule matches element {elem} (mark-class {mark_class:?}, side pattern {side_pattern:#08b})")]
    NoMatchingRule {
        elem: Gid,
        mark_class: crate::refine::marks::MarkClass,
        side_pattern: u32,
    },
    #[error("out of memory building sons of element {0}; partial sons rolled back")]
    SonConstructionOom(Gid),
    #[error("closure did not stabilize after {0} sweeps")]
    ClosureDidNotConverge(u32),
    #[error("invalid mark request: {0}")]
    InvalidMark(String),
}

/// C4 transfer engine errors.
#[derive(Error, Debug)]
pub enum XferError {
    #[error("XferBegin called while already in mode {0:?}")]
    BeginWrongMode(crate::xfer::XferMode),
    #[error("XferEnd called while in mode {0:?}, expected XMODE_CMDS")]
    EndWrongMode(crate::xfer::XferMode),
    #[error("XferCopyObj destination {0} is out of range")]
    BadDestination(ProcId),
    #[error("out of memory planning transfer messages (before point of no return)")]
    PlanningOutOfMemory,
    #[error("a peer reported a transfer abort (exception {0})")]
    PeerAborted(u32),
    #[error("declared payload size for {gid} ({declared}) differs from the type's size ({actual})")]
    SizeMismatch { gid: Gid, declared: usize, actual: usize },
}

/// Top-level error used at test/binary boundaries that may see any of the
/// above, mirroring the teacher's use of `anyhow` at the outer edge while
/// keeping typed errors internally.
pub type AnyResult<T> = anyhow::Result<T>;
