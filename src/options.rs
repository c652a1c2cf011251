//! Configuration options (spec §6), threaded through [`crate::context::DddContext`]
//! instead of living in process-wide statics (spec §9 design note on global
//! mutable state).

use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// `OPT_INFO_XFER` diagnostic verbosity bits. A small hand-rolled bitset
/// rather than a `bitflags`-style macro: three flags don't earn a
/// dependency the rest of the pack never reaches for.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct InfoXfer(u8);

impl InfoXfer {
    pub const SHOW_OBSOLETE: InfoXfer = InfoXfer(0b001);
    pub const SHOW_MSGSALL: InfoXfer = InfoXfer(0b010);
    pub const SHOW_MEMUSAGE: InfoXfer = InfoXfer(0b100);

    pub const fn empty() -> Self {
        InfoXfer(0)
    }

    pub fn contains(self, flag: InfoXfer) -> bool {
        self.0 & flag.0 == flag.0
    }
}

impl BitOr for InfoXfer {
    type Output = InfoXfer;
    fn bitor(self, rhs: InfoXfer) -> InfoXfer {
        InfoXfer(self.0 | rhs.0)
    }
}

impl BitOrAssign for InfoXfer {
    fn bitor_assign(&mut self, rhs: InfoXfer) {
        self.0 |= rhs.0;
    }
}

/// All `OPT_*` flags from spec §6, collected on one struct so a
/// [`crate::context::DddContext`] can be constructed with a single
/// `Options` value instead of a dozen constructor arguments.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Options {
    /// `OPT_XFER_PRUNE_DELETE`: enable the delete-pruning phase (spec
    /// §4.4.2, "Pruned-delete option").
    pub xfer_prune_delete: bool,
    /// `OPT_INFO_XFER` bitfield.
    pub info_xfer: InfoXfer,
    /// `OPT_DEBUG_XFERMESGS`: dump every send/recv message via `tracing::debug!`.
    pub debug_xfermsgs: bool,
    /// `OPT_WARNING_VARSIZE_OBJ`: warn when `XferCopyObjX`'s declared size
    /// differs from the type's size.
    pub warning_varsize_obj: bool,
    /// `OPT_WARNING_SMALLSIZE`: warn when a declared size is implausibly
    /// small for the type.
    pub warning_smallsize: bool,
    /// `OPT_WARNING_REF_COLLISION`: warn (rather than stay silent) on
    /// merge-mode reference conflicts during unpack (spec §4.4.5).
    pub warning_ref_collision: bool,
    /// `OPT_CPLMGR_USE_FREELIST`: use segment freelists for couplings
    /// (Open Question (c), DESIGN.md) — default on, the fast path.
    pub cplmgr_use_freelist: bool,
    /// `OPT_IDENT_ONLY_NEW`: only identify freshly created objects during
    /// identification (Open Question (d), DESIGN.md) — identification
    /// state is sticky regardless of this flag's value at call time.
    pub ident_only_new: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            xfer_prune_delete: false,
            info_xfer: InfoXfer::empty(),
            debug_xfermsgs: false,
            warning_varsize_obj: true,
            warning_smallsize: true,
            warning_ref_collision: false,
            cplmgr_use_freelist: true,
            ident_only_new: false,
        }
    }
}
