//! Command merge/pruning rules (spec §4.4.2, rules `XFER-C1`..`XFER-M1`).
//!
//! Before execution, `XferEnd` merges every queued command against the
//! object's current coupling state and against other commands touching the
//! same object, so that e.g. a `CopyObj` to a processor the object is
//! already coupled to at an equal-or-lower priority turns into a no-op
//! rather than a duplicate send.

use crate::priority::{self, Priority};

/// `XFER-C1`: a `CopyObj` to a destination the sender already has a
/// coupling with is only sent if the new priority would win the merge
/// against the existing one (spec §4.4.2) — otherwise it is redundant.
pub fn copy_is_redundant(existing: Option<Priority>, incoming: Priority) -> bool {
    match existing {
        None => false,
        Some(existing) => priority::default_merge(existing, incoming) == existing,
    }
}

/// `XFER-M1`: a queued `XferDeleteObj` is pruned (turned into a no-op,
/// `ObjHeader::pruned` set instead of actually removing the object) when
/// an incoming copy for the same gid would recreate it this same step —
/// deleting and immediately recreating the object is wasted work and
/// would also lose any locally attached payload the incoming copy is
/// meant to merge into.
pub fn delete_is_pruned(incoming_copy_for_same_gid: bool) -> bool {
    incoming_copy_for_same_gid
}

/// `XFER-C2`: when two `CopyObj` commands for the same gid target the same
/// destination, the one with the winning (lower-ranked) priority survives;
/// on a tie the first one queued wins, since re-sending an identical copy
/// is idempotent.
pub fn merge_duplicate_copies(a_priority: Priority, b_priority: Priority) -> Priority {
    priority::default_merge(a_priority, b_priority)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_to_existing_equal_priority_is_redundant() {
        assert!(copy_is_redundant(Some(Priority::Master), Priority::Master));
    }

    #[test]
    fn copy_to_existing_worse_priority_is_not_redundant_when_incoming_wins() {
        assert!(!copy_is_redundant(Some(Priority::None), Priority::Master));
    }

    #[test]
    fn copy_with_no_existing_coupling_is_never_redundant() {
        assert!(!copy_is_redundant(None, Priority::Master));
    }

    #[test]
    fn merge_duplicate_copies_picks_the_winning_priority() {
        assert_eq!(merge_duplicate_copies(Priority::Border, Priority::Master), Priority::Master);
    }
}
