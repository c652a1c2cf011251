//! Priority classes (glossary: "role of a local object copy") and the
//! `PriorityMerge` matrix used throughout C3/C4 to resolve collisions.

use serde::{Deserialize, Serialize};

/// Role of a local copy of a distributed object.
///
/// Ordered by authority for the purposes of [`PriorityMerge::default_merge`]:
/// `Master` always wins, `None` always loses, and the three ghost flavours
/// only matter relative to each other and to `Border`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Priority {
    /// Authoritative copy; at most one per global identity, system-wide.
    Master,
    /// Copy at a processor interface, kept in sync with the master.
    Border,
    /// Read-only copy kept only to close a horizontal (same-level) pointer
    /// reference from a master/border element.
    HGhost,
    /// Read-only copy kept to close a vertical (father/son) reference.
    VGhost,
    /// Read-only copy kept to close both a horizontal and vertical
    /// reference simultaneously.
    VHGhost,
    /// Not a distributed copy at all (no coupling registered for it).
    None,
}

impl Priority {
    /// All priorities in descending authority order, for iteration in
    /// tests and diagnostics.
    pub const ALL: [Priority; 6] = [
        Priority::Master,
        Priority::Border,
        Priority::HGhost,
        Priority::VGhost,
        Priority::VHGhost,
        Priority::None,
    ];

    fn rank(self) -> u8 {
        match self {
            Priority::Master => 0,
            Priority::Border => 1,
            Priority::HGhost => 2,
            Priority::VGhost => 2,
            Priority::VHGhost => 2,
            Priority::None => 3,
        }
    }
}

/// Per-type collision resolution for incoming vs. existing priorities.
/// The type descriptor may override this (some entities, e.g. matrix
/// `Connection`s, always prefer the side attached to the higher-priority
/// vector rather than following the generic rank), so it is a trait rather
/// than a free function: `XferEnd` always calls through
/// `TypeDescriptor::priority_merge`, which defaults to
/// [`default_merge`].
pub fn default_merge(a: Priority, b: Priority) -> Priority {
    if a.rank() <= b.rank() {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn master_always_wins() {
        for p in Priority::ALL {
            assert_eq!(default_merge(Priority::Master, p), Priority::Master);
            assert_eq!(default_merge(p, Priority::Master), Priority::Master);
        }
    }

    #[test]
    fn none_always_loses() {
        for p in Priority::ALL {
            assert_eq!(default_merge(Priority::None, p), p);
            assert_eq!(default_merge(p, Priority::None), p);
        }
    }

    #[test]
    fn border_beats_ghosts() {
        assert_eq!(default_merge(Priority::Border, Priority::HGhost), Priority::Border);
        assert_eq!(default_merge(Priority::VGhost, Priority::Border), Priority::Border);
    }

    #[test]
    fn merge_is_commutative() {
        for a in Priority::ALL {
            for b in Priority::ALL {
                assert_eq!(default_merge(a, b), default_merge(b, a));
            }
        }
    }
}
