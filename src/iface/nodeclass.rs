//! `SeedNodeClasses`/`PropagateNodeClasses` (spec §4.5): every node's
//! `class` field records how computationally important it is this step —
//! 3 for a node on a to-be-refined element, descending by one hop per
//! propagation round down to 0. `next_class` carries the same computation
//! one level finer, seeded from sons rather than the current level's
//! elements (the `nextNodeClass` analogue).

use crate::boundary::{BndP, BndS};
use crate::mesh::element::Element;

const MAX_CLASS: u8 = 3;

/// `SeedNodeClasses`: every corner of an element satisfying `is_seed`
/// (typically "has a mark", i.e. is about to be refined) gets class
/// `MAX_CLASS`; every other corner visited is left untouched so a later
/// call can still raise it via propagation.
pub fn seed_node_classes<B: BndP, S: BndS>(elements: &[Element<B, S>], is_seed: impl Fn(&Element<B, S>) -> bool) {
    for elem in elements {
        if !is_seed(elem) {
            continue;
        }
        for corner in &elem.borrow().corners {
            let mut c = corner.borrow_mut();
            if c.class < MAX_CLASS {
                c.class = MAX_CLASS;
            }
        }
    }
}

/// `PropagateNodeClasses`: one relaxation sweep — every corner of every
/// element that has at least one corner with a nonzero class pulls every
/// other corner of that element up to `max(0, class - 1)`, so importance
/// fades by one per element-hop. Call repeatedly (spec §4.5 doesn't bound
/// the sweep count explicitly; callers iterate until a pass makes no
/// change, mirroring the closure pass's own fixed-point style).
pub fn propagate_node_classes<B: BndP, S: BndS>(elements: &[Element<B, S>]) -> bool {
    let mut changed = false;
    for elem in elements {
        let e = elem.borrow();
        let max_in_elem = e.corners.iter().map(|n| n.borrow().class).max().unwrap_or(0);
        if max_in_elem == 0 {
            continue;
        }
        let propagated = max_in_elem - 1;
        for corner in &e.corners {
            let mut c = corner.borrow_mut();
            if c.class < propagated {
                c.class = propagated;
                changed = true;
            }
        }
    }
    changed
}

/// Runs [`propagate_node_classes`] to a fixed point, capped at
/// `MAX_CLASS` sweeps since importance can fall by at most one per sweep
/// from its maximum seed value.
pub fn propagate_node_classes_to_fixed_point<B: BndP, S: BndS>(elements: &[Element<B, S>]) {
    for _ in 0..MAX_CLASS {
        if !propagate_node_classes(elements) {
            break;
        }
    }
}

/// Commits this step's `class` into `next_class` on every corner of
/// `elements`, the seed for the next-finer level's own seeding pass.
pub fn commit_next_class<B: BndP, S: BndS>(elements: &[Element<B, S>]) {
    for elem in elements {
        for corner in &elem.borrow().corners {
            let mut c = corner.borrow_mut();
            c.next_class = c.class;
        }
    }
}
