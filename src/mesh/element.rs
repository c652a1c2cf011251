//! Element entity (spec §3.1): tetra/pyramid/prism/hex in 3D, triangle/quad
//! in 2D, with corner and side-neighbour pointers, father/son linkage, and
//! the refinement bookkeeping fields C2 reads and writes.

use std::rc::{Rc, Weak};

use crate::boundary::{BndP, BndS};
use crate::header::ObjHeader;
use crate::mesh::edge::Edge;
use crate::mesh::node::Node;
use crate::mesh::vector::Vector;
use crate::mesh::{Ref, WeakRef};

// NOTE: `Node<B, S>` and `Edge<B, S>` both carry the element boundary-side
// parameter `S` even though nodes/edges never hold an `S`-typed value
// themselves — they point back to elements (via father/ring links) whose
// type does carry it, so the parameter has to be threaded through.

/// The element's corner-count/topology tag (spec §3.1).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ElementShape {
    Triangle,
    Quad,
    Tetra,
    Pyramid,
    Prism,
    Hex,
}

impl ElementShape {
    pub fn n_corners(self) -> usize {
        match self {
            ElementShape::Triangle => 3,
            ElementShape::Quad => 4,
            ElementShape::Tetra => 4,
            ElementShape::Pyramid => 5,
            ElementShape::Prism => 6,
            ElementShape::Hex => 8,
        }
    }

    pub fn n_sides(self) -> usize {
        match self {
            ElementShape::Triangle => 3,
            ElementShape::Quad => 4,
            ElementShape::Tetra => 4,
            ElementShape::Pyramid => 5,
            ElementShape::Prism => 5,
            ElementShape::Hex => 6,
        }
    }

    pub fn is_3d(self) -> bool {
        matches!(self, ElementShape::Tetra | ElementShape::Pyramid | ElementShape::Prism | ElementShape::Hex)
    }
}

/// "Refinement class / mark class" (glossary): rule family tag. Carried on
/// the element as `refine_class` (what it *was last refined with*) and
/// separately, in `crate::refine::marks`, as `mark_class` (what the
/// *pending* mark resolves to) — SPEC_FULL §3.1 calls out that these are
/// genuinely distinct fields, not one collapsed enum.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum RefineClass {
    #[default]
    Yellow,
    Green,
    Red,
}

/// In-place variant type (spec §9 design note): inner vs. boundary
/// element, sharing every other field. Boundary elements carry one
/// optional side descriptor per side.
pub enum ElementVariant<B: BndS> {
    Inner,
    Boundary { sides: Vec<Option<B>> },
}

/// One master son-chain and one ghost son-chain head, per spec §3.1
/// ("up to two son-chain heads (one for master sons, one for ghost
/// sons)").
#[derive(Default)]
pub struct SonChains<B: BndP, S: BndS> {
    pub master: Vec<Element<B, S>>,
    pub ghost: Vec<Element<B, S>>,
}

impl<B: BndP, S: BndS> SonChains<B, S> {
    pub fn len(&self) -> usize {
        self.master.len() + self.ghost.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Element<B, S>> {
        self.master.iter().chain(self.ghost.iter())
    }
}

pub struct ElementInner<B: BndP, S: BndS> {
    pub header: ObjHeader,
    pub shape: ElementShape,
    pub corners: Vec<Node<B, S>>,
    pub edges: Vec<Edge<B, S>>,
    /// Neighbour across each side, if any (boundary sides have none).
    pub side_neighbours: Vec<Option<WeakRef<ElementInner<B, S>>>>,
    pub variant: ElementVariant<S>,
    pub father: Option<WeakRef<ElementInner<B, S>>>,
    pub sons: SonChains<B, S>,
    pub vector: Option<Vector<B, S>>,

    // --- C2 refinement bookkeeping (spec §4.3, SPEC_FULL §3.1) ---
    pub mark: Option<crate::refine::rules::RuleId>,
    pub mark_class: crate::refine::marks::MarkClass,
    pub refine: Option<crate::refine::rules::RuleId>,
    pub refine_class: RefineClass,
    pub coarsen: bool,
    pub side_pattern: u32,
    pub update_green: bool,
    pub decoupled: bool,
    pub new_el: bool,
}

pub type Element<B, S> = Ref<ElementInner<B, S>>;

impl<B: BndP, S: BndS> ElementInner<B, S> {
    pub fn is_boundary(&self) -> bool {
        matches!(self.variant, ElementVariant::Boundary { .. })
    }

    pub fn nsons(&self) -> usize {
        self.sons.len()
    }

    /// `CheckOrientation`: Open Question (b) in DESIGN.md — the original
    /// returns "ok" unchecked for 3D cells with 5, 6, or 8 corners ("marked
    /// as a TODO in source"); this preserves that behaviour rather than
    /// inventing a geometric check the source itself never had.
    pub fn check_orientation(&self) -> bool {
        match self.shape {
            ElementShape::Pyramid | ElementShape::Prism | ElementShape::Hex => true,
            ElementShape::Tetra => {
                // Only the 4-corner 3D case is actually checked: corners
                // must form a positively-oriented tetrahedron.
                if self.corners.len() != 4 {
                    return true;
                }
                let p: Vec<[f64; 3]> = self
                    .corners
                    .iter()
                    .map(|n| n.borrow().vertex.borrow().global)
                    .collect();
                let sub = |a: [f64; 3], b: [f64; 3]| [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
                let cross = |a: [f64; 3], b: [f64; 3]| {
                    [
                        a[1] * b[2] - a[2] * b[1],
                        a[2] * b[0] - a[0] * b[2],
                        a[0] * b[1] - a[1] * b[0],
                    ]
                };
                let dot = |a: [f64; 3], b: [f64; 3]| a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
                let e1 = sub(p[1], p[0]);
                let e2 = sub(p[2], p[0]);
                let e3 = sub(p[3], p[0]);
                dot(cross(e1, e2), e3) > 0.0
            }
            ElementShape::Triangle | ElementShape::Quad => true,
        }
    }
}

pub fn downgrade<B: BndP, S: BndS>(e: &Element<B, S>) -> Weak<std::cell::RefCell<ElementInner<B, S>>> {
    Rc::downgrade(e)
}
