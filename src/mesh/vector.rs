//! Algebraic vector/matrix entities (spec §3.1): a `Vector` is a generic
//! unknown attached to a node/edge/side/element; a `Connection` is a
//! directed matrix entry between two vectors, whose adjoint lives adjacent
//! in memory in the original and is modeled here as an explicit back-link.

use std::rc::Rc;

use crate::boundary::{BndP, BndS};
use crate::header::ObjHeader;
use crate::mesh::{Ref, WeakRef};

/// What kind of geometric entity a [`Vector`] is attached to (spec §3.1:
/// "attached to a node/edge/side/element").
pub enum VectorOwner<B: BndP, S: BndS> {
    Node(WeakRef<crate::mesh::node::NodeInner<B, S>>),
    Edge(WeakRef<crate::mesh::edge::EdgeInner<B, S>>),
    Element(WeakRef<crate::mesh::element::ElementInner<B, S>>),
}

pub struct VectorInner<B: BndP, S: BndS> {
    pub header: ObjHeader,
    pub owner: VectorOwner<B, S>,
    pub matrix: Vec<Connection<B, S>>,
}

pub type Vector<B, S> = Ref<VectorInner<B, S>>;

/// A directed matrix entry between two vectors. `diag` marks a self-entry
/// (from+to the same vector); `offset` records which half of an
/// adjoint-entry pair this is, mirroring the original's packed
/// representation (spec §3.1) without needing the actual adjacent-memory
/// layout trick in Rust — the adjoint is just another `Connection` linked
/// back via `adjoint`.
pub struct Connection<B: BndP, S: BndS> {
    pub from: WeakRef<VectorInner<B, S>>,
    pub to: WeakRef<VectorInner<B, S>>,
    pub diag: bool,
    pub offset: bool,
    pub adjoint: Option<Box<Connection<B, S>>>,
    pub value: f64,
}

impl<B: BndP, S: BndS> Connection<B, S> {
    pub fn is_diag(&self) -> bool {
        self.diag
    }
}

pub fn new_vector<B: BndP, S: BndS>(header: ObjHeader, owner: VectorOwner<B, S>) -> Vector<B, S> {
    Rc::new(std::cell::RefCell::new(VectorInner {
        header,
        owner,
        matrix: Vec::new(),
    }))
}
