//! Node entity (spec §3.1): owns exactly one vertex, links into an edge
//! "ring" of neighbours, and has a father that is itself a node, edge, or
//! element depending on how it was created.

use std::rc::Rc;

use crate::boundary::{BndP, BndS};
use crate::header::ObjHeader;
use crate::mesh::edge::{Edge, EdgeInner};
use crate::mesh::element::ElementInner;
use crate::mesh::vertex::Vertex;
use crate::mesh::{Ref, WeakRef};

/// Spec §3.1: "node-type ∈ {corner, mid, side, center, level-0}".
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NodeType {
    Corner,
    Mid,
    Side,
    Center,
    Level0,
}

/// Spec §3.1: "father (node on coarser level, or edge if midnode, or
/// element if center node)". A level-0 node has no father at all.
pub enum NodeFather<B: BndP, S: BndS> {
    None,
    Node(WeakRef<NodeInner<B, S>>),
    Edge(WeakRef<EdgeInner<B, S>>),
    Element(WeakRef<ElementInner<B, S>>),
}

pub struct NodeInner<B: BndP, S: BndS> {
    pub header: ObjHeader,
    pub vertex: Vertex<B, S>,
    pub father: NodeFather<B, S>,
    pub son: Option<WeakRef<NodeInner<B, S>>>,
    /// Edges incident to this node; the generalization of the original's
    /// per-endpoint link-ring half-link chain (spec §3.2).
    pub ring: Vec<WeakRef<EdgeInner<B, S>>>,
    pub subdomain: u16,
    /// Computational-importance class in `{0..3}` (spec §4.5).
    pub class: u8,
    /// Analogous class propagated for the next-finer level (spec §4.5).
    pub next_class: u8,
    pub node_type: NodeType,
}

pub type Node<B, S> = Ref<NodeInner<B, S>>;

impl<B: BndP, S: BndS> NodeInner<B, S> {
    pub fn ring_push(&mut self, edge: WeakRef<EdgeInner<B, S>>) {
        self.ring.push(edge);
    }

    pub fn ring_remove(&mut self, edge: &Edge<B, S>) {
        self.ring.retain(|w| match w.upgrade() {
            Some(r) => !Rc::ptr_eq(&r, edge),
            None => false,
        });
    }
}

pub fn new_node<B: BndP, S: BndS>(
    header: ObjHeader,
    vertex: Vertex<B, S>,
    father: NodeFather<B, S>,
    node_type: NodeType,
) -> Node<B, S> {
    vertex.borrow_mut().no_of_node += 1;
    Rc::new(std::cell::RefCell::new(NodeInner {
        header,
        vertex,
        father,
        son: None,
        ring: Vec::new(),
        subdomain: 0,
        class: 0,
        next_class: 0,
        node_type,
    }))
}
