//! Vertex entity (spec §3.1): inner/boundary variants, local coords inside
//! the father element, reference-counted by the nodes that use it.

use std::rc::{Rc, Weak};

use crate::boundary::{BndP, BndS};
use crate::header::ObjHeader;
use crate::mesh::element::ElementInner;
use crate::mesh::{Ref, WeakRef};

/// Which side of the father element the vertex was created on, if any
/// (spec §3.1 "on-edge/on-side tag").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OnFather {
    None,
    Edge(u8),
    Side(u8),
}

/// Inner vs. boundary vertex, the "in-place variant types" design note
/// (spec §9): both carry the same fields except boundary vertices also
/// carry a boundary-point descriptor. Modeled as an enum rather than two
/// structs sharing a header offset, since Rust has no struct layout trick
/// to exploit there and an enum keeps the header position irrelevant to
/// callers.
pub enum VertexVariant<B: BndP> {
    Inner,
    Boundary { bndp: B },
}

pub struct VertexInner<B: BndP, S: BndS> {
    pub header: ObjHeader,
    pub global: [f64; 3],
    pub local: [f64; 3],
    pub father: Option<WeakRef<ElementInner<B, S>>>,
    pub on_father: OnFather,
    /// Set when a boundary-evaluated position deviates from the linear
    /// interpolation of its generating points by more than
    /// [`crate::boundary::BOUNDARY_MOVE_EPSILON`] (spec §4.2).
    pub moved: bool,
    pub variant: VertexVariant<B>,
    /// Reference count of nodes using this vertex (spec §3.2); the vertex
    /// is disposed when this reaches zero.
    pub no_of_node: u32,
}

pub type Vertex<B, S> = Ref<VertexInner<B, S>>;

impl<B: BndP, S: BndS> VertexInner<B, S> {
    pub fn is_boundary(&self) -> bool {
        matches!(self.variant, VertexVariant::Boundary { .. })
    }
}

/// Construct a fresh, unshared vertex (`no_of_node == 0`); callers
/// increment it when a [`crate::mesh::node::Node`] starts referencing it.
pub fn new_vertex<B: BndP, S: BndS>(
    header: ObjHeader,
    global: [f64; 3],
    local: [f64; 3],
    variant: VertexVariant<B>,
) -> Vertex<B, S> {
    Rc::new(std::cell::RefCell::new(VertexInner {
        header,
        global,
        local,
        father: None,
        on_father: OnFather::None,
        moved: false,
        variant,
        no_of_node: 0,
    }))
}

pub fn downgrade<B: BndP, S: BndS>(v: &Vertex<B, S>) -> Weak<std::cell::RefCell<VertexInner<B, S>>> {
    Rc::downgrade(v)
}
