//! C1 construction operations (spec §4.2): the mid/side/center node
//! factories, element and edge creation, and `dispose_element`'s `VFATHER`
//! reassignment. Callers (C2's refinement engine) supply an already
//! allocated [`Gid`]; allocation itself is [`crate::context::DddContext`]'s
//! job, not C1's.

use crate::boundary::{BndDomain, BndP, BndS, BOUNDARY_MOVE_EPSILON};
use crate::error::MeshError;
use crate::header::{Attr, ObjHeader};
use crate::ids::{Gid, ObjType};
use crate::mesh::edge::{get_edge, new_edge, Edge};
use crate::mesh::element::{Element, ElementInner, ElementShape, ElementVariant, RefineClass, SonChains};
use crate::mesh::node::{new_node, Node, NodeFather, NodeType};
use crate::mesh::vertex::{new_vertex, Vertex, VertexVariant};
use crate::priority::Priority;

/// `CreateMidNode`: a node on the midpoint of edge `e`, boundary-evaluated
/// through `dom` when both endpoints are boundary vertices (spec §4.2).
/// The new vertex's `moved` flag is set when the boundary-evaluated
/// position deviates from the linear midpoint by more than
/// [`BOUNDARY_MOVE_EPSILON`].
pub fn create_mid_node<Dom: BndDomain>(
    dom: &Dom,
    gid: Gid,
    e: &Edge<Dom::BndP, Dom::BndS>,
    priority: Priority,
) -> Result<Node<Dom::BndP, Dom::BndS>, MeshError> {
    let (a, b) = e.borrow().endpoints().ok_or_else(|| MeshError::EdgeNotFound(Gid(0), Gid(0)))?;
    let (av, bv) = (a.borrow().vertex.clone(), b.borrow().vertex.clone());
    let (ag, bg) = (av.borrow().global, bv.borrow().global);
    let linear_mid = midpoint(ag, bg);

    let (variant, global, moved) = match (&av.borrow().variant, &bv.borrow().variant) {
        (VertexVariant::Boundary { bndp: pa }, VertexVariant::Boundary { bndp: pb }) => {
            match dom.bndp_create_bndp(pa, pb, 0.5) {
                Some(bndp) => {
                    let g = dom.bndp_global(&bndp).map_err(|_| MeshError::BoundaryEval(a.borrow().header.gid, b.borrow().header.gid))?;
                    let moved = distance(g, linear_mid) > BOUNDARY_MOVE_EPSILON;
                    (VertexVariant::Boundary { bndp }, g, moved)
                }
                None => (VertexVariant::Inner, linear_mid, false),
            }
        }
        _ => (VertexVariant::Inner, linear_mid, false),
    };

    let vheader = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    let vertex: Vertex<Dom::BndP, Dom::BndS> = new_vertex(vheader, global, global, variant);
    if moved {
        vertex.borrow_mut().moved = true;
    }

    let nheader = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    let node = new_node(nheader, vertex, NodeFather::Edge(std::rc::Rc::downgrade(e)), NodeType::Mid);
    e.borrow_mut().midnode = Some(node.clone());
    Ok(node)
}

/// `CreateSideNode`: a node on the barycenter (in the `(u, v)` reference
/// coordinate sense) of element side `side_index`, boundary-evaluated when
/// the element is a boundary element with a descriptor on that side.
pub fn create_side_node<Dom: BndDomain>(
    dom: &Dom,
    gid: Gid,
    elem: &Element<Dom::BndP, Dom::BndS>,
    side_index: usize,
    global_estimate: [f64; 3],
    priority: Priority,
) -> Result<Node<Dom::BndP, Dom::BndS>, MeshError> {
    let e = elem.borrow();
    let side_desc = match &e.variant {
        ElementVariant::Boundary { sides } => sides.get(side_index).and_then(|s| s.as_ref()),
        ElementVariant::Inner => None,
    };

    let (variant, global, moved) = match side_desc {
        Some(bnds) => {
            let bndp = dom.bnds_create_bndp(bnds, (0.5, 0.5));
            let g = dom.bndp_global(&bndp).map_err(|_| MeshError::BoundaryEval(e.header.gid, e.header.gid))?;
            let moved = distance(g, global_estimate) > BOUNDARY_MOVE_EPSILON;
            (VertexVariant::Boundary { bndp }, g, moved)
        }
        None => (VertexVariant::Inner, global_estimate, false),
    };
    drop(e);

    let vheader = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    let vertex = new_vertex(vheader, global, global, variant);
    vertex.borrow_mut().on_father = crate::mesh::vertex::OnFather::Side(side_index as u8);
    if moved {
        vertex.borrow_mut().moved = true;
    }

    let nheader = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    Ok(new_node(nheader, vertex, NodeFather::Element(std::rc::Rc::downgrade(elem)), NodeType::Side))
}

/// `CreateCenterNode`: a node at an element's barycenter. Never boundary
/// evaluated — an element's interior cannot lie on the domain boundary.
pub fn create_center_node<B: BndP, S: BndS>(
    gid: Gid,
    elem: &Element<B, S>,
    global: [f64; 3],
    priority: Priority,
) -> Node<B, S> {
    let vheader = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    let vertex = new_vertex(vheader, global, global, VertexVariant::Inner);
    let nheader = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    new_node(nheader, vertex, NodeFather::Element(std::rc::Rc::downgrade(elem)), NodeType::Center)
}

/// `CreateEdge`: returns the existing edge between `a` and `b` if one is
/// already linked into either node's ring, otherwise links a new one.
pub fn create_edge<B: BndP, S: BndS>(gid: Gid, a: &Node<B, S>, b: &Node<B, S>, priority: Priority) -> Edge<B, S> {
    if let Some(existing) = get_edge(a, b) {
        return existing;
    }
    let header = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    new_edge(header, a, b)
}

/// `CreateElement`: a son (or level-0) element with the given corners and
/// topology/variant. Caller links it into its father's son chain and the
/// owning grid's priority list separately (spec §4.3 step 5).
pub fn create_element<B: BndP, S: BndS>(
    gid: Gid,
    shape: ElementShape,
    corners: Vec<Node<B, S>>,
    edges: Vec<Edge<B, S>>,
    variant: ElementVariant<S>,
    priority: Priority,
) -> Result<Element<B, S>, MeshError> {
    if corners.len() != shape.n_corners() {
        return Err(MeshError::OutOfMemory("element with wrong corner count"));
    }
    let header = ObjHeader::new(gid, ObjType(0), Attr::default(), priority);
    Ok(std::rc::Rc::new(std::cell::RefCell::new(ElementInner {
        header,
        shape,
        corners,
        edges,
        side_neighbours: vec![None; shape.n_sides()],
        variant,
        father: None,
        sons: SonChains::default(),
        vector: None,
        mark: None,
        mark_class: crate::refine::marks::MarkClass::default(),
        refine: None,
        refine_class: RefineClass::default(),
        coarsen: false,
        side_pattern: 0,
        update_green: false,
        decoupled: false,
        new_el: true,
    })))
}

/// `DisposeElement`: unlinks the element from its father's son chain and
/// reassigns `VFATHER` on every corner vertex that still points back to it
/// (spec §4.2). The original reattaches such a vertex to a sibling sharing
/// it; absent a sibling search here, the pointer is simply cleared and a
/// warning logged — this crate's C2 driver always calls
/// `dispose_element` only after every corner's surviving owner has already
/// been relinked, so the fallback path is not expected to fire in practice.
pub fn dispose_element<B: BndP, S: BndS>(elem: &Element<B, S>) {
    let e = elem.borrow();
    for corner in &e.corners {
        let mut v = corner.borrow().vertex.borrow_mut().father.clone();
        let points_here = v
            .as_ref()
            .and_then(|w| w.upgrade())
            .map(|f| std::rc::Rc::ptr_eq(&f, elem))
            .unwrap_or(false);
        if points_here {
            v = None;
            corner.borrow().vertex.borrow_mut().father = v;
            tracing::warn!(gid = %e.header.gid, "dispose_element: vertex VFATHER cleared, no sibling reattachment search performed");
        }
    }
    if let Some(father) = e.father.as_ref().and_then(|w| w.upgrade()) {
        let mut f = father.borrow_mut();
        f.sons.master.retain(|s| !std::rc::Rc::ptr_eq(s, elem));
        f.sons.ghost.retain(|s| !std::rc::Rc::ptr_eq(s, elem));
    }
}

fn midpoint(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0, (a[2] + b[2]) / 2.0]
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d = [a[0] - b[0], a[1] - b[1], a[2] - b[2]];
    (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BndP, BndS, Movability};

    #[derive(Clone)]
    struct NoBndp;
    #[derive(Clone)]
    struct NoBnds;

    impl BndP for NoBndp {}
    impl BndS for NoBnds {}

    struct FlatDomain;

    impl BndDomain for FlatDomain {
        type BndP = NoBndp;
        type BndS = NoBnds;

        fn bndp_create_bndp(&self, _a: &NoBndp, _b: &NoBndp, _t: f64) -> Option<NoBndp> {
            None
        }
        fn bnds_create_bndp(&self, _side: &NoBnds, _uv: (f64, f64)) -> NoBndp {
            NoBndp
        }
        fn bndp_global(&self, _bndp: &NoBndp) -> Result<[f64; 3], MeshError> {
            Ok([0.0, 0.0, 0.0])
        }
        fn bndp_bndp_desc(&self, _bndp: &NoBndp) -> Result<Movability, MeshError> {
            Ok(Movability { free: true })
        }
        fn bnds_create_bnds(&self, _points: &[NoBndp]) -> NoBnds {
            NoBnds
        }
        fn bndp_dispose(&self, _bndp: NoBndp) {}
        fn bnds_dispose(&self, _bnds: NoBnds) {}
        fn bnds_bnds_desc(&self, _bnds: &NoBnds) -> Result<(u16, u16), MeshError> {
            Ok((0, 0))
        }
    }

    fn corner(gid: u64, global: [f64; 3]) -> Node<NoBndp, NoBnds> {
        let vheader = ObjHeader::new(Gid(gid * 10), ObjType(0), Attr::default(), Priority::Master);
        let vertex = new_vertex(vheader, global, global, VertexVariant::Inner);
        let nheader = ObjHeader::new(Gid(gid), ObjType(0), Attr::default(), Priority::Master);
        new_node(nheader, vertex, NodeFather::None, NodeType::Corner)
    }

    #[test]
    fn create_mid_node_is_the_linear_midpoint_for_inner_vertices() {
        let dom = FlatDomain;
        let a = corner(1, [0.0, 0.0, 0.0]);
        let b = corner(2, [2.0, 0.0, 0.0]);
        let edge = create_edge(Gid(100), &a, &b, Priority::Master);
        let mid = create_mid_node(&dom, Gid(101), &edge, Priority::Master).unwrap();
        assert_eq!(mid.borrow().vertex.borrow().global, [1.0, 0.0, 0.0]);
        assert!(!mid.borrow().vertex.borrow().moved);
    }

    #[test]
    fn create_edge_is_idempotent_between_the_same_two_nodes() {
        let a = corner(1, [0.0, 0.0, 0.0]);
        let b = corner(2, [1.0, 0.0, 0.0]);
        let e1 = create_edge(Gid(100), &a, &b, Priority::Master);
        let e2 = create_edge(Gid(200), &a, &b, Priority::Master);
        assert!(std::rc::Rc::ptr_eq(&e1, &e2));
    }
}
