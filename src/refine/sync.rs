//! `XFERGATHER`/`XFERSCATTER` for `Element` (spec §4.6): the one concrete
//! gather/scatter pair this crate ships, bridging C4's gid-and-bytes world
//! back to a live `Element<B, S>` on the receiving processor.
//!
//! Gathering turns an element's father gid and corner (gid, global
//! coordinate) pairs into wire bytes attached via `XferAddData`; scattering
//! reads them back, reusing any corner already known to this processor
//! (via [`crate::context::EntityIndex`]) and creating a fresh corner node
//! otherwise, then links the reconstructed element into its father's ghost
//! son chain.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::boundary::BndDomain;
use crate::context::{DddContext, EntityRef};
use crate::error::MeshError;
use crate::header::{Attr, ObjHeader};
use crate::ids::{Gid, ObjType};
use crate::mesh::construct;
use crate::mesh::element::{Element, ElementShape, ElementVariant};
use crate::mesh::node::{new_node, Node, NodeFather, NodeType};
use crate::mesh::vertex::{new_vertex, VertexVariant};
use crate::priority::Priority;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum WireShape {
    Triangle,
    Quad,
    Tetra,
    Pyramid,
    Prism,
    Hex,
}

impl From<ElementShape> for WireShape {
    fn from(s: ElementShape) -> Self {
        match s {
            ElementShape::Triangle => WireShape::Triangle,
            ElementShape::Quad => WireShape::Quad,
            ElementShape::Tetra => WireShape::Tetra,
            ElementShape::Pyramid => WireShape::Pyramid,
            ElementShape::Prism => WireShape::Prism,
            ElementShape::Hex => WireShape::Hex,
        }
    }
}

impl From<WireShape> for ElementShape {
    fn from(s: WireShape) -> Self {
        match s {
            WireShape::Triangle => ElementShape::Triangle,
            WireShape::Quad => ElementShape::Quad,
            WireShape::Tetra => ElementShape::Tetra,
            WireShape::Pyramid => ElementShape::Pyramid,
            WireShape::Prism => ElementShape::Prism,
            WireShape::Hex => ElementShape::Hex,
        }
    }
}

/// The gathered shape of one element (spec §4.6 `XFERGATHER`): shape tag,
/// father gid (if any — ghost copies of level-0 elements have none), and
/// every corner's gid plus global coordinates so the receiver can either
/// reuse an already-known corner node or build a fresh one.
#[derive(Serialize, Deserialize)]
pub struct ElementWire {
    pub shape: WireShape,
    pub father: Option<Gid>,
    pub corners: Vec<(Gid, [f64; 3])>,
}

/// `XFERGATHER`: snapshot an element's topology for the wire.
pub fn gather<B: crate::boundary::BndP, S: crate::boundary::BndS>(elem: &Element<B, S>) -> ElementWire {
    let e = elem.borrow();
    let father = e.father.as_ref().and_then(|w| w.upgrade()).map(|f| f.borrow().header.gid);
    let corners = e
        .corners
        .iter()
        .map(|c| (c.borrow().header.gid, c.borrow().vertex.borrow().global))
        .collect();
    ElementWire { shape: e.shape.into(), father, corners }
}

/// `XFERSCATTER`: reconstruct a ghost element from a gathered wire payload.
/// Corners already present in `ctx.index` (e.g. shared with a master
/// element this processor already holds) are reused rather than
/// duplicated; new ones are created as plain corner nodes, boundary
/// re-evaluation is not attempted for ghost copies since they never drive
/// refinement themselves.
pub fn scatter<Dom: BndDomain>(
    ctx: &mut DddContext<Dom>,
    wire: &ElementWire,
    gid: Gid,
    priority: Priority,
) -> Result<Element<Dom::BndP, Dom::BndS>, MeshError> {
    let mut corners: Vec<Node<Dom::BndP, Dom::BndS>> = Vec::with_capacity(wire.corners.len());
    for &(cgid, global) in &wire.corners {
        let node = match ctx.index.node(cgid) {
            Some(n) => n.clone(),
            None => {
                let vheader = ObjHeader::new(cgid, ObjType(0), Attr::default(), priority);
                let vertex = new_vertex(vheader, global, global, VertexVariant::Inner);
                let nheader = ObjHeader::new(cgid, ObjType(0), Attr::default(), priority);
                let node = new_node(nheader, vertex, NodeFather::None, NodeType::Corner);
                ctx.index.insert(cgid, EntityRef::Node(node.clone()));
                node
            }
        };
        corners.push(node);
    }

    let mut edges = Vec::with_capacity(corners.len());
    for i in 0..corners.len() {
        let a = corners[i].clone();
        let b = corners[(i + 1) % corners.len()].clone();
        let egid = ctx.alloc_gid();
        edges.push(construct::create_edge(egid, &a, &b, priority));
    }

    let shape: ElementShape = wire.shape.into();
    let element = construct::create_element(gid, shape, corners, edges, ElementVariant::Inner, priority)?;

    if let Some(fgid) = wire.father {
        if let Some(father) = ctx.index.element(fgid) {
            element.borrow_mut().father = Some(Rc::downgrade(father));
            father.borrow_mut().sons.ghost.push(element.clone());
        }
    }

    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BndP, BndS, Movability};
    use crate::ids::ProcId;
    use crate::mesh::node::{new_node as mk_node, NodeFather as NF, NodeType as NT};
    use crate::mesh::vertex::{new_vertex as mk_vertex, VertexVariant as VV};
    use crate::options::Options;

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

    fn corner(ctx: &mut DddContext<FlatDomain>, global: [f64; 3]) -> Node<NoBndp, NoBnds> {
        let vgid = ctx.alloc_gid();
        let vheader = ObjHeader::new(vgid, ObjType(0), Attr::default(), Priority::Master);
        let vertex = mk_vertex(vheader, global, global, VV::Inner);
        let ngid = ctx.alloc_gid();
        let nheader = ObjHeader::new(ngid, ObjType(0), Attr::default(), Priority::Master);
        mk_node(nheader, vertex, NF::None, NT::Corner)
    }

    #[test]
    fn gather_then_scatter_reproduces_corner_coordinates() {
        let mut ctx = DddContext::new(ProcId(0), FlatDomain, Options::default());
        let a = corner(&mut ctx, [0.0, 0.0, 0.0]);
        let b = corner(&mut ctx, [1.0, 0.0, 0.0]);
        let c = corner(&mut ctx, [0.0, 1.0, 0.0]);
        let e_ab = construct::create_edge(ctx.alloc_gid(), &a, &b, Priority::Master);
        let e_bc = construct::create_edge(ctx.alloc_gid(), &b, &c, Priority::Master);
        let e_ca = construct::create_edge(ctx.alloc_gid(), &c, &a, Priority::Master);
        let gid = ctx.alloc_gid();
        let elem = construct::create_element(
            gid,
            ElementShape::Triangle,
            vec![a, b, c],
            vec![e_ab, e_bc, e_ca],
            ElementVariant::Inner,
            Priority::Master,
        )
        .unwrap();

        let wire = gather(&elem);
        assert_eq!(wire.corners.len(), 3);

        let mut ghost_ctx = DddContext::new(ProcId(1), FlatDomain, Options::default());
        let ghost_gid = Gid(999);
        let ghost = scatter(&mut ghost_ctx, &wire, ghost_gid, Priority::HGhost).unwrap();
        assert_eq!(ghost.borrow().corners.len(), 3);
        assert_eq!(ghost.borrow().corners[0].borrow().vertex.borrow().global, [0.0, 0.0, 0.0]);
    }
}
