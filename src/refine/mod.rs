//! C2: the adaptive refinement engine (spec §4.3) — mark intake, closure,
//! rule selection, context gathering, son construction, parallel son
//! placement, the coarsen pass, and finalize, run as one bulk-synchronous
//! local step per [`crate::context::DddContext::xfer_end`] round (spec §5:
//! "suspension only inside collective communication").

pub mod marks;
pub mod rules;
pub mod sync;

use std::rc::Rc;

use crate::boundary::BndDomain;
use crate::context::{DddContext, EntityRef};
use crate::error::RefineError;
use crate::header::{Attr, ObjHeader};
use crate::ids::{Level, OBJTYPE_ELEMENT};
use crate::mesh::construct;
use crate::mesh::element::{Element, ElementVariant};
use crate::priority::Priority;
use marks::MarkClass;
use rules::{select_rule, SonCorner};

/// Per-adapt-step counters (spec §8 scenario 6, "refine info accounting"):
/// how many elements were touched by each phase, for tests to assert on
/// without reaching into the grid lists themselves.
#[derive(Default, Debug, Clone, Copy)]
pub struct RefineInfo {
    pub n_marked: usize,
    pub n_refined: usize,
    pub n_coarsened: usize,
    pub closure_sweeps: u32,
}

const MAX_CLOSURE_SWEEPS: u32 = 8;

/// Run one adapt step over `level`'s elements. Marks are assumed to have
/// already been queued via [`marks::mark_element`]; this drives the
/// remaining seven steps against whatever is currently marked.
pub fn adapt<Dom: BndDomain>(ctx: &mut DddContext<Dom>, level: Level) -> Result<RefineInfo, RefineError> {
    let span = tracing::info_span!("adapt", level);
    let _guard = span.enter();
    let mut info = RefineInfo::default();

    // --- step 1: mark intake ---
    let elements: Vec<Element<Dom::BndP, Dom::BndS>> = match ctx.multigrid.level(level) {
        Some(grid) => grid.elements.iter().cloned().collect(),
        None => Vec::new(),
    };
    info.n_marked = elements.iter().filter(|e| e.borrow().mark.is_some() || e.borrow().coarsen).count();
    if elements.is_empty() {
        return Ok(info);
    }

    // --- step 2: closure ---
    info.closure_sweeps = run_closure(&elements)?;

    // --- step 3: rule selection ---
    for e in &elements {
        let (shape, mark_class, side_pattern, gid) = {
            let b = e.borrow();
            (b.shape, b.mark_class, b.side_pattern, b.header.gid)
        };
        if mark_class == MarkClass::NoClass && side_pattern == 0 {
            continue;
        }
        let rule = select_rule(shape, mark_class, side_pattern)
            .ok_or(RefineError::NoMatchingRule { elem: gid, mark_class, side_pattern })?;
        e.borrow_mut().refine = Some(rule.id);
    }

    // --- step 4: context gathering ---
    // Everything son construction needs (father shape/corners/edges, the
    // selected rule, the boundary collaborator) is already reachable off
    // `ctx` and the father element itself; there is no separate gather
    // buffer to build in this port (spec Open Question, DESIGN.md).

    // --- step 5: son construction ---
    for e in &elements {
        let (needs_sons, already_built) = {
            let b = e.borrow();
            (b.refine.is_some(), b.sons.len() > 0)
        };
        if !needs_sons {
            continue;
        }
        if already_built {
            if e.borrow().update_green {
                tracing::warn!(gid = %e.borrow().header.gid, "closure changed an already-refined element's side pattern; son rebuild-on-green-update is not implemented, keeping existing sons");
            }
            continue;
        }
        construct_sons(ctx, e, level)?;
        info.n_refined += 1;
    }

    // --- step 6: parallel son placement ---
    place_sons_for_ghosts(ctx, &elements);

    // --- step 7: coarsen pass ---
    // A `Coarsen` mark is placed on a son (spec §4.3: "cannot coarsen an
    // element with no father" — only a son can be coarsened back into its
    // father), so this pass looks one level finer for marked sons and acts
    // on their (this level's) fathers; partial coarsening is not
    // representable here, so any marked son collapses every sibling too.
    if let Some(finer) = ctx.multigrid.level(level + 1) {
        let sons: Vec<Element<Dom::BndP, Dom::BndS>> = finer.elements.iter().cloned().collect();
        let mut fathers: Vec<Element<Dom::BndP, Dom::BndS>> = Vec::new();
        for son in &sons {
            if !son.borrow().coarsen {
                continue;
            }
            if let Some(father) = son.borrow().father.as_ref().and_then(|w| w.upgrade()) {
                if !fathers.iter().any(|f| Rc::ptr_eq(f, &father)) {
                    fathers.push(father);
                }
            }
        }
        for father in &fathers {
            coarsen_element(father);
            info.n_coarsened += 1;
        }
    }

    // --- step 8: finalize ---
    finalize(ctx, level, &elements);

    Ok(info)
}

/// Fixed-point closure sweep: any element with a pending mark forces its
/// face neighbours that are otherwise unmarked into an irregular (green)
/// side pattern, so the mesh never carries a hanging node the neighbour
/// doesn't know about (spec §4.3 step 2). Bounded at
/// [`MAX_CLOSURE_SWEEPS`]; a mesh that hasn't stabilized by then fails
/// closed rather than looping forever.
fn run_closure<B: crate::boundary::BndP, S: crate::boundary::BndS>(elements: &[Element<B, S>]) -> Result<u32, RefineError> {
    for sweep in 0..MAX_CLOSURE_SWEEPS {
        let mut changed = false;
        for e in elements {
            let (needs_refine, neighbours) = {
                let b = e.borrow();
                let needs = b.mark_class != MarkClass::NoClass;
                let neighbours: Vec<_> = b.side_neighbours.iter().filter_map(|n| n.as_ref().and_then(|w| w.upgrade())).collect();
                (needs, neighbours)
            };
            if !needs_refine {
                continue;
            }
            for neighbour in neighbours {
                let mut nb = neighbour.borrow_mut();
                if nb.mark_class == MarkClass::NoClass && nb.side_pattern == 0 {
                    nb.side_pattern = 1;
                    nb.update_green = true;
                    changed = true;
                }
            }
        }
        if !changed {
            return Ok(sweep);
        }
    }
    Err(RefineError::ClosureDidNotConverge(MAX_CLOSURE_SWEEPS))
}

fn barycenter<B: crate::boundary::BndP, S: crate::boundary::BndS>(elem: &Element<B, S>) -> [f64; 3] {
    let e = elem.borrow();
    let n = e.corners.len().max(1) as f64;
    let mut sum = [0.0, 0.0, 0.0];
    for c in &e.corners {
        let g = c.borrow().vertex.borrow().global;
        sum[0] += g[0];
        sum[1] += g[1];
        sum[2] += g[2];
    }
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

/// Son construction (spec §4.3 step 5): resolve every [`SonCorner`] the
/// selected rule names into an actual corner/mid/side/center node, link the
/// resulting element into the father's son chain and the next-finer grid
/// list, and register it with the context so C3/C4 can address it by gid.
fn construct_sons<Dom: BndDomain>(
    ctx: &mut DddContext<Dom>,
    father: &Element<Dom::BndP, Dom::BndS>,
    level: Level,
) -> Result<(), RefineError> {
    let (shape, mark_class, side_pattern, priority, father_gid, subdomain) = {
        let b = father.borrow();
        (b.shape, b.mark_class, b.side_pattern, b.header.priority, b.header.gid, b.header.attr.subdomain)
    };
    let rule = select_rule(shape, mark_class, side_pattern)
        .ok_or(RefineError::NoMatchingRule { elem: father_gid, mark_class, side_pattern })?;
    let global_estimate = barycenter(father);

    let mut sons = Vec::with_capacity(rule.sons.len());
    for sonspec in &rule.sons {
        let mut corners = Vec::with_capacity(sonspec.corners.len());
        for sc in &sonspec.corners {
            let node = match *sc {
                SonCorner::FatherCorner(i) => father.borrow().corners[i as usize].clone(),
                SonCorner::EdgeMidNode(i) => {
                    let edge = father.borrow().edges[i as usize].clone();
                    let existing = edge.borrow().midnode.clone();
                    match existing {
                        Some(mid) => mid,
                        None => {
                            let gid = ctx.alloc_gid();
                            construct::create_mid_node(&ctx.domain, gid, &edge, priority)
                                .map_err(|_| RefineError::SonConstructionOom(father_gid))?
                        }
                    }
                }
                SonCorner::SideNode(i) => {
                    let gid = ctx.alloc_gid();
                    construct::create_side_node(&ctx.domain, gid, father, i as usize, global_estimate, priority)
                        .map_err(|_| RefineError::SonConstructionOom(father_gid))?
                }
                SonCorner::CenterNode => {
                    let gid = ctx.alloc_gid();
                    construct::create_center_node(gid, father, global_estimate, priority)
                }
            };
            corners.push(node);
        }

        let mut edges = Vec::with_capacity(corners.len());
        for i in 0..corners.len() {
            let a = corners[i].clone();
            let b = corners[(i + 1) % corners.len()].clone();
            let gid = ctx.alloc_gid();
            edges.push(construct::create_edge(gid, &a, &b, priority));
        }

        let gid = ctx.alloc_gid();
        let son = construct::create_element(gid, sonspec.shape, corners, edges, ElementVariant::Inner, priority)
            .map_err(|_| RefineError::SonConstructionOom(father_gid))?;
        son.borrow_mut().father = Some(Rc::downgrade(father));

        let table_header = ObjHeader::new(gid, OBJTYPE_ELEMENT, Attr { level: level + 1, subdomain }, priority);
        ctx.register_local(table_header, EntityRef::Element(son.clone()));
        sons.push(son);
    }

    father.borrow_mut().sons.master.extend(sons.iter().cloned());
    let grid = ctx.multigrid.ensure_level(level + 1);
    for son in sons {
        grid.elements.insert(priority, son);
    }
    Ok(())
}

/// Parallel son placement (spec §4.3 step 6): a father held at `Master`
/// priority queues `XferCopyObj` for each of its sons to every processor
/// already coupled to the father, at ghost priority — ghost copies track
/// their master's refinement rather than being refined independently.
fn place_sons_for_ghosts<Dom: BndDomain>(ctx: &mut DddContext<Dom>, elements: &[Element<Dom::BndP, Dom::BndS>]) {
    let mut to_send: Vec<(crate::ids::Gid, crate::ids::ProcId)> = Vec::new();
    for e in elements {
        let (father_gid, is_new_son_owner) = {
            let b = e.borrow();
            (b.header.gid, !b.sons.master.is_empty())
        };
        if !is_new_son_owner {
            continue;
        }
        let header = match ctx.objtable.get(father_gid) {
            Some(h) => h,
            None => continue,
        };
        if header.priority != Priority::Master || header.couplings.is_empty() {
            continue;
        }
        let peers: Vec<_> = header.couplings.iter().map(|(p, _)| p).collect();
        for son in &e.borrow().sons.master {
            if !son.borrow().new_el {
                continue;
            }
            let son_gid = son.borrow().header.gid;
            for &peer in &peers {
                to_send.push((son_gid, peer));
            }
        }
    }
    if to_send.is_empty() {
        return;
    }
    if ctx.xfer.mode == crate::xfer::XferMode::Idle {
        let _ = ctx.xfer.begin();
    }
    for (gid, peer) in to_send {
        let attr = ctx.objtable.get(gid).map(|h| h.attr).unwrap_or_default();
        let _ = ctx.xfer.copy_obj(gid, OBJTYPE_ELEMENT, peer, Priority::HGhost, attr);
    }
}

/// Coarsen pass (spec §4.3 step 7): undo a father's sons, whether they were
/// built locally this step or survive from an earlier refinement, reverting
/// it to its pre-refinement state.
fn coarsen_element<B: crate::boundary::BndP, S: crate::boundary::BndS>(father: &Element<B, S>) {
    let sons: Vec<_> = {
        let b = father.borrow();
        b.sons.master.iter().chain(b.sons.ghost.iter()).cloned().collect()
    };
    for son in &sons {
        crate::mesh::construct::dispose_element(son);
    }
    let mut f = father.borrow_mut();
    f.sons.master.clear();
    f.sons.ghost.clear();
    f.mark = None;
    f.mark_class = MarkClass::NoClass;
    f.refine = None;
    f.coarsen = false;
    f.side_pattern = 0;
    f.decoupled = false;
}

/// Finalize (spec §4.3 step 8): clear every transient per-step field on the
/// fathers processed this round and on any son created this round, so the
/// next adapt call starts from a clean slate.
fn finalize<Dom: BndDomain>(_ctx: &mut DddContext<Dom>, _level: Level, elements: &[Element<Dom::BndP, Dom::BndS>]) {
    for e in elements {
        let sons: Vec<_> = {
            let b = e.borrow();
            b.sons.master.iter().chain(b.sons.ghost.iter()).cloned().collect()
        };
        for son in &sons {
            let mut s = son.borrow_mut();
            if s.new_el {
                s.new_el = false;
            }
        }
        let mut b = e.borrow_mut();
        if b.mark.is_some() {
            b.refine_class = match b.mark_class {
                MarkClass::NoClass => b.refine_class,
                MarkClass::Red => crate::mesh::element::RefineClass::Red,
                MarkClass::Green => crate::mesh::element::RefineClass::Green,
                MarkClass::Yellow => crate::mesh::element::RefineClass::Yellow,
            };
        }
        b.mark = None;
        b.mark_class = MarkClass::NoClass;
        b.update_green = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BndP, BndS, Movability};
    use crate::error::MeshError;
    use crate::header::Attr as HAttr;
    use crate::ids::ObjType;
    use crate::mesh::element::ElementShape;
    use crate::mesh::node::{new_node, NodeFather, NodeType};
    use crate::mesh::vertex::{new_vertex, VertexVariant};
    use crate::options::Options;
    use marks::MarkRequest;

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

    fn corner(ctx: &mut DddContext<FlatDomain>, global: [f64; 3]) -> crate::mesh::node::Node<NoBndp, NoBnds> {
        let vgid = ctx.alloc_gid();
        let vheader = ObjHeader::new(vgid, ObjType(0), HAttr::default(), Priority::Master);
        let vertex = new_vertex(vheader, global, global, VertexVariant::Inner);
        let ngid = ctx.alloc_gid();
        let nheader = ObjHeader::new(ngid, ObjType(0), HAttr::default(), Priority::Master);
        new_node(nheader, vertex, NodeFather::None, NodeType::Corner)
    }

    fn triangle(ctx: &mut DddContext<FlatDomain>) -> Element<NoBndp, NoBnds> {
        let a = corner(ctx, [0.0, 0.0, 0.0]);
        let b = corner(ctx, [2.0, 0.0, 0.0]);
        let c = corner(ctx, [0.0, 2.0, 0.0]);
        let e_ab = construct::create_edge(ctx.alloc_gid(), &a, &b, Priority::Master);
        let e_bc = construct::create_edge(ctx.alloc_gid(), &b, &c, Priority::Master);
        let e_ca = construct::create_edge(ctx.alloc_gid(), &c, &a, Priority::Master);
        let gid = ctx.alloc_gid();
        construct::create_element(
            gid,
            ElementShape::Triangle,
            vec![a, b, c],
            vec![e_ab, e_bc, e_ca],
            ElementVariant::Inner,
            Priority::Master,
        )
        .unwrap()
    }

    #[test]
    fn red_refinement_of_a_single_triangle_makes_four_sons() {
        let mut ctx = DddContext::new(crate::ids::ProcId(0), FlatDomain, Options::default());
        let elem = triangle(&mut ctx);
        marks::mark_element(&elem, MarkRequest::Regular).unwrap();
        let header = ObjHeader::new(elem.borrow().header.gid, crate::ids::OBJTYPE_ELEMENT, HAttr::default(), Priority::Master);
        ctx.register_local(header, EntityRef::Element(elem.clone()));
        ctx.multigrid.ensure_level(0).elements.insert(Priority::Master, elem.clone());

        let info = adapt(&mut ctx, 0).unwrap();
        assert_eq!(info.n_marked, 1);
        assert_eq!(info.n_refined, 1);
        assert_eq!(elem.borrow().sons.master.len(), 4);
        assert!(elem.borrow().mark.is_none());
    }

    #[test]
    fn coarsen_removes_sons_and_resets_fields() {
        let mut ctx = DddContext::new(crate::ids::ProcId(0), FlatDomain, Options::default());
        let elem = triangle(&mut ctx);
        marks::mark_element(&elem, MarkRequest::Regular).unwrap();
        let header = ObjHeader::new(elem.borrow().header.gid, crate::ids::OBJTYPE_ELEMENT, HAttr::default(), Priority::Master);
        ctx.register_local(header, EntityRef::Element(elem.clone()));
        ctx.multigrid.ensure_level(0).elements.insert(Priority::Master, elem.clone());
        adapt(&mut ctx, 0).unwrap();
        assert_eq!(elem.borrow().sons.master.len(), 4);

        // Coarsen marks are only valid on a son (it coarsens back into its
        // father); marking any one son collapses the whole family.
        let son = elem.borrow().sons.master[0].clone();
        marks::mark_element(&son, MarkRequest::Coarsen).unwrap();
        let info = adapt(&mut ctx, 0).unwrap();
        assert_eq!(info.n_coarsened, 1);
        assert!(elem.borrow().sons.master.is_empty());
    }
}
