//! The per-processor state bag (spec §6 "in-memory persistent state
//! layout", §9 "Design Note: context-threaded state instead of globals").
//!
//! The original keeps its multigrid root, object table, coupling manager,
//! and options on process-wide statics (`dddctrl`, `theMG`, ...); this
//! crate threads all of it through one `DddContext` value per simulated
//! processor instead, exactly the substitution spec §9 calls for.

use crate::boundary::BndDomain;
use crate::coupling::CplMgr;
use crate::error::XferError;
use crate::handlers::HandlerRegistry;
use crate::header::Attr;
use crate::iface::{if_all_from_scratch, if_refresh_all, Interface};
use crate::ids::{Gid, ObjType, ProcId};
use crate::mesh::element::Element;
use crate::mesh::edge::Edge;
use crate::mesh::node::Node;
use crate::mesh::vector::Vector;
use crate::mesh::vertex::Vertex;
use crate::mesh::Multigrid;
use crate::objtable::ObjectTable;
use crate::options::Options;
use crate::xfer::lowcomm::LowComm;
use crate::xfer::unpack::UnpackReport;
use crate::xfer::XferState;

/// A concrete mesh entity, type-erased enough to be looked up by [`Gid`]
/// alone. Every C1 entity kind rides in here so C4's gid-only world (the
/// pack/unpack pipeline never holds a concrete `Element`/`Node`/...) can be
/// bridged back to the live entity graph once a message has been unpacked
/// (spec §9 "pointer-graph-via-symbol-table scheme": the symbol table names
/// objects by gid; resolving a gid back to the actual Rust value it denotes
/// is this index's job).
pub enum EntityRef<B: crate::boundary::BndP, S: crate::boundary::BndS> {
    Vertex(Vertex<B, S>),
    Node(Node<B, S>),
    Edge(Edge<B, S>),
    Element(Element<B, S>),
    Vector(Vector<B, S>),
}

impl<B: crate::boundary::BndP, S: crate::boundary::BndS> EntityRef<B, S> {
    pub fn objtype(&self) -> ObjType {
        match self {
            EntityRef::Vertex(_) => crate::ids::OBJTYPE_VERTEX,
            EntityRef::Node(_) => crate::ids::OBJTYPE_NODE,
            EntityRef::Edge(_) => crate::ids::OBJTYPE_EDGE,
            EntityRef::Element(_) => crate::ids::OBJTYPE_ELEMENT,
            EntityRef::Vector(_) => crate::ids::OBJTYPE_VECTOR,
        }
    }

    pub fn as_element(&self) -> Option<&Element<B, S>> {
        match self {
            EntityRef::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node<B, S>> {
        match self {
            EntityRef::Node(n) => Some(n),
            _ => None,
        }
    }
}

/// Gid-keyed lookup from every entity this processor knows about (local or
/// coupled) back to its concrete Rust value, kept alongside (not inside)
/// [`crate::objtable::ObjectTable`]: the object table only ever stores the
/// C3 header, never the C1 payload, so C2/C4 code that needs the actual
/// mesh entity goes through this index instead.
#[derive(Default)]
pub struct EntityIndex<B: crate::boundary::BndP, S: crate::boundary::BndS> {
    by_gid: ahash::AHashMap<Gid, EntityRef<B, S>>,
}

impl<B: crate::boundary::BndP, S: crate::boundary::BndS> EntityIndex<B, S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, gid: Gid, entity: EntityRef<B, S>) {
        self.by_gid.insert(gid, entity);
    }

    pub fn get(&self, gid: Gid) -> Option<&EntityRef<B, S>> {
        self.by_gid.get(&gid)
    }

    pub fn remove(&mut self, gid: Gid) -> Option<EntityRef<B, S>> {
        self.by_gid.remove(&gid)
    }

    pub fn element(&self, gid: Gid) -> Option<&Element<B, S>> {
        self.get(gid).and_then(EntityRef::as_element)
    }

    pub fn node(&self, gid: Gid) -> Option<&Node<B, S>> {
        self.get(gid).and_then(EntityRef::as_node)
    }
}

/// Everything one simulated processor owns: its slice of the multigrid, its
/// C3 bookkeeping, its C4 command queue, its C5 interface, and the
/// configuration/handlers it was built with. `Dom` is the boundary/domain
/// collaborator this processor's mesh entities are parameterized over.
pub struct DddContext<Dom: BndDomain> {
    pub self_proc: ProcId,
    pub domain: Dom,
    pub options: Options,
    pub registry: HandlerRegistry<Dom::BndP, Dom::BndS>,
    pub multigrid: Multigrid<Dom::BndP, Dom::BndS>,
    pub objtable: ObjectTable,
    pub cplmgr: CplMgr,
    pub xfer: XferState,
    pub iface: Interface,
    pub index: EntityIndex<Dom::BndP, Dom::BndS>,
    next_local_id: u64,
}

impl<Dom: BndDomain> DddContext<Dom> {
    pub fn new(self_proc: ProcId, domain: Dom, options: Options) -> Self {
        DddContext {
            self_proc,
            domain,
            options,
            registry: HandlerRegistry::default(),
            multigrid: Multigrid::new(),
            objtable: ObjectTable::new(),
            cplmgr: CplMgr::new(),
            xfer: XferState::new(),
            iface: Interface::default(),
            index: EntityIndex::new(),
            next_local_id: 0,
        }
    }

    /// Allocate a fresh, processor-unique [`Gid`]: the creating processor's
    /// id in the high bits, a per-processor counter in the low bits, so two
    /// processors never mint the same gid without needing to coordinate
    /// (spec §3.1 glossary: "gid" is "processor-independent global
    /// identity"; derivation is explicitly left to the caller).
    pub fn alloc_gid(&mut self) -> Gid {
        let id = self.next_local_id;
        self.next_local_id += 1;
        Gid(((self.self_proc.0 as u64) << 48) | id)
    }

    pub fn attr(&self, level: crate::ids::Level, subdomain: u16) -> Attr {
        Attr { level, subdomain }
    }

    /// Register a freshly created entity both in the object header table
    /// (local-only, no couplings yet) and in the entity index, so later
    /// coupling/transfer code can find it by gid alone.
    pub fn register_local(&mut self, header: crate::header::ObjHeader, entity: EntityRef<Dom::BndP, Dom::BndS>) {
        let gid = header.gid;
        self.objtable.insert_local(header);
        self.index.insert(gid, entity);
    }

    /// `IFAllFromScratch` bound to this context's object table, using each
    /// coupled object's own header priority as its local priority (spec
    /// §4.5).
    pub fn rebuild_interface(&mut self) {
        self.iface = if_all_from_scratch(&self.objtable, |header| header.priority);
    }

    pub fn refresh_interface(&mut self) {
        let objtable = &self.objtable;
        if_refresh_all(&mut self.iface, objtable, |header| header.priority);
    }

    /// `XferEnd` (spec §4.4.3), driven with this context's own state.
    pub fn xfer_end<C: LowComm>(&mut self, comm: &mut C) -> Result<Vec<UnpackReport>, XferError> {
        xfer::xfer_end(
            &mut self.xfer,
            comm,
            self.self_proc,
            &mut self.objtable,
            &mut self.cplmgr,
            &self.options,
            &self.registry,
        )
    }
}

use crate::xfer;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BndP, BndS, Movability};
    use crate::error::MeshError;

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

    #[test]
    fn alloc_gid_is_unique_and_tags_the_processor() {
        let mut ctx = DddContext::new(ProcId(3), FlatDomain, Options::default());
        let a = ctx.alloc_gid();
        let b = ctx.alloc_gid();
        assert_ne!(a, b);
        assert_eq!(a.0 >> 48, 3);
        assert_eq!(b.0 >> 48, 3);
    }
}
