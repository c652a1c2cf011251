#![allow(unused)]
use criterion::Throughput;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use ddgrid::boundary::{BndDomain, BndP, BndS, Movability};
use ddgrid::context::{DddContext, EntityRef};
use ddgrid::error::MeshError;
use ddgrid::header::{Attr, ObjHeader};
use ddgrid::ids::{Gid, ObjType, ProcId, OBJTYPE_ELEMENT};
use ddgrid::mesh::construct;
use ddgrid::mesh::element::{Element, ElementShape, ElementVariant};
use ddgrid::mesh::node::{new_node, Node, NodeFather, NodeType};
use ddgrid::mesh::vertex::new_vertex;
use ddgrid::mesh::vertex::VertexVariant;
use ddgrid::options::Options;
use ddgrid::priority::Priority;
use ddgrid::refine::marks::{mark_element, MarkRequest};
use ddgrid::refine::adapt;
use ddgrid::xfer::lowcomm::build_channel_network;

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
    let vertex = new_vertex(vheader, global, global, VertexVariant::Inner);
    let ngid = ctx.alloc_gid();
    let nheader = ObjHeader::new(ngid, ObjType(0), Attr::default(), Priority::Master);
    new_node(nheader, vertex, NodeFather::None, NodeType::Corner)
}

/// A standalone triangle at an arbitrary offset, marked `Master` and
/// registered with `ctx` but not yet linked into any grid level — callers
/// insert it themselves so the benchmark can time the insert separately
/// from the construction.
fn triangle(ctx: &mut DddContext<FlatDomain>, offset: f64) -> Element<NoBndp, NoBnds> {
    let a = corner(ctx, [offset, 0.0, 0.0]);
    let b = corner(ctx, [offset + 2.0, 0.0, 0.0]);
    let c = corner(ctx, [offset, 2.0, 0.0]);
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

/// Builds a flat, unconnected strip of `n` triangles on level 0, each
/// marked for regular refinement, ready for a single `adapt` call.
fn build_marked_strip(n: usize) -> DddContext<FlatDomain> {
    let mut ctx = DddContext::new(ProcId(0), FlatDomain, Options::default());
    for i in 0..n {
        let elem = triangle(&mut ctx, i as f64 * 4.0);
        mark_element(&elem, MarkRequest::Regular).unwrap();
        let header = ObjHeader::new(elem.borrow().header.gid, OBJTYPE_ELEMENT, Attr::default(), Priority::Master);
        ctx.register_local(header, EntityRef::Element(elem.clone()));
        ctx.multigrid.ensure_level(0).elements.insert(Priority::Master, elem.clone());
    }
    ctx
}

// ============================================================================

/// Son construction throughput (spec §4.3 steps 2-8): one `adapt` call
/// over an unconnected strip of `n` marked triangles, isolating C2 from
/// C4 entirely (no couplings on any element here, so step 6 is a no-op).
fn bench_adapt(c: &mut Criterion) {
    static B: usize = 200;

    let mut group = c.benchmark_group("Adapt");
    for size in [B, 2 * B, 4 * B, 8 * B] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("RedRefine", size), &size, |b, &size| {
            b.iter_batched(
                || build_marked_strip(size),
                |mut ctx| {
                    adapt(&mut ctx, 0).unwrap();
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

// ============================================================================

/// Migration throughput (spec §4.4): `n` independent single-element
/// `XferCopyObj` + `XferDeleteObj` round trips between two processors
/// wired up with [`build_channel_network`], timing pack, send, receive,
/// and unpack together (spec §8 scenario 1, "single element migration").
fn bench_migrate(c: &mut Criterion) {
    static B: usize = 200;

    let mut group = c.benchmark_group("Migrate");
    for size in [B, 2 * B, 4 * B] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("CopyThenDelete", size), &size, |b, &size| {
            b.iter_batched(
                || {
                    let mut ctx0 = DddContext::new(ProcId(0), FlatDomain, Options::default());
                    let ctx1 = DddContext::new(ProcId(1), FlatDomain, Options::default());
                    let gids: Vec<Gid> = (0..size)
                        .map(|i| {
                            let gid = ctx0.alloc_gid();
                            let attr = ctx0.attr((i % 4) as u32, 0);
                            ctx0.objtable.insert_local(ObjHeader::new(gid, OBJTYPE_ELEMENT, attr, Priority::Master));
                            gid
                        })
                        .collect();
                    ctx0.xfer.begin().unwrap();
                    for &gid in &gids {
                        let attr = ctx0.objtable.get(gid).unwrap().attr;
                        ctx0.xfer.copy_obj(gid, OBJTYPE_ELEMENT, ProcId(1), Priority::Master, attr).unwrap();
                        ctx0.xfer.delete_obj(gid).unwrap();
                    }
                    (ctx0, ctx1)
                },
                |(mut ctx0, mut ctx1)| {
                    ctx1.xfer.begin().unwrap();
                    let mut comms = build_channel_network(&[ProcId(0), ProcId(1)]);
                    let mut comm1 = comms.remove(1);
                    let mut comm0 = comms.remove(0);
                    ctx0.xfer_end(&mut comm0).unwrap();
                    ctx1.xfer_end(&mut comm1).unwrap();
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_adapt, bench_migrate);
criterion_main!(benches);
