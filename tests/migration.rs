//! Single-element migration (spec §8 scenario 1): a processor hands an
//! object it holds at `Master` to a peer and deletes its own copy in the
//! same round. The receiver must end up with a clean `Master` copy and no
//! coupling back to the now-empty original.

use ddgrid::boundary::{BndDomain, BndP, BndS, Movability};
use ddgrid::context::DddContext;
use ddgrid::error::MeshError;
use ddgrid::header::{Attr, ObjHeader};
use ddgrid::ids::{Gid, ObjType, ProcId, OBJTYPE_ELEMENT};
use ddgrid::options::Options;
use ddgrid::priority::Priority;
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

#[test]
fn migrating_an_object_leaves_no_coupling_on_the_receiver() {
    let mut ctx0 = DddContext::new(ProcId(0), FlatDomain, Options::default());
    let mut ctx1 = DddContext::new(ProcId(1), FlatDomain, Options::default());

    let gid = Gid(42);
    let attr = ctx0.attr(0, 0);
    ctx0.objtable.insert_local(ObjHeader::new(gid, OBJTYPE_ELEMENT, attr, Priority::Master));

    ctx0.xfer.begin().unwrap();
    ctx0.xfer.copy_obj(gid, OBJTYPE_ELEMENT, ProcId(1), Priority::Master, attr).unwrap();
    ctx0.xfer.delete_obj(gid).unwrap();
    ctx1.xfer.begin().unwrap();

    let mut comms = build_channel_network(&[ProcId(0), ProcId(1)]);
    let mut comm1 = comms.remove(1);
    let mut comm0 = comms.remove(0);

    ctx0.xfer_end(&mut comm0).unwrap();
    let reports = ctx1.xfer_end(&mut comm1).unwrap();

    assert!(ctx0.objtable.get(gid).is_none());

    let received = ctx1.objtable.get(gid).expect("receiver should hold the migrated copy");
    assert_eq!(received.priority, Priority::Master);
    assert!(received.couplings.is_empty());
    assert!(received.is_local());

    let created = reports
        .iter()
        .flat_map(|r| r.events.iter())
        .any(|e| matches!(e, ddgrid::xfer::unpack::UnpackEvent::Created { gid: g, .. } if *g == gid));
    assert!(created);
}

#[test]
fn pure_replication_keeps_a_coupling_on_both_sides() {
    let mut ctx0 = DddContext::new(ProcId(0), FlatDomain, Options::default());
    let mut ctx1 = DddContext::new(ProcId(1), FlatDomain, Options::default());

    let gid = Gid(7);
    let attr = ctx0.attr(0, 0);
    ctx0.objtable.insert_local(ObjHeader::new(gid, ObjType(OBJTYPE_ELEMENT.0), attr, Priority::Master));

    ctx0.xfer.begin().unwrap();
    ctx0.xfer.copy_obj(gid, OBJTYPE_ELEMENT, ProcId(1), Priority::HGhost, attr).unwrap();
    ctx1.xfer.begin().unwrap();

    let mut comms = build_channel_network(&[ProcId(0), ProcId(1)]);
    let mut comm1 = comms.remove(1);
    let mut comm0 = comms.remove(0);

    ctx0.xfer_end(&mut comm0).unwrap();
    ctx1.xfer_end(&mut comm1).unwrap();

    let sender_header = ctx0.objtable.get(gid).expect("sender keeps its master copy");
    assert!(!sender_header.is_local(), "sender should still be coupled after a pure replication");

    let receiver_header = ctx1.objtable.get(gid).unwrap();
    assert!(!receiver_header.is_local());
}
