//! The geometric domain/BVP interface, consumed but not implemented here
//! (spec §1 "Out of scope", §6 "Boundary/domain interface consumed").
//!
//! Modeled as a trait so the mesh layer (C1) can be built and tested
//! without a concrete CAD/BVP backend; tests supply a trivial
//! piecewise-linear domain.

use crate::error::MeshError;

/// Opaque handle to a boundary point, created by interpolating along a
/// boundary edge or side. Domain-specific; this crate only ever asks a
/// [`BndDomain`] to create, evaluate, describe, and dispose of them.
pub trait BndP: Clone {}

/// Opaque handle to a boundary side descriptor, attached to a boundary
/// element's side.
pub trait BndS: Clone {}

/// Whether a boundary point is allowed to move under mesh smoothing —
/// consumed by `CreateMidNode`/`CreateSideNode` to decide whether a
/// boundary-originated vertex should be flagged "moved" (spec §4.2).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Movability {
    pub free: bool,
}

/// The boundary/domain collaborator. Every method here is named after the
/// DDD/UG operation it stands in for, per spec §6, so the grounding from
/// spec to trait method is direct.
pub trait BndDomain {
    type BndP: BndP;
    type BndS: BndS;

    /// `BNDP_CreateBndP(heap, bndp1, bndp2, 0.5) -> bndp | null`: interpolate
    /// along a boundary edge at parameter `t` (spec §4.2 passes `0.5` for
    /// mid-point creation).
    fn bndp_create_bndp(&self, a: &Self::BndP, b: &Self::BndP, t: f64) -> Option<Self::BndP>;

    /// `BNDS_CreateBndP(heap, bnds, local_uv) -> bndp`: interpolate on a
    /// boundary side at local `(u, v)`.
    fn bnds_create_bndp(&self, side: &Self::BndS, uv: (f64, f64)) -> Self::BndP;

    /// `BNDP_Global(bndp, out_xyz) -> ok/err`: evaluate global coordinates.
    fn bndp_global(&self, bndp: &Self::BndP) -> Result<[f64; 3], MeshError>;

    /// `BNDP_BndPDesc(bndp, &out_move) -> ok/err`: obtain movability.
    fn bndp_bndp_desc(&self, bndp: &Self::BndP) -> Result<Movability, MeshError>;

    /// `BNDS_CreateBndS(heap, bndp[], n) -> bnds`: create a boundary-side
    /// descriptor from `n` boundary points.
    fn bnds_create_bnds(&self, points: &[Self::BndP]) -> Self::BndS;

    fn bndp_dispose(&self, bndp: Self::BndP);
    fn bnds_dispose(&self, bnds: Self::BndS);

    /// `BNDS_BndSDesc(bnds, &left, &right) -> ok/err`: the two subdomain
    /// ids a boundary side separates.
    fn bnds_bnds_desc(&self, bnds: &Self::BndS) -> Result<(u16, u16), MeshError>;
}

/// Tolerance ε = 10⁻⁶ (spec §4.2) above which a boundary-evaluated
/// midpoint is considered to have moved from the linear interpolation of
/// its endpoints, requiring `UG_GlobalToLocal` to recompute local
/// coordinates.
pub const BOUNDARY_MOVE_EPSILON: f64 = 1e-6;
