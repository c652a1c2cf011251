//! ddgrid: a distributed adaptive mesh manager (spec §1 overview), ported
//! from dune-uggrid's C `ddd`/`gm` layer into one `DddContext` per simulated
//! processor instead of the original's process-wide statics (spec §9).
//!
//! - [`mesh`] (C1): the vertex/node/edge/element/vector object model.
//! - [`refine`] (C2): the adapt algorithm — mark, closure, rule selection,
//!   son construction, parallel son placement, coarsen, finalize.
//! - [`header`], [`coupling`], [`objtable`] (C3): the distributed object
//!   manager — headers, the coupling allocator, and the object table.
//! - [`xfer`] (C4): the transfer engine — command queue, pack/unpack, wire
//!   messages, and the [`xfer::lowcomm`] transport abstraction.
//! - [`iface`] (C5): interface construction and node-class propagation.
//! - [`handlers`] (C6): the optional per-application callback registry.
//! - [`context`] ties all of the above into one per-processor state bag.

pub mod boundary;
pub mod context;
pub mod coupling;
pub mod error;
pub mod handlers;
pub mod header;
pub mod iface;
pub mod ids;
pub mod mesh;
pub mod objtable;
pub mod options;
pub mod priority;
pub mod refine;
pub mod xfer;

pub use context::DddContext;
pub use error::{CouplingError, MeshError, RefineError, XferError};
pub use ids::{Gid, Level, ObjType, ProcId};
pub use priority::Priority;
