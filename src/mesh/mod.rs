//! C1: the mesh object model — vertices, nodes, edges, elements, and
//! algebraic vectors layered on top of the C3 [`crate::header::ObjHeader`],
//! organized into per-level grid lists (spec §3, §4.2).
//!
//! Entities follow the teacher's `Rc`-wrapped smart-pointer node shape
//! (`digraph/node.rs`'s `DiNode`: `Rc<Inner>` with `RefCell`-guarded mutable
//! fields, `Weak` back-pointers to avoid ownership cycles, equality by
//! identity key) generalized from one node/edge pair to the five mesh
//! entity kinds and their father/son/ring linkage. Unlike the teacher's
//! `DiNodeInner` (only the adjacency list is mutable), here almost every
//! field mutates under refinement and transfer, so the whole inner struct
//! sits behind one `RefCell` rather than field-by-field.

pub mod construct;
pub mod edge;
pub mod element;
pub mod grid;
pub mod multigrid;
pub mod node;
pub mod vector;
pub mod vertex;

pub use edge::Edge;
pub use element::{Element, ElementShape, RefineClass, ElementVariant};
pub use grid::Grid;
pub use multigrid::Multigrid;
pub use node::{Node, NodeType};
pub use vector::{Connection, Vector};
pub use vertex::{Vertex, VertexVariant};

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Shared-ownership pointer to a mesh entity's inner state — the
/// generalization of the teacher's `Rc<DiNodeInner<..>>`.
pub type Ref<T> = Rc<RefCell<T>>;
/// Non-owning back-pointer (father, ring neighbour, owner) — the
/// generalization of the teacher's `WeakDiNode`.
pub type WeakRef<T> = Weak<RefCell<T>>;

pub const DIM: usize = 3;
