//! C6: the per-object-type handler registry consumed by C4 (spec §4.6).
//!
//! Each entity kind that participates in transfer registers one
//! [`TypeHandlers`] value. Rather than the original's function-pointer
//! table keyed by a runtime type id, this is expressed as one struct per
//! concrete entity kind (`Element`, `Node`, `Edge`, `Vertex`, `Vector`)
//! holding `Option<Box<dyn Fn(..)>>` slots — every handler is optional
//! (spec: "Handler registrations" are a registry, not all entities use
//! all seven), and a missing slot is simply a no-op for that step of the
//! pipeline.

use crate::boundary::{BndP, BndS};
use crate::ids::Gid;
use crate::mesh::element::Element;
use crate::priority::Priority;

/// How an object came to be in its current, post-unpack state — the
/// `newness` passed to `OBJMKCONS` (spec §4.4.3 step 11, §4.6).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Newness {
    NotNew,
    PartNew,
    PrunedNew,
    TotalNew,
}

/// Handlers for the `Element` type, the one entity kind C2/C4 actually
/// drive through the full registry in this crate (vertices, nodes, edges,
/// and vectors ride along as dependent objects attached via
/// `XferAddData`/`XFERGATHER` rather than carrying independent handler
/// sets — see `xfer::pack` / `xfer::unpack`).
pub struct ElementHandlers<B: BndP, S: BndS> {
    pub ldata_constructor: Option<Box<dyn Fn(&Element<B, S>)>>,
    pub update: Option<Box<dyn Fn(&Element<B, S>)>>,
    pub objmkcons: Option<Box<dyn Fn(&Element<B, S>, Newness)>>,
    pub destructor: Option<Box<dyn Fn(&Element<B, S>)>>,
    pub set_priority: Option<Box<dyn Fn(&Element<B, S>, Priority, Priority)>>,
}

impl<B: BndP, S: BndS> Default for ElementHandlers<B, S> {
    fn default() -> Self {
        ElementHandlers {
            ldata_constructor: None,
            update: None,
            objmkcons: None,
            destructor: None,
            set_priority: None,
        }
    }
}

impl<B: BndP, S: BndS> ElementHandlers<B, S> {
    pub fn call_ldata_constructor(&self, e: &Element<B, S>) {
        if let Some(f) = &self.ldata_constructor {
            f(e);
        }
    }

    pub fn call_update(&self, e: &Element<B, S>) {
        if let Some(f) = &self.update {
            f(e);
        }
    }

    pub fn call_objmkcons(&self, e: &Element<B, S>, newness: Newness) {
        if let Some(f) = &self.objmkcons {
            f(e, newness);
        }
    }

    pub fn call_destructor(&self, e: &Element<B, S>) {
        if let Some(f) = &self.destructor {
            f(e);
        }
    }

    pub fn call_set_priority(&self, e: &Element<B, S>, old: Priority, new: Priority) {
        if let Some(f) = &self.set_priority {
            f(e, old, new);
        }
    }
}

/// The registry itself. Spec §6: "handler registrations" are supplied
/// "at init time" per type; here that's one field on [`crate::context::DddContext`].
pub struct HandlerRegistry<B: BndP, S: BndS> {
    pub element: ElementHandlers<B, S>,
}

impl<B: BndP, S: BndS> Default for HandlerRegistry<B, S> {
    fn default() -> Self {
        HandlerRegistry { element: ElementHandlers::default() }
    }
}

/// Reference-type resolution for a pointer field: either known statically
/// at registration time, or resolved dynamically by calling back into the
/// live parent object (spec §9 "Dynamic dispatch for reference type",
/// used for polymorphic side-descriptor back-pointers).
pub enum RefType {
    Static(crate::ids::ObjType),
    ByHandler(fn(parent_gid: Gid, child_gid: Gid) -> crate::ids::ObjType),
}
