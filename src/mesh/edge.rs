//! Edge entity (spec §3.1): uniquely identified by its unordered endpoint
//! pair, carries an optional midnode, a subdomain id, and the count of
//! locally known incident elements.

use std::rc::Rc;

use crate::boundary::{BndP, BndS};
use crate::header::ObjHeader;
use crate::mesh::node::{Node, NodeInner};
use crate::mesh::{Ref, WeakRef};

pub struct EdgeInner<B: BndP, S: BndS> {
    pub header: ObjHeader,
    pub ends: [WeakRef<NodeInner<B, S>>; 2],
    pub midnode: Option<Node<B, S>>,
    pub subdomain: u16,
    /// `NO_OF_ELEM`: number of locally known elements (master + ghost
    /// copies) containing the edge (spec §3.2, §8).
    pub n_of_elem: u32,
}

pub type Edge<B, S> = Ref<EdgeInner<B, S>>;

impl<B: BndP, S: BndS> EdgeInner<B, S> {
    pub fn endpoints(&self) -> Option<(Node<B, S>, Node<B, S>)> {
        Some((self.ends[0].upgrade()?, self.ends[1].upgrade()?))
    }

    pub fn has_endpoint(&self, node: &Node<B, S>) -> bool {
        self.ends.iter().any(|w| w.upgrade().map(|n| Rc::ptr_eq(&n, node)).unwrap_or(false))
    }

    pub fn other_endpoint(&self, node: &Node<B, S>) -> Option<Node<B, S>> {
        let (a, b) = self.endpoints()?;
        if Rc::ptr_eq(&a, node) {
            Some(b)
        } else if Rc::ptr_eq(&b, node) {
            Some(a)
        } else {
            None
        }
    }
}

pub fn new_edge<B: BndP, S: BndS>(header: ObjHeader, a: &Node<B, S>, b: &Node<B, S>) -> Edge<B, S> {
    let edge = Rc::new(std::cell::RefCell::new(EdgeInner {
        header,
        ends: [Rc::downgrade(a), Rc::downgrade(b)],
        midnode: None,
        subdomain: 0,
        n_of_elem: 0,
    }));
    let weak = Rc::downgrade(&edge);
    a.borrow_mut().ring_push(weak.clone());
    b.borrow_mut().ring_push(weak);
    edge
}

/// `GetEdge(a, b)`: the unique edge between `a` and `b`, or `None` — found
/// by scanning `a`'s ring, since the ring holds every edge incident to
/// `a` (spec §3.2, §4.2).
pub fn get_edge<B: BndP, S: BndS>(a: &Node<B, S>, b: &Node<B, S>) -> Option<Edge<B, S>> {
    for weak in a.borrow().ring.iter() {
        if let Some(edge) = weak.upgrade() {
            if edge.borrow().has_endpoint(b) {
                return Some(edge);
            }
        }
    }
    None
}

/// Unlinks both ring half-links before the edge is dropped (spec §3.2:
/// "on destruction both halves are unlinked").
pub fn unlink_edge<B: BndP, S: BndS>(edge: &Edge<B, S>) {
    let (a, b) = match edge.borrow().endpoints() {
        Some(pair) => pair,
        None => return,
    };
    a.borrow_mut().ring_remove(edge);
    b.borrow_mut().ring_remove(edge);
}
