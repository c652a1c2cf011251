//! Mark-class bookkeeping (spec §4.3 step 1, "mark intake"): the family a
//! pending mark resolves to, independent of `refine_class` (what the
//! element currently *is*, from the previous adapt step).
//!
//! Grounded on `gm/refine.h`'s two-bit `MARKCLASS_CE` control word entry,
//! which is why this is a four-way enum rather than collapsing `NoClass`
//! into `Default` on [`crate::mesh::element::RefineClass`].

use crate::mesh::element::{Element, ElementShape};
use crate::boundary::{BndP, BndS};
use crate::error::RefineError;
use crate::refine::rules::select_rule;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MarkClass {
    #[default]
    NoClass,
    Red,
    Green,
    Yellow,
}

/// What a caller is allowed to request via `mark` (spec §4.3 step 1: "mark
/// intake validates the rule id against the element's current side
/// pattern and shape before accepting it").
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MarkRequest {
    /// No refinement requested; clears any previous mark.
    NoRefine,
    /// Regular (isotropic, "red") refinement: every son is geometrically
    /// similar to the father.
    Regular,
    /// Coarsen this element back into its father on the next adapt.
    Coarsen,
}

/// Validate a mark request against an element's shape before it's
/// accepted (spec §4.3 step 1). Rejects coarsen requests on elements with
/// no father — there is nothing to coarsen into.
pub fn validate_mark(shape: ElementShape, has_father: bool, request: MarkRequest) -> Result<MarkClass, &'static str> {
    match request {
        MarkRequest::NoRefine => Ok(MarkClass::NoClass),
        MarkRequest::Regular => {
            let _ = shape;
            Ok(MarkClass::Red)
        }
        MarkRequest::Coarsen => {
            if !has_father {
                return Err("cannot coarsen an element with no father");
            }
            Ok(MarkClass::NoClass)
        }
    }
}

/// Mark intake (spec §4.3 step 1): validate `request` against `elem`'s
/// current shape and father, then commit the resolved `mark_class` and the
/// rule the closure/son-construction steps will use if this mark survives
/// closure unchanged. Coarsen requests clear `mark` entirely — coarsening
/// is driven by the separate `coarsen` flag, not a rule id.
pub fn mark_element<B: BndP, S: BndS>(elem: &Element<B, S>, request: MarkRequest) -> Result<(), RefineError> {
    let mut e = elem.borrow_mut();
    let has_father = e.father.is_some();
    let shape = e.shape;
    let side_pattern = e.side_pattern;
    let class = validate_mark(shape, has_father, request).map_err(|msg| RefineError::InvalidMark(msg.to_string()))?;
    match request {
        MarkRequest::Coarsen => {
            e.mark_class = MarkClass::NoClass;
            e.mark = None;
            e.coarsen = true;
        }
        MarkRequest::NoRefine => {
            e.mark_class = MarkClass::NoClass;
            e.mark = None;
            e.coarsen = false;
        }
        MarkRequest::Regular => {
            let gid = e.header.gid;
            let rule = select_rule(shape, class, side_pattern)
                .ok_or(RefineError::NoMatchingRule { elem: gid, mark_class: class, side_pattern })?;
            e.mark_class = class;
            e.mark = Some(rule.id);
            e.coarsen = false;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarsen_without_father_is_rejected() {
        assert!(validate_mark(ElementShape::Tetra, false, MarkRequest::Coarsen).is_err());
    }

    #[test]
    fn regular_mark_on_any_shape_is_accepted() {
        assert_eq!(validate_mark(ElementShape::Hex, true, MarkRequest::Regular), Ok(MarkClass::Red));
    }
}
