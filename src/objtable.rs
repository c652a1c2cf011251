//! C3: the per-processor object table — a dense array of headers split
//! into a local-only region and a coupled region, compacted by
//! swap-with-last on coupling removal (spec §4.1, §6 "Persistent state
//! layout").

use tracing::warn;

use crate::header::ObjHeader;
use crate::ids::Gid;

/// Dense per-processor table of every object participating in a coupling,
/// plus every local-only object that has ever been registered (the two are
/// kept in one `Vec` split at `coupled_start`, objects `< coupled_start`
/// are local-only, objects `>= coupled_start` have at least one coupling).
pub struct ObjectTable {
    headers: Vec<ObjHeader>,
    index_by_gid: ahash::AHashMap<Gid, usize>,
    coupled_start: usize,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        ObjectTable {
            headers: Vec::new(),
            index_by_gid: ahash::AHashMap::new(),
            coupled_start: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn get(&self, gid: Gid) -> Option<&ObjHeader> {
        self.index_by_gid.get(&gid).map(|&i| &self.headers[i])
    }

    pub fn get_mut(&mut self, gid: Gid) -> Option<&mut ObjHeader> {
        let idx = *self.index_by_gid.get(&gid)?;
        Some(&mut self.headers[idx])
    }

    pub fn contains(&self, gid: Gid) -> bool {
        self.index_by_gid.contains_key(&gid)
    }

    /// Register a freshly created local-only object. Callers move it into
    /// the coupled region later via [`ObjectTable::promote_to_coupled`]
    /// once it gains its first coupling.
    pub fn insert_local(&mut self, header: ObjHeader) {
        let gid = header.gid;
        debug_assert!(header.is_local());
        self.grow_if_needed();
        // Local-only entries live in `[0, coupled_start)`; insert at the
        // boundary and push the boundary forward.
        self.headers.insert(self.coupled_start, header);
        self.coupled_start += 1;
        self.reindex_from(0);
        debug_assert!(self.index_by_gid.contains_key(&gid));
    }

    /// Move an object that just gained its first coupling out of the
    /// local-only region into the coupled region (spec §4.1: "if the
    /// object had no chain before move it from the local-only region of
    /// the object table into the coupled region").
    pub fn promote_to_coupled(&mut self, gid: Gid) {
        let idx = match self.index_by_gid.get(&gid) {
            Some(&i) if i < self.coupled_start => i,
            _ => return,
        };
        // Rotate the object from its local-only slot to just before the
        // coupled region by swapping it with the last local-only slot,
        // then shrinking the local-only region by one.
        let last_local = self.coupled_start - 1;
        self.headers.swap(idx, last_local);
        self.coupled_start -= 1;
        self.reindex_from(idx.min(last_local));
    }

    /// Move an object whose last coupling was just removed back into the
    /// local-only region, compacting via swap-with-last (spec §4.1:
    /// "compact the object table (swap-with-last) and mark the object
    /// local").
    pub fn demote_to_local(&mut self, gid: Gid) {
        let idx = match self.index_by_gid.get(&gid) {
            Some(&i) if i >= self.coupled_start => i,
            _ => return,
        };
        self.headers.swap(idx, self.coupled_start);
        self.coupled_start += 1;
        self.reindex_from(idx.min(self.coupled_start - 1));
    }

    /// Remove an object entirely (after `XferDeleteObj` has executed),
    /// swap-with-last compacting whichever region it was in.
    pub fn remove(&mut self, gid: Gid) -> Option<ObjHeader> {
        let idx = *self.index_by_gid.get(&gid)?;
        let last = self.headers.len() - 1;
        if idx < self.coupled_start {
            // Local-only: swap with the last local-only slot, then with
            // the true last element if that slot is in the coupled region.
            let last_local = self.coupled_start - 1;
            self.headers.swap(idx, last_local);
            if last_local != last {
                self.headers.swap(last_local, last);
            }
            self.coupled_start -= 1;
        } else {
            self.headers.swap(idx, last);
        }
        let removed = self.headers.pop();
        self.reindex_from(0);
        removed
    }

    fn reindex_from(&mut self, start: usize) {
        for i in start..self.headers.len() {
            self.index_by_gid.insert(self.headers[i].gid, i);
        }
    }

    fn grow_if_needed(&mut self) {
        // Deterministic "double size and warn" growth policy (spec
        // §4.1). `Vec` already amortizes growth; this just makes the
        // doubling and the warning explicit and observable, since the
        // spec calls the policy out as a distinct behaviour rather than
        // an implementation detail.
        if self.headers.len() == self.headers.capacity() && !self.headers.is_empty() {
            let new_cap = self.headers.capacity() * 2;
            warn!(old_capacity = self.headers.capacity(), new_capacity = new_cap, "object table growing");
            self.headers.reserve(new_cap - self.headers.len());
        }
    }

    pub fn local_only(&self) -> &[ObjHeader] {
        &self.headers[..self.coupled_start]
    }

    pub fn coupled(&self) -> &[ObjHeader] {
        &self.headers[self.coupled_start..]
    }

    /// All headers sorted by gid, as required before a transfer message's
    /// object table and symbol table are built (spec §4.4.3 step 6: "Sort
    /// the symbol table by gid and the object table by gid").
    pub fn sorted_gids(&self) -> Vec<Gid> {
        let mut gids: Vec<Gid> = self.headers.iter().map(|h| h.gid).collect();
        gids.sort_unstable();
        gids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Attr;
    use crate::ids::ObjType;
    use crate::priority::Priority;

    fn hdr(gid: u64) -> ObjHeader {
        ObjHeader::new(Gid(gid), ObjType(0), Attr::default(), Priority::Master)
    }

    #[test]
    fn insert_and_lookup() {
        let mut t = ObjectTable::new();
        t.insert_local(hdr(1));
        t.insert_local(hdr(2));
        assert!(t.contains(Gid(1)));
        assert!(t.contains(Gid(2)));
        assert_eq!(t.local_only().len(), 2);
        assert_eq!(t.coupled().len(), 0);
    }

    #[test]
    fn promote_and_demote_round_trip() {
        let mut t = ObjectTable::new();
        t.insert_local(hdr(1));
        t.insert_local(hdr(2));
        t.promote_to_coupled(Gid(1));
        assert_eq!(t.coupled().len(), 1);
        assert_eq!(t.coupled()[0].gid, Gid(1));
        assert_eq!(t.local_only().len(), 1);

        t.demote_to_local(Gid(1));
        assert_eq!(t.coupled().len(), 0);
        assert_eq!(t.local_only().len(), 2);
        assert!(t.contains(Gid(1)));
    }

    #[test]
    fn remove_compacts_the_right_region() {
        let mut t = ObjectTable::new();
        t.insert_local(hdr(1));
        t.insert_local(hdr(2));
        t.insert_local(hdr(3));
        t.promote_to_coupled(Gid(2));
        t.remove(Gid(1));
        assert!(!t.contains(Gid(1)));
        assert!(t.contains(Gid(2)));
        assert!(t.contains(Gid(3)));
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn sorted_gids_is_sorted() {
        let mut t = ObjectTable::new();
        t.insert_local(hdr(5));
        t.insert_local(hdr(1));
        t.insert_local(hdr(3));
        assert_eq!(t.sorted_gids(), vec![Gid(1), Gid(3), Gid(5)]);
    }
}
