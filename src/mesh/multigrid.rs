//! Multigrid root: an array of per-level [`Grid`]s (spec §6 "Persistent
//! state layout": "the per-level grid list is accessed via a multigrid
//! root pointing to an array of grids by level").

use crate::boundary::{BndP, BndS};
use crate::ids::Level;
use crate::mesh::grid::Grid;

pub struct Multigrid<B: BndP, S: BndS> {
    levels: Vec<Grid<B, S>>,
}

impl<B: BndP, S: BndS> Default for Multigrid<B, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: BndP, S: BndS> Multigrid<B, S> {
    pub fn new() -> Self {
        Multigrid { levels: vec![Grid::new(0)] }
    }

    pub fn n_levels(&self) -> Level {
        self.levels.len() as Level
    }

    pub fn level(&self, l: Level) -> Option<&Grid<B, S>> {
        self.levels.get(l as usize)
    }

    pub fn level_mut(&mut self, l: Level) -> Option<&mut Grid<B, S>> {
        self.levels.get_mut(l as usize)
    }

    /// Ensure a grid exists for level `l`, creating intermediate empty
    /// levels if needed (refinement always proceeds one level at a time in
    /// practice, but this keeps the invariant "every level < n_levels has
    /// a grid" regardless).
    pub fn ensure_level(&mut self, l: Level) -> &mut Grid<B, S> {
        while (self.levels.len() as Level) <= l {
            let next = self.levels.len() as Level;
            self.levels.push(Grid::new(next));
        }
        self.levels.get_mut(l as usize).unwrap()
    }

    pub fn finest_level(&self) -> Level {
        self.n_levels() - 1
    }
}
