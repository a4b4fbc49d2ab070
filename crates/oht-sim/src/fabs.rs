//! Multiple independent fabs side by side.
//!
//! Fabs share no mutable state, so parallelism is embarrassingly simple:
//! with the `parallel` feature each fab ticks on its own Rayon worker;
//! without it they tick sequentially in index order.  Either way the result
//! is identical — determinism is per fab.

use oht_lock::DeadlockZonePolicy;

use crate::fab::Fab;

/// A set of independent fabs ticked together.
pub struct FabSet<Z: DeadlockZonePolicy> {
    fabs: Vec<Fab<Z>>,
}

impl<Z: DeadlockZonePolicy> FabSet<Z> {
    pub fn new(fabs: Vec<Fab<Z>>) -> Self {
        Self { fabs }
    }

    pub fn len(&self) -> usize {
        self.fabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fabs.is_empty()
    }

    pub fn fab(&self, index: usize) -> Option<&Fab<Z>> {
        self.fabs.get(index)
    }

    pub fn fab_mut(&mut self, index: usize) -> Option<&mut Fab<Z>> {
        self.fabs.get_mut(index)
    }

    /// Advance every fab by `dt`.
    #[cfg(not(feature = "parallel"))]
    pub fn tick_all(&mut self, dt: f32) {
        for fab in &mut self.fabs {
            fab.tick(dt);
        }
    }

    /// Advance every fab by `dt`, one Rayon task per fab.
    #[cfg(feature = "parallel")]
    pub fn tick_all(&mut self, dt: f32)
    where
        Z: Send,
    {
        use rayon::prelude::*;
        self.fabs.par_iter_mut().for_each(|fab| fab.tick(dt));
    }
}
