use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of uniform picks for the selection engine
pub trait Draw {
    /// Uniform index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;
}

/// [`Draw`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RandomDraw<R = StdRng> {
    rng: R,
}

impl<R: Rng> RandomDraw<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDraw<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Draw for RandomDraw<R> {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// Replays a fixed list of indices, clamped to the pool size
#[derive(Debug, Clone, Default)]
pub struct ScriptedDraw {
    picks: Vec<usize>,
    next: usize,
}

impl ScriptedDraw {
    pub fn new(picks: Vec<usize>) -> Self {
        Self { picks, next: 0 }
    }

    pub fn calls(&self) -> usize {
        self.next
    }
}

impl Draw for ScriptedDraw {
    fn pick(&mut self, len: usize) -> usize {
        let pick = self.picks.get(self.next).copied().unwrap_or(0);
        self.next += 1;
        pick.min(len - 1)
    }
}
