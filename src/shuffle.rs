use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Produces random permutations of queue positions. Cosmetic randomisation
/// for practice queues and exam papers; not suitable for anything secret.
pub trait ShuffleStrategy {
    /// A permutation of `0..len`.
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// Thread-local RNG backed Fisher-Yates shuffle.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomShuffle;

impl ShuffleStrategy for RandomShuffle {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(&mut rand::thread_rng());
        indices
    }
}

/// Reproducible shuffle for tests and replays.
#[derive(Debug, Clone)]
pub struct SeededShuffle {
    rng: StdRng,
}

impl SeededShuffle {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl ShuffleStrategy for SeededShuffle {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..len).collect();
        indices.shuffle(&mut self.rng);
        indices
    }
}

/// Keeps the original order.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShuffle;

impl ShuffleStrategy for NoShuffle {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

/// Returns a new sequence with the same elements in randomised order.
/// The input is left untouched.
pub fn shuffle<T: Clone>(strategy: &mut dyn ShuffleStrategy, items: &[T]) -> Vec<T> {
    strategy
        .permutation(items.len())
        .into_iter()
        .map(|i| items[i].clone())
        .collect()
}
