use super::core::WordPool;
use rand::seq::SliceRandom;
use rand::Rng;

/// Trait for different word selection strategies
pub trait WordSelector {
    /// Select `count` words from the pool
    fn select_words<R: Rng + ?Sized>(&self, pool: &WordPool, count: usize, rng: &mut R)
        -> Vec<String>;
}

/// Independent uniform draws, with replacement
pub struct RandomSelector;

impl WordSelector for RandomSelector {
    fn select_words<R: Rng + ?Sized>(
        &self,
        pool: &WordPool,
        count: usize,
        rng: &mut R,
    ) -> Vec<String> {
        (0..count)
            .filter_map(|_| pool.words.choose(rng).cloned())
            .collect()
    }
}
