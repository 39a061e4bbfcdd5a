use pasat_core::{Digit, DigitPair};
use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// Draws stimulus sequences uniformly from `[1, 10]`, independently and with replacement.
pub struct SequenceGenerator<R: Rng> {
    rng: R,
}

impl SequenceGenerator<ThreadRng> {
    pub fn from_thread_rng() -> Self {
        Self::new(rand::rng())
    }
}

impl SequenceGenerator<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SequenceGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn digit(&mut self) -> Digit {
        Digit::saturating(self.rng.random_range(Digit::MIN..=Digit::MAX))
    }

    pub fn digits(&mut self, count: usize) -> Vec<Digit> {
        (0..count).map(|_| self.digit()).collect()
    }

    pub fn pairs(&mut self, count: usize) -> Vec<DigitPair> {
        (0..count)
            .map(|_| {
                let first = self.digit();
                let second = self.digit();
                DigitPair::new(first, second)
            })
            .collect()
    }
}
