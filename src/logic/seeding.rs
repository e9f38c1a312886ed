//! First-round placement. Seeding here is a uniform random shuffle, not a ranking.

use crate::models::ParticipantId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Arranges entrants into first-round order before pairing.
pub trait Shuffle {
    fn arrange(&mut self, entrants: &mut [ParticipantId]);
}

/// Uniform random permutation from any `rand` generator.
#[derive(Clone, Debug)]
pub struct RandomShuffle<R> {
    rng: R,
}

impl<R: Rng> RandomShuffle<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Shuffle for RandomShuffle<R> {
    fn arrange(&mut self, entrants: &mut [ParticipantId]) {
        entrants.shuffle(&mut self.rng);
    }
}

/// Keeps the given order. Lets callers pin an exact bracket layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct InputOrder;

impl Shuffle for InputOrder {
    fn arrange(&mut self, _entrants: &mut [ParticipantId]) {}
}
