//! 7-bag randomizer for piece generation
//!
//! All 7 pieces go into the bag and are drawn out one at a time at
//! random. The bag is refilled only once it is empty, so every piece
//! appears exactly once per 7 draws. This prevents long droughts.

use crate::tetromino::TetrominoType;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The 7-bag piece randomizer
#[derive(Debug, Clone)]
pub struct Bag {
    /// Pieces left in the current bag
    remaining: Vec<TetrominoType>,
    rng: ChaCha8Rng,
}

impl Default for Bag {
    fn default() -> Self {
        Self::new()
    }
}

impl Bag {
    /// Create a bag seeded from system entropy
    pub fn new() -> Self {
        Self::with_seed(rand::random())
    }

    /// Create a bag with a fixed seed for reproducible sequences
    pub fn with_seed(seed: u64) -> Self {
        let mut bag = Self {
            remaining: Vec::with_capacity(7),
            rng: ChaCha8Rng::seed_from_u64(seed),
        };
        bag.init();
        bag
    }

    /// Discard whatever is left and start a fresh bag
    pub fn init(&mut self) {
        self.remaining.clear();
        self.refill();
    }

    /// Draw the next piece, refilling the bag first if it is empty
    pub fn pick_next(&mut self) -> TetrominoType {
        if self.remaining.is_empty() {
            self.refill();
        }
        let index = self.rng.gen_range(0..self.remaining.len());
        self.remaining.remove(index)
    }

    /// Pieces still in the current bag
    pub fn remaining(&self) -> &[TetrominoType] {
        &self.remaining
    }

    fn refill(&mut self) {
        self.remaining.extend(TetrominoType::all());
    }
}
