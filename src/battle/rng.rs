//! The single random source a battle draws from. Damage variance, accuracy,
//! status chances and every AI choice go through it, so a seed (or a scripted
//! roll list in tests) reproduces a whole battle.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

#[derive(Debug, Clone)]
enum RngSource {
    Seeded(StdRng),
    /// Fixed unit-interval rolls, consumed in order.
    Scripted { rolls: Vec<f64>, index: usize },
}

#[derive(Debug, Clone)]
pub struct BattleRng {
    source: RngSource,
}

impl BattleRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: RngSource::Seeded(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn new_random() -> Self {
        Self {
            source: RngSource::Seeded(StdRng::from_os_rng()),
        }
    }

    /// Rolls are values in `[0, 1)`; running out is a test bug and panics with
    /// the reason of the roll that was asked for.
    pub fn new_for_test(rolls: Vec<f64>) -> Self {
        Self {
            source: RngSource::Scripted { rolls, index: 0 },
        }
    }

    /// Draws a value in `[0, 1)`.
    pub fn next_roll(&mut self, reason: &str) -> f64 {
        let roll = match &mut self.source {
            RngSource::Seeded(rng) => rng.random::<f64>(),
            RngSource::Scripted { rolls, index } => {
                if *index >= rolls.len() {
                    panic!(
                        "BattleRng exhausted! Tried to get a value for: '{}'. Need more rolls.",
                        reason
                    );
                }
                let roll = rolls[*index];
                *index += 1;
                roll
            }
        };
        trace!(roll, reason, "rng consumed");
        roll
    }

    /// True with probability `probability`. Certain and impossible outcomes do
    /// not consume a roll.
    pub fn chance(&mut self, probability: f64, reason: &str) -> bool {
        if probability >= 1.0 {
            return true;
        }
        if probability <= 0.0 {
            return false;
        }
        self.next_roll(reason) < probability
    }

    /// Uniform integer in `low..=high`.
    pub fn range_inclusive(&mut self, low: i32, high: i32, reason: &str) -> i32 {
        if high <= low {
            return low;
        }
        let span = (high - low + 1) as f64;
        let offset = (self.next_roll(reason) * span).floor() as i32;
        (low + offset).min(high)
    }

    /// Uniform pick from `items`; `None` only for an empty slice.
    pub fn sample<'a, T>(&mut self, items: &'a [T], reason: &str) -> Option<&'a T> {
        match items.len() {
            0 => None,
            1 => items.first(),
            len => {
                let index = (self.next_roll(reason) * len as f64).floor() as usize;
                items.get(index.min(len - 1))
            }
        }
    }
}
