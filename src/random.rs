// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Crash Table Engine - Random Sources

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform draws in `[0, 1)`. Injected into the engine so that rounds can be
/// replayed deterministically.
pub trait RandomSource {
    fn next(&mut self) -> f64;
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next(&mut self) -> f64 {
        (**self).next()
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn next(&mut self) -> f64 {
        (**self).next()
    }
}

// ─── ChaChaSource ────────────────────────────────────────────────────────────

/// Seedable ChaCha8 stream; the default source for hosts and the bench.
#[derive(Debug, Clone)]
pub struct ChaChaSource {
    rng: ChaCha8Rng,
}

impl ChaChaSource {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed) }
    }

    pub fn from_rng(rng: ChaCha8Rng) -> Self {
        Self { rng }
    }
}

impl RandomSource for ChaChaSource {
    fn next(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

// ─── ScriptedSource ──────────────────────────────────────────────────────────

/// Replays a fixed script of draws. Once exhausted it keeps returning the last
/// draw; an empty script yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    script: VecDeque<f64>,
    last: f64,
}

impl ScriptedSource {
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        Self { script: draws.into_iter().collect(), last: 0.0 }
    }

    /// Append draws to the end of the script.
    pub fn push(&mut self, draw: f64) {
        self.script.push_back(draw);
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl RandomSource for ScriptedSource {
    fn next(&mut self) -> f64 {
        if let Some(draw) = self.script.pop_front() {
            self.last = draw;
        }
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chacha_draws_in_unit_interval() {
        let mut src = ChaChaSource::seeded(7);
        for _ in 0..10_000 {
            let h = src.next();
            assert!((0.0..1.0).contains(&h), "draw {} out of range", h);
        }
    }

    #[test]
    fn test_chacha_same_seed_same_stream() {
        let mut a = ChaChaSource::seeded(42);
        let mut b = ChaChaSource::seeded(42);
        for _ in 0..100 {
            assert_eq!(a.next().to_bits(), b.next().to_bits());
        }
    }

    #[test]
    fn test_scripted_repeats_last_draw() {
        let mut src = ScriptedSource::new([0.25, 0.5]);
        assert_eq!(src.next(), 0.25);
        assert_eq!(src.next(), 0.5);
        assert_eq!(src.remaining(), 0);
        assert_eq!(src.next(), 0.5);
        assert_eq!(src.next(), 0.5);
    }

    #[test]
    fn test_empty_script_yields_zero() {
        let mut src = ScriptedSource::default();
        assert_eq!(src.next(), 0.0);
        src.push(0.9);
        assert_eq!(src.next(), 0.9);
    }
}
