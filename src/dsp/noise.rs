//! Noise source and recursive smoothing filter.
//!
//! White noise comes from a seeded PCG generator so that synthesis is
//! reproducible; a cascade of one-pole low-pass stages turns it into the
//! "warm" and "airy" textures the sound recipes ask for.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// A cascade of identical one-pole low-pass stages.
///
/// Each stage runs `y[n] = alpha * y[n-1] + (1 - alpha) * x[n]`.
/// Higher `alpha` means darker/warmer output. Stable for alpha in [0, 1):
/// the recurrence is a convex blend, so the output never exceeds the
/// input's bound.
#[derive(Debug, Clone)]
pub struct NoiseFilter {
    alpha: f64,
    state: Vec<f64>,
}

impl NoiseFilter {
    /// `stages` is clamped to at least 1; `alpha` to [0, 1).
    pub fn new(alpha: f64, stages: usize) -> Self {
        NoiseFilter {
            alpha: alpha.clamp(0.0, 0.999_999),
            state: vec![0.0; stages.max(1)],
        }
    }

    /// One-stage filter, the common case.
    pub fn single(alpha: f64) -> Self {
        Self::new(alpha, 1)
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn stages(&self) -> usize {
        self.state.len()
    }

    /// Process one sample through every stage in order.
    pub fn process(&mut self, input: f64) -> f64 {
        let mut x = input;
        for y in self.state.iter_mut() {
            *y = self.alpha * *y + (1.0 - self.alpha) * x;
            x = *y;
        }
        x
    }

    /// Clear filter memory.
    pub fn reset(&mut self) {
        for y in self.state.iter_mut() {
            *y = 0.0;
        }
    }
}

/// Seeded white-noise generator feeding a [`NoiseFilter`].
///
/// The same seed always yields the same sample stream.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: Pcg32,
    filter: NoiseFilter,
}

impl NoiseSource {
    pub fn new(seed: u64, filter: NoiseFilter) -> Self {
        NoiseSource {
            rng: Pcg32::seed_from_u64(seed),
            filter,
        }
    }

    /// Unfiltered white noise with the given seed.
    pub fn white(seed: u64) -> Self {
        Self::new(seed, NoiseFilter::new(0.0, 1))
    }

    /// Next filtered noise sample in [-1, 1].
    pub fn next_sample(&mut self) -> f64 {
        let white: f64 = self.rng.random_range(-1.0..=1.0);
        self.filter.process(white)
    }

    /// Next raw (unfiltered) white sample in [-1, 1].
    pub fn next_white(&mut self) -> f64 {
        self.rng.random_range(-1.0..=1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_never_amplifies() {
        // Bounded input must stay bounded for every alpha in [0, 1).
        for &alpha in &[0.0, 0.3, 0.7, 0.9, 0.99] {
            for stages in 1..=3 {
                let mut f = NoiseFilter::new(alpha, stages);
                let mut src = NoiseSource::white(7);
                for _ in 0..10_000 {
                    let x = src.next_white();
                    let y = f.process(x);
                    assert!(
                        y.abs() <= 1.0 + 1e-9,
                        "filter gained: alpha={alpha} stages={stages} y={y}"
                    );
                }
            }
        }
    }

    #[test]
    fn filter_passes_dc() {
        let mut f = NoiseFilter::new(0.9, 3);
        let mut out = 0.0;
        for _ in 0..10_000 {
            out = f.process(1.0);
        }
        assert!((out - 1.0).abs() < 0.001, "DC should converge to 1, got {out}");
    }

    #[test]
    fn higher_alpha_is_smoother() {
        // Average step size between consecutive outputs should shrink
        // as alpha rises.
        let roughness = |alpha: f64| {
            let mut f = NoiseFilter::single(alpha);
            let mut src = NoiseSource::white(11);
            let mut prev = 0.0;
            let mut sum = 0.0;
            for _ in 0..10_000 {
                let y = f.process(src.next_white());
                sum += (y - prev).abs();
                prev = y;
            }
            sum
        };
        assert!(roughness(0.95) < roughness(0.3));
    }

    #[test]
    fn seeded_noise_is_deterministic() {
        let mut a = NoiseSource::new(42, NoiseFilter::new(0.8, 2));
        let mut b = NoiseSource::new(42, NoiseFilter::new(0.8, 2));
        for _ in 0..1000 {
            assert_eq!(a.next_sample(), b.next_sample());
        }
    }

    #[test]
    fn different_seeds_differ() {
        let mut a = NoiseSource::white(1);
        let mut b = NoiseSource::white(2);
        let same = (0..100).filter(|_| a.next_white() == b.next_white()).count();
        assert!(same < 100, "different seeds should not produce identical streams");
    }

    #[test]
    fn alpha_clamped_below_one() {
        let f = NoiseFilter::new(1.5, 1);
        assert!(f.alpha() < 1.0);
    }

    #[test]
    fn reset_clears_memory() {
        let mut f = NoiseFilter::new(0.9, 2);
        for _ in 0..100 {
            f.process(1.0);
        }
        f.reset();
        let y = f.process(0.0);
        assert_eq!(y, 0.0);
    }
}
