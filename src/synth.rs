// synth.rs — Deterministic synthetic image generation.
//
// The generator is seeded per source, not ambient global state: two sources
// with the same seed produce identical images, and a single source produces
// the same image on every call. Reproducibility across runs is an invariant
// of the benchmark — the scalar and GPU engines must see the same input.

use rand::distributions::Uniform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::image::Image;

/// The fixed seed used by the benchmark runner.
pub const DEFAULT_SEED: u64 = 42;

/// Produces grayscale images filled with uniform noise over [0, 255).
pub struct SyntheticSource {
    seed: u64,
}

impl SyntheticSource {
    /// Create a source with an explicit seed.
    pub fn new(seed: u64) -> Self {
        SyntheticSource { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fill a `width × height` image with uniform samples from [0, 255).
    ///
    /// A fresh RNG is constructed from the seed on every call, so repeated
    /// calls return identical images.
    pub fn generate(&self, width: usize, height: usize) -> Image<f32> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let dist = Uniform::new(0.0f32, 255.0);
        let data: Vec<f32> = (0..width * height).map(|_| rng.sample(dist)).collect();
        Image::from_vec(width, height, data)
    }
}

impl Default for SyntheticSource {
    fn default() -> Self {
        SyntheticSource::new(DEFAULT_SEED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_deterministic() {
        let source = SyntheticSource::default();
        let a = source.generate(16, 16);
        let b = source.generate(16, 16);
        assert_eq!(a.as_slice(), b.as_slice());

        let other = SyntheticSource::new(DEFAULT_SEED);
        let c = other.generate(16, 16);
        assert_eq!(a.as_slice(), c.as_slice());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = SyntheticSource::new(1).generate(32, 32);
        let b = SyntheticSource::new(2).generate(32, 32);
        assert_ne!(a.as_slice(), b.as_slice());
    }

    #[test]
    fn test_samples_in_range() {
        let img = SyntheticSource::default().generate(64, 64);
        for (x, y, v) in img.pixels() {
            assert!((0.0..255.0).contains(&v), "pixel ({x},{y}) out of range: {v}");
        }
    }

    #[test]
    fn test_dimensions() {
        let img = SyntheticSource::default().generate(40, 30);
        assert_eq!(img.width(), 40);
        assert_eq!(img.height(), 30);
        assert_eq!(img.as_slice().len(), 1200);
    }
}
