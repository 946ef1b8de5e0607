//! Raw presence sensor feed.

use homebus_domain::payload::{MotionPayload, Payload};
use rand::Rng;
use rand::rngs::StdRng;

#[derive(Debug, Clone, Copy)]
pub struct MotionGenerator {
    probability: f64,
}

impl Default for MotionGenerator {
    fn default() -> Self {
        Self { probability: 0.5 }
    }
}

impl MotionGenerator {
    /// `probability` is clamped to `0.0..=1.0`; NaN counts as zero.
    #[must_use]
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }

    #[must_use]
    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn tick(&self, rng: &mut StdRng) -> Payload {
        Payload::Motion(MotionPayload {
            motion: Some(rng.gen_bool(self.probability)),
        })
    }
}
