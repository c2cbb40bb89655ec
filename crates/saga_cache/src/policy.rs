//! Policies deciding whether a cache hit is served.

use rand::{Rng, RngCore};

/// Decides whether an existing cached scene is reused.
pub trait ReusePolicy: Send + Sync + std::fmt::Debug {
    /// Whether to serve the cached scene this time.
    fn should_reuse(&self, rng: &mut dyn RngCore) -> bool;
}

/// Reuse with a fixed probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedProbability(pub f64);

impl Default for FixedProbability {
    fn default() -> Self {
        Self(0.3)
    }
}

impl ReusePolicy for FixedProbability {
    fn should_reuse(&self, rng: &mut dyn RngCore) -> bool {
        rng.gen_bool(self.0.clamp(0.0, 1.0))
    }
}

/// Always serve a cached scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct Always;

impl ReusePolicy for Always {
    fn should_reuse(&self, _rng: &mut dyn RngCore) -> bool {
        true
    }
}

/// Never serve a cached scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct Never;

impl ReusePolicy for Never {
    fn should_reuse(&self, _rng: &mut dyn RngCore) -> bool {
        false
    }
}
